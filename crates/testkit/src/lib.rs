#![warn(missing_docs)]
//! Test surfaces for stacking code: scene fixtures, a recording host wrapper
//! with fault injection, and golden JSON snapshots.

mod recording;
mod snapshot;

use anyhow::Result;
use glam::DVec3;
use stacker_core::ObjectRef;
use stacker_geometry::Aabb;
use stacker_scene::MemoryScene;
use std::path::Path;

pub use recording::*;
pub use snapshot::*;

/// Parse an object name, panicking on invalid input (test helper).
pub fn obj(name: &str) -> ObjectRef {
    ObjectRef::parse(name).unwrap_or_else(|err| panic!("invalid test object name {name:?}: {err}"))
}

/// Scene with one mesh per `(name, bounds)` entry, bounds in host order
/// `(minX, minY, minZ, maxX, maxY, maxZ)`.
pub fn scene_with_boxes(boxes: &[(&str, [f64; 6])]) -> MemoryScene {
    let mut scene = MemoryScene::new();
    for (name, bounds) in boxes {
        scene
            .add_mesh(&obj(name), Aabb::from_bounds(*bounds))
            .unwrap_or_else(|err| panic!("fixture mesh {name}: {err}"));
    }
    scene
}

/// `count` unit cubes `cube1..cubeN` resting on y=0, spread along x and z so
/// none of them start aligned.
pub fn unit_cube_row(count: usize) -> (MemoryScene, Vec<ObjectRef>) {
    let mut scene = MemoryScene::new();
    let mut names = Vec::with_capacity(count);
    for i in 0..count {
        let name = obj(&format!("cube{}", i + 1));
        let base = DVec3::new(i as f64 * 2.5, 0.0, (i % 3) as f64 - 1.0);
        scene
            .add_mesh(&name, Aabb::from_base(base, DVec3::ONE))
            .unwrap_or_else(|err| panic!("fixture cube {name}: {err}"));
        names.push(name);
    }
    (scene, names)
}

/// Snapshot the scene's JSON document at `path`.
pub fn assert_scene_snapshot<P: AsRef<Path>>(path: P, scene: &MemoryScene) -> Result<()> {
    assert_json_snapshot(path, &scene.to_document())
}
