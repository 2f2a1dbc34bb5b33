//! JSON scene documents.
//!
//! A document lists meshes by world bounds, then groups in creation order
//! (every group only references meshes or groups that appear before it), then
//! the selection.

use std::fs;
use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use stacker_core::ObjectRef;
use stacker_geometry::Aabb;
use thiserror::Error;

use crate::{HostError, MemoryScene, SceneHost};

/// Errors emitted while loading or saving a scene document.
#[derive(Debug, Error)]
pub enum SceneLoadError {
    /// Wrap IO errors when reading/writing documents.
    #[error("failed to access scene document: {0}")]
    Io(#[from] std::io::Error),
    /// Wrap serde parsing issues.
    #[error("failed to parse scene document: {0}")]
    Parse(#[from] serde_json::Error),
    /// The document is well-formed JSON but describes an impossible scene.
    #[error("invalid scene document: {0}")]
    Invalid(#[from] HostError),
}

/// Serialized mesh entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDocument {
    /// Node name.
    pub name: ObjectRef,
    /// Minimum corner (x, y, z).
    pub min: [f64; 3],
    /// Maximum corner (x, y, z).
    pub max: [f64; 3],
    /// Explicit pivot; defaults to the bounds center.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot: Option<[f64; 3]>,
}

/// Serialized group entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDocument {
    /// Node name.
    pub name: ObjectRef,
    /// Direct members in order.
    pub members: Vec<ObjectRef>,
    /// Explicit pivot; defaults to the members' bounds center.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot: Option<[f64; 3]>,
}

/// Whole-scene document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Meshes.
    #[serde(default)]
    pub objects: Vec<MeshDocument>,
    /// Groups, parents after children.
    #[serde(default)]
    pub groups: Vec<GroupDocument>,
    /// Ordered selection.
    #[serde(default)]
    pub selection: Vec<ObjectRef>,
}

impl SceneDocument {
    /// Parse a document from JSON.
    pub fn from_json_str(input: &str) -> Result<Self, SceneLoadError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Pretty JSON rendering.
    pub fn to_json_string(&self) -> Result<String, SceneLoadError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

impl MemoryScene {
    /// Build a scene from a document.
    pub fn from_document(doc: &SceneDocument) -> Result<Self, SceneLoadError> {
        let mut scene = MemoryScene::new();
        for mesh in &doc.objects {
            let min = DVec3::from(mesh.min);
            let max = DVec3::from(mesh.max);
            if !min.cmple(max).all() {
                return Err(HostError::rejected(&mesh.name, "min corner exceeds max corner").into());
            }
            scene.add_mesh(&mesh.name, Aabb::new(min, max))?;
            if let Some(pivot) = mesh.pivot {
                scene.set_pivot(&mesh.name, DVec3::from(pivot))?;
            }
        }
        for group in &doc.groups {
            let name = scene.group(&group.members, Some(group.name.as_str()))?;
            if let Some(pivot) = group.pivot {
                scene.set_pivot(&name, DVec3::from(pivot))?;
            }
        }
        scene.select(&doc.selection)?;
        Ok(scene)
    }

    /// Capture the scene as a document.
    ///
    /// Pivots are written only where they differ from the default.
    pub fn to_document(&self) -> SceneDocument {
        let mut doc = SceneDocument {
            selection: self.current_selection(),
            ..SceneDocument::default()
        };
        for name in self.names() {
            if let Some(bounds) = self.mesh_bounds(name) {
                let pivot = self.pivot(name).ok().filter(|p| *p != bounds.center());
                doc.objects.push(MeshDocument {
                    name: name.clone(),
                    min: bounds.min.to_array(),
                    max: bounds.max.to_array(),
                    pivot: pivot.map(|p| p.to_array()),
                });
            }
        }
        let roots: Vec<ObjectRef> = self
            .names()
            .filter(|name| self.is_group(name) && matches!(self.parent(name), Ok(None)))
            .cloned()
            .collect();
        for root in &roots {
            self.push_groups_post_order(root, &mut doc.groups);
        }
        doc
    }

    fn push_groups_post_order(&self, group: &ObjectRef, out: &mut Vec<GroupDocument>) {
        let members = self.children(group).map(<[_]>::to_vec).unwrap_or_default();
        for member in &members {
            if self.is_group(member) {
                self.push_groups_post_order(member, out);
            }
        }
        let pivot = self.pivot(group).ok();
        let default_pivot = self.bounding_box(group).ok().map(|b| b.center());
        out.push(GroupDocument {
            name: group.clone(),
            members,
            pivot: pivot.filter(|p| Some(*p) != default_pivot).map(|p| p.to_array()),
        });
    }

    /// Load a scene from a JSON document on disk.
    pub fn load(path: &Path) -> Result<Self, SceneLoadError> {
        let data = fs::read_to_string(path)?;
        Self::from_document(&SceneDocument::from_json_str(&data)?)
    }

    /// Save the scene as a JSON document, creating parent dirs if needed.
    pub fn save(&self, path: &Path) -> Result<(), SceneLoadError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_document().to_json_string()?)?;
        Ok(())
    }
}
