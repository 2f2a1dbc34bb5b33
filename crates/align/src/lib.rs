#![warn(missing_docs)]
//! Alignment engine: stacks objects on top of each other by their bounding
//! boxes, lays stacks out side by side and replays stored offsets.
//!
//! Every operation checks that all referenced objects exist before it queries
//! any geometry, and only ever repositions objects through [`SceneHost`].

mod lateral;
mod replay;
mod stack;

pub use lateral::offset_in_x;
pub use replay::replay_offsets;
pub use stack::{stack, stack_with, FailurePolicy};

use glam::DVec3;
use stacker_core::{ObjectRef, StackError};
use stacker_geometry::{Aabb, Anchor};
use stacker_scene::{HostError, SceneHost};

/// Fail with [`StackError::InvalidReference`] on the first missing object.
pub fn ensure_exist<'a, H, I>(host: &H, objects: I) -> Result<(), StackError>
where
    H: SceneHost + ?Sized,
    I: IntoIterator<Item = &'a ObjectRef>,
{
    for object in objects {
        if !host.exists(object) {
            return Err(StackError::InvalidReference(object.clone()));
        }
    }
    Ok(())
}

/// Top or bottom center of `object`'s current bounding box.
pub fn center_point<H: SceneHost + ?Sized>(
    host: &H,
    object: &ObjectRef,
    anchor: Anchor,
) -> Result<DVec3, StackError> {
    Ok(query_bounds(host, object)?.anchor(anchor))
}

pub(crate) fn query_bounds<H: SceneHost + ?Sized>(
    host: &H,
    object: &ObjectRef,
) -> Result<Aabb, StackError> {
    host.bounding_box(object)
        .map_err(|err| host_failure(object, err))
}

/// Map a host fault during an operation on `object`.
pub(crate) fn host_failure(object: &ObjectRef, err: HostError) -> StackError {
    StackError::HostOperationFailed {
        object: object.clone(),
        reason: err.to_string(),
    }
}
