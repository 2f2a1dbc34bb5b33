#![warn(missing_docs)]
//! Scene host capability surface.
//!
//! The alignment engine never talks to a 3D application directly. Everything
//! it needs (existence checks, bounding-box queries, moves) goes through
//! [`SceneHost`], which lets the same code drive a live host binding or the
//! in-memory [`MemoryScene`] used by the console and tests.

mod document;
mod memory;

pub use document::{GroupDocument, MeshDocument, SceneDocument, SceneLoadError};
pub use memory::MemoryScene;

use glam::DVec3;
use stacker_core::ObjectRef;
use stacker_geometry::Aabb;
use thiserror::Error;

/// Faults raised by a host while executing an otherwise well-formed request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    /// The object is not (or no longer) part of the scene.
    #[error("no object named '{0}'")]
    NotFound(ObjectRef),
    /// The host refused or failed the operation.
    #[error("{object}: {reason}")]
    Rejected {
        /// Object the request targeted.
        object: ObjectRef,
        /// Host-provided description.
        reason: String,
    },
    /// A requested node name is not acceptable to the host.
    #[error("invalid node name '{name}': {reason}")]
    InvalidName {
        /// Name as requested.
        name: String,
        /// Why it was refused.
        reason: String,
    },
}

impl HostError {
    /// Build a [`HostError::Rejected`].
    pub fn rejected(object: &ObjectRef, reason: impl Into<String>) -> Self {
        Self::Rejected {
            object: object.clone(),
            reason: reason.into(),
        }
    }
}

/// Absolute pivot placement; `None` leaves that axis untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Placement {
    /// Target x coordinate.
    pub x: Option<f64>,
    /// Target y coordinate.
    pub y: Option<f64>,
    /// Target z coordinate.
    pub z: Option<f64>,
}

/// How a move request positions an object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Translation {
    /// Delta added to the current position.
    Relative(DVec3),
    /// Absolute pivot placement on selected axes.
    Absolute(Placement),
}

impl Translation {
    /// Relative move by `delta`.
    pub fn relative(delta: DVec3) -> Self {
        Self::Relative(delta)
    }

    /// Absolute placement along x only.
    pub fn absolute_x(x: f64) -> Self {
        Self::Absolute(Placement {
            x: Some(x),
            ..Placement::default()
        })
    }
}

/// Capability interface a host scene graph exposes to the engine.
///
/// All calls are synchronous and run on the caller's thread.
pub trait SceneHost {
    /// Whether `object` currently exists.
    fn exists(&self, object: &ObjectRef) -> bool;

    /// Fresh world-space bounds of `object`.
    fn bounding_box(&self, object: &ObjectRef) -> Result<Aabb, HostError>;

    /// Reposition `object`.
    fn move_object(&mut self, object: &ObjectRef, translation: Translation)
        -> Result<(), HostError>;

    /// Copy `object`, returning the new node's name.
    fn duplicate(&mut self, object: &ObjectRef) -> Result<ObjectRef, HostError>;

    /// Parent `members` under a new group. `None` lets the host pick a name.
    fn group(&mut self, members: &[ObjectRef], name: Option<&str>)
        -> Result<ObjectRef, HostError>;

    /// Ordered current selection.
    fn current_selection(&self) -> Vec<ObjectRef>;

    /// Replace the current selection.
    fn select(&mut self, objects: &[ObjectRef]) -> Result<(), HostError>;
}

impl<H: SceneHost + ?Sized> SceneHost for &mut H {
    fn exists(&self, object: &ObjectRef) -> bool {
        (**self).exists(object)
    }

    fn bounding_box(&self, object: &ObjectRef) -> Result<Aabb, HostError> {
        (**self).bounding_box(object)
    }

    fn move_object(
        &mut self,
        object: &ObjectRef,
        translation: Translation,
    ) -> Result<(), HostError> {
        (**self).move_object(object, translation)
    }

    fn duplicate(&mut self, object: &ObjectRef) -> Result<ObjectRef, HostError> {
        (**self).duplicate(object)
    }

    fn group(
        &mut self,
        members: &[ObjectRef],
        name: Option<&str>,
    ) -> Result<ObjectRef, HostError> {
        (**self).group(members, name)
    }

    fn current_selection(&self) -> Vec<ObjectRef> {
        (**self).current_selection()
    }

    fn select(&mut self, objects: &[ObjectRef]) -> Result<(), HostError> {
        (**self).select(objects)
    }
}
