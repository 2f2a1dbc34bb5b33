//! Host wrapper that records calls and injects faults.

use stacker_core::ObjectRef;
use stacker_geometry::Aabb;
use stacker_scene::{HostError, SceneHost, Translation};

/// Mutating call observed by a [`RecordingHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    /// `move_object`.
    Move {
        /// Target.
        object: ObjectRef,
        /// Requested translation.
        translation: Translation,
    },
    /// `duplicate`.
    Duplicate {
        /// Source object.
        object: ObjectRef,
    },
    /// `group`.
    Group {
        /// Members in order.
        members: Vec<ObjectRef>,
    },
}

/// Fault to inject into a wrapped host.
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    /// The `nth` (1-based) move call fails without touching the scene.
    FailMove {
        /// Which move call fails.
        nth: usize,
    },
    /// After `after_moves` successful moves, `object` disappears: it no longer
    /// exists and every query or move on it reports not found.
    Vanish {
        /// Successful moves before the object disappears.
        after_moves: usize,
        /// Object that disappears.
        object: ObjectRef,
    },
}

/// Wraps a [`SceneHost`], logging mutating calls and applying [`Fault`]s.
#[derive(Debug)]
pub struct RecordingHost<H> {
    inner: H,
    calls: Vec<HostCall>,
    faults: Vec<Fault>,
    move_attempts: usize,
    successful_moves: usize,
}

impl<H: SceneHost> RecordingHost<H> {
    /// Wrap `inner` with no faults.
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            calls: Vec::new(),
            faults: Vec::new(),
            move_attempts: 0,
            successful_moves: 0,
        }
    }

    /// Add a fault.
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    /// Every mutating call attempted, in order.
    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    /// Move calls attempted, in order.
    pub fn moves(&self) -> Vec<(&ObjectRef, Translation)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                HostCall::Move {
                    object,
                    translation,
                } => Some((object, *translation)),
                _ => None,
            })
            .collect()
    }

    /// Unwrap.
    pub fn into_inner(self) -> H {
        self.inner
    }

    fn vanished(&self, object: &ObjectRef) -> bool {
        self.faults.iter().any(|fault| match fault {
            Fault::Vanish {
                after_moves,
                object: gone,
            } => gone == object && self.successful_moves >= *after_moves,
            Fault::FailMove { .. } => false,
        })
    }
}

impl<H: SceneHost> SceneHost for RecordingHost<H> {
    fn exists(&self, object: &ObjectRef) -> bool {
        !self.vanished(object) && self.inner.exists(object)
    }

    fn bounding_box(&self, object: &ObjectRef) -> Result<Aabb, HostError> {
        if self.vanished(object) {
            return Err(HostError::NotFound(object.clone()));
        }
        self.inner.bounding_box(object)
    }

    fn move_object(
        &mut self,
        object: &ObjectRef,
        translation: Translation,
    ) -> Result<(), HostError> {
        self.calls.push(HostCall::Move {
            object: object.clone(),
            translation,
        });
        self.move_attempts += 1;
        let attempt = self.move_attempts;
        if self
            .faults
            .iter()
            .any(|fault| matches!(fault, Fault::FailMove { nth } if *nth == attempt))
        {
            return Err(HostError::rejected(object, "injected move failure"));
        }
        if self.vanished(object) {
            return Err(HostError::NotFound(object.clone()));
        }
        self.inner.move_object(object, translation)?;
        self.successful_moves += 1;
        Ok(())
    }

    fn duplicate(&mut self, object: &ObjectRef) -> Result<ObjectRef, HostError> {
        self.calls.push(HostCall::Duplicate {
            object: object.clone(),
        });
        if self.vanished(object) {
            return Err(HostError::NotFound(object.clone()));
        }
        self.inner.duplicate(object)
    }

    fn group(
        &mut self,
        members: &[ObjectRef],
        name: Option<&str>,
    ) -> Result<ObjectRef, HostError> {
        self.calls.push(HostCall::Group {
            members: members.to_vec(),
        });
        if let Some(gone) = members.iter().find(|member| self.vanished(member)) {
            return Err(HostError::NotFound(gone.clone()));
        }
        self.inner.group(members, name)
    }

    fn current_selection(&self) -> Vec<ObjectRef> {
        self.inner
            .current_selection()
            .into_iter()
            .filter(|object| !self.vanished(object))
            .collect()
    }

    fn select(&mut self, objects: &[ObjectRef]) -> Result<(), HostError> {
        if let Some(gone) = objects.iter().find(|object| self.vanished(object)) {
            return Err(HostError::NotFound(gone.clone()));
        }
        self.inner.select(objects)
    }
}
