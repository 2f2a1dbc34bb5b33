#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod object_ref;

use thiserror::Error;

pub use object_ref::{ObjectRef, ObjectRefError, MAX_OBJECT_NAME_LEN};

/// Default prefix for stack groups created by the builder.
pub const DEFAULT_GROUP_PREFIX: &str = "stack";

/// Errors surfaced by stacking operations to their immediate caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StackError {
    /// The object does not exist in the host scene at call time.
    #[error("object '{0}' does not exist")]
    InvalidReference(ObjectRef),
    /// An otherwise valid host operation faulted (e.g., deleted mid-sequence).
    #[error("host operation on '{object}' failed: {reason}")]
    HostOperationFailed {
        /// Object the failing operation targeted.
        object: ObjectRef,
        /// Host-provided description.
        reason: String,
    },
    /// Input data (offset files, scene documents) is missing expected structure.
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl StackError {
    /// Shorthand for [`StackError::MalformedInput`].
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }
}

impl From<ObjectRefError> for StackError {
    fn from(err: ObjectRefError) -> Self {
        Self::MalformedInput(err.to_string())
    }
}

/// Name of the `index`-th (1-based) stack group, e.g. `stack001`.
pub fn stack_group_name(prefix: &str, index: usize) -> String {
    format!("{prefix}{index:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_names_are_zero_padded() {
        assert_eq!(stack_group_name(DEFAULT_GROUP_PREFIX, 1), "stack001");
        assert_eq!(stack_group_name(DEFAULT_GROUP_PREFIX, 42), "stack042");
        assert_eq!(stack_group_name("tower", 1234), "tower1234");
    }

    #[test]
    fn errors_render_object_names() {
        let obj = ObjectRef::parse("pCube9").unwrap();
        assert_eq!(
            StackError::InvalidReference(obj.clone()).to_string(),
            "object 'pCube9' does not exist"
        );
        let err = StackError::HostOperationFailed {
            object: obj,
            reason: "deleted".into(),
        };
        assert_eq!(err.to_string(), "host operation on 'pCube9' failed: deleted");
    }

    #[test]
    fn invalid_names_become_malformed_input() {
        let err: StackError = ObjectRef::parse("").unwrap_err().into();
        assert!(matches!(err, StackError::MalformedInput(_)));
    }
}
