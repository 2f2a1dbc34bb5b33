//! Object references.
//!
//! An [`ObjectRef`] is the opaque name a host scene graph resolves to a live
//! node (e.g., `pCube1` or `stack001|pCube1`). The engine never interprets the
//! name; it only validates that it is something a host could have produced and
//! asks the host whether it exists before touching its geometry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Longest accepted node name.
pub const MAX_OBJECT_NAME_LEN: usize = 256;

/// Error returned when parsing an invalid [`ObjectRef`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ObjectRefError {
    message: String,
}

impl ObjectRefError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Opaque handle naming an object in a host scene.
///
/// Ordering is lexical by name so maps keyed by `ObjectRef` iterate
/// deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectRef {
    name: String,
}

impl ObjectRef {
    /// Parse an object reference.
    ///
    /// Leading/trailing whitespace is trimmed. The remaining name must be
    /// non-empty and only contain ASCII alphanumerics, `_`, `-`, `:`
    /// (namespaces) or `|` (DAG path separators).
    pub fn parse(input: &str) -> Result<Self, ObjectRefError> {
        let name = input.trim();
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
        })
    }

    /// Full name as understood by the host.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Last DAG path component (`stack001|pCube1` -> `pCube1`).
    pub fn short_name(&self) -> &str {
        self.name.rsplit('|').next().unwrap_or(&self.name)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for ObjectRef {
    type Err = ObjectRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ObjectRef {
    type Error = ObjectRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ObjectRef> for String {
    fn from(value: ObjectRef) -> Self {
        value.name
    }
}

impl AsRef<str> for ObjectRef {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

fn validate_name(name: &str) -> Result<(), ObjectRefError> {
    if name.is_empty() {
        return Err(ObjectRefError::new("ObjectRef cannot be empty"));
    }
    if name.len() > MAX_OBJECT_NAME_LEN {
        return Err(ObjectRefError::new(format!(
            "ObjectRef too long (max {MAX_OBJECT_NAME_LEN})"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '|'))
    {
        return Err(ObjectRefError::new(format!(
            "ObjectRef '{name}' has invalid characters (allowed: A-Za-z0-9_-:|)"
        )));
    }
    if name.ends_with('|') || name.contains("||") {
        return Err(ObjectRefError::new(format!(
            "ObjectRef '{name}' has an empty path component"
        )));
    }
    Ok(())
}
