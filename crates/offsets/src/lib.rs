#![warn(missing_docs)]
//! Stored per-object offset files.
//!
//! Offsets are saved as a two-level tagged tree: an outer element groups
//! arbitrary-named stack entries, each stack holds one element per object, and
//! each object holds `tx` / `ty` / `tz` channel elements with a `value`
//! attribute:
//!
//! ```xml
//! <stacks>
//!   <stack001>
//!     <pCube2>
//!       <tx value="0.0"/>
//!       <ty value="2.0"/>
//!       <tz value="0.0"/>
//!     </pCube2>
//!   </stack001>
//! </stacks>
//! ```
//!
//! This crate only decodes/encodes the format; applying offsets to a scene is
//! the alignment engine's job.

mod reader;
mod writer;

pub use reader::{parse_offsets, read_offsets_file};
pub use writer::{is_element_name, write_offsets, write_offsets_file};

use glam::DVec3;
use stacker_core::{ObjectRef, StackError};
use thiserror::Error;

/// Root element name used when a table did not come from a file.
pub const DEFAULT_ROOT_TAG: &str = "stacks";

/// Errors emitted while reading or writing offset files.
#[derive(Debug, Error)]
pub enum OffsetFileError {
    /// Wrap IO errors when reading/writing files.
    #[error("failed to access offset file: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not well-formed XML.
    #[error("failed to parse offset file: {0}")]
    Xml(#[from] roxmltree::Error),
    /// Well-formed XML missing the expected structure.
    #[error("malformed offset file: {0}")]
    Malformed(String),
    /// Wrap XML writer failures.
    #[error("failed to write offset file: {0}")]
    Write(#[from] quick_xml::Error),
}

impl OffsetFileError {
    fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Whether the failure is about file contents rather than file access.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Xml(_) | Self::Malformed(_))
    }
}

/// Content errors become [`StackError::MalformedInput`]; access and writer
/// failures are handed back unchanged.
impl TryFrom<OffsetFileError> for StackError {
    type Error = OffsetFileError;

    fn try_from(err: OffsetFileError) -> Result<Self, Self::Error> {
        if !err.is_malformed() {
            return Err(err);
        }
        Ok(match err {
            OffsetFileError::Xml(err) => {
                StackError::malformed(format!("offset file is not well-formed XML: {err}"))
            }
            OffsetFileError::Malformed(message) => StackError::MalformedInput(message),
            other => StackError::malformed(other.to_string()),
        })
    }
}

/// Translation channel stored per object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Translate X.
    Tx,
    /// Translate Y.
    Ty,
    /// Translate Z.
    Tz,
}

impl Channel {
    /// All channels in file order.
    pub const ALL: [Channel; 3] = [Channel::Tx, Channel::Ty, Channel::Tz];

    /// Element name for the channel.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tx => "tx",
            Self::Ty => "ty",
            Self::Tz => "tz",
        }
    }

    /// Resolve an element name.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "tx" => Some(Self::Tx),
            "ty" => Some(Self::Ty),
            "tz" => Some(Self::Tz),
            _ => None,
        }
    }

    /// Component index into a 3-vector.
    pub const fn index(self) -> usize {
        match self {
            Self::Tx => 0,
            Self::Ty => 1,
            Self::Tz => 2,
        }
    }
}

/// Offset recorded for one object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectOffset {
    /// Object the offset applies to.
    pub object: ObjectRef,
    /// Relative translation.
    pub offset: DVec3,
}

/// Offsets recorded for one stack, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct StackOffsets {
    /// Stack entry name (usually the stack group's name).
    pub name: String,
    /// Per-object offsets.
    pub objects: Vec<ObjectOffset>,
}

impl StackOffsets {
    /// Empty stack entry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
        }
    }

    /// Append an object offset.
    pub fn push(&mut self, object: ObjectRef, offset: DVec3) {
        self.objects.push(ObjectOffset { object, offset });
    }
}

/// Decoded stack-name -> object-name -> offset mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetTable {
    /// Outer element name.
    pub root: String,
    /// Stack entries in document order.
    pub stacks: Vec<StackOffsets>,
}

impl Default for OffsetTable {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT_TAG.to_string(),
            stacks: Vec::new(),
        }
    }
}

impl OffsetTable {
    /// Empty table with the default root element.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a stack entry by name.
    pub fn stack(&self, name: &str) -> Option<&StackOffsets> {
        self.stacks.iter().find(|stack| stack.name == name)
    }

    /// Every object offset with its stack name, in document order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ObjectOffset)> {
        self.stacks.iter().flat_map(|stack| {
            stack
                .objects
                .iter()
                .map(move |entry| (stack.name.as_str(), entry))
        })
    }

    /// Total number of object offsets.
    pub fn len(&self) -> usize {
        self.stacks.iter().map(|stack| stack.objects.len()).sum()
    }

    /// Whether the table holds no object offsets.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_map_to_vector_components() {
        for channel in Channel::ALL {
            assert_eq!(Channel::from_tag(channel.as_str()), Some(channel));
        }
        assert_eq!(Channel::Ty.index(), 1);
        assert_eq!(Channel::from_tag("rx"), None);
    }

    #[test]
    fn entries_flatten_in_order() {
        let mut first = StackOffsets::new("stack001");
        first.push(ObjectRef::parse("a").unwrap(), DVec3::X);
        first.push(ObjectRef::parse("b").unwrap(), DVec3::Y);
        let mut second = StackOffsets::new("stack002");
        second.push(ObjectRef::parse("c").unwrap(), DVec3::Z);
        let table = OffsetTable {
            stacks: vec![first, second],
            ..OffsetTable::default()
        };

        let names: Vec<_> = table
            .entries()
            .map(|(stack, entry)| format!("{stack}/{}", entry.object))
            .collect();
        assert_eq!(names, ["stack001/a", "stack001/b", "stack002/c"]);
        assert_eq!(table.len(), 3);
        assert!(table.stack("stack002").is_some());
        assert!(table.stack("stack003").is_none());
    }
}
