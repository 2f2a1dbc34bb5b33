use std::fs;
use std::path::Path;

use glam::DVec3;
use roxmltree::{Document, Node};
use stacker_core::ObjectRef;
use tracing::debug;

use crate::{Channel, OffsetFileError, OffsetTable, StackOffsets};

/// Load an offset table from the provided XML file path.
pub fn read_offsets_file(path: &Path) -> Result<OffsetTable, OffsetFileError> {
    let data = fs::read_to_string(path)?;
    parse_offsets(&data)
}

/// Load an offset table from an in-memory XML string.
pub fn parse_offsets(input: &str) -> Result<OffsetTable, OffsetFileError> {
    let doc = Document::parse(input)?;
    let root = doc.root_element();

    let mut table = OffsetTable {
        root: root.tag_name().name().to_string(),
        stacks: Vec::new(),
    };
    for stack_node in elements(root) {
        let stack = parse_stack(stack_node)?;
        if table.stack(&stack.name).is_some() {
            return Err(OffsetFileError::malformed(format!(
                "stack '{}' is listed twice",
                stack.name
            )));
        }
        table.stacks.push(stack);
    }
    debug!(
        stacks = table.stacks.len(),
        objects = table.len(),
        "parsed offset table"
    );
    Ok(table)
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

fn parse_stack(node: Node<'_, '_>) -> Result<StackOffsets, OffsetFileError> {
    let mut stack = StackOffsets::new(node.tag_name().name());
    for object_node in elements(node) {
        let tag = object_node.tag_name().name();
        let object = ObjectRef::parse(tag).map_err(|err| {
            OffsetFileError::malformed(format!("stack '{}': {err}", stack.name))
        })?;
        if stack.objects.iter().any(|entry| entry.object == object) {
            return Err(OffsetFileError::malformed(format!(
                "stack '{}': object '{object}' is listed twice",
                stack.name
            )));
        }
        let offset = parse_channels(object_node, &stack.name, &object)?;
        stack.push(object, offset);
    }
    Ok(stack)
}

fn parse_channels(
    node: Node<'_, '_>,
    stack: &str,
    object: &ObjectRef,
) -> Result<DVec3, OffsetFileError> {
    let mut values: [Option<f64>; 3] = [None; 3];
    for channel_node in elements(node) {
        let tag = channel_node.tag_name().name();
        let channel = Channel::from_tag(tag).ok_or_else(|| {
            OffsetFileError::malformed(format!(
                "{stack}/{object}: unknown channel '{tag}' (expected tx, ty or tz)"
            ))
        })?;
        let raw = channel_node.attribute("value").ok_or_else(|| {
            OffsetFileError::malformed(format!("{stack}/{object}/{tag}: missing 'value' attribute"))
        })?;
        let value = raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| {
                OffsetFileError::malformed(format!("{stack}/{object}/{tag}: invalid value '{raw}'"))
            })?;
        let slot = &mut values[channel.index()];
        if slot.is_some() {
            return Err(OffsetFileError::malformed(format!(
                "{stack}/{object}: channel '{tag}' is listed twice"
            )));
        }
        *slot = Some(value);
    }
    if values.iter().all(Option::is_none) {
        return Err(OffsetFileError::malformed(format!(
            "{stack}/{object}: no tx/ty/tz channels"
        )));
    }
    Ok(DVec3::new(
        values[0].unwrap_or(0.0),
        values[1].unwrap_or(0.0),
        values[2].unwrap_or(0.0),
    ))
}
