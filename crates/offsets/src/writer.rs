use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::{Channel, OffsetFileError, OffsetTable};

/// Render an offset table as indented XML.
///
/// Every object gets all three channels so replaying the file is explicit.
pub fn write_offsets(table: &OffsetTable) -> Result<String, OffsetFileError> {
    validate_tag(&table.root)?;
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new(table.root.as_str())))?;
    for stack in &table.stacks {
        validate_tag(&stack.name)?;
        if stack.objects.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new(stack.name.as_str())))?;
            continue;
        }
        writer.write_event(Event::Start(BytesStart::new(stack.name.as_str())))?;
        for entry in &stack.objects {
            let object = entry.object.as_str();
            validate_tag(object)?;
            writer.write_event(Event::Start(BytesStart::new(object)))?;
            for channel in Channel::ALL {
                let value = format!("{:?}", entry.offset[channel.index()]);
                writer.write_event(Event::Empty(
                    BytesStart::new(channel.as_str()).with_attributes([("value", value.as_str())]),
                ))?;
            }
            writer.write_event(Event::End(BytesEnd::new(object)))?;
        }
        writer.write_event(Event::End(BytesEnd::new(stack.name.as_str())))?;
    }
    writer.write_event(Event::End(BytesEnd::new(table.root.as_str())))?;

    let mut xml = String::from_utf8(writer.into_inner())
        .map_err(|err| OffsetFileError::malformed(err.to_string()))?;
    xml.push('\n');
    Ok(xml)
}

/// Write an offset table to `path`, creating parent dirs if needed.
pub fn write_offsets_file(path: &Path, table: &OffsetTable) -> Result<(), OffsetFileError> {
    let xml = write_offsets(table)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, xml)?;
    Ok(())
}

/// Whether `tag` can be written as an element name: it must start with a
/// letter or `_` and stay within `[A-Za-z0-9_-]`.
pub fn is_element_name(tag: &str) -> bool {
    let mut chars = tag.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    valid_start && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
}

fn validate_tag(tag: &str) -> Result<(), OffsetFileError> {
    if !is_element_name(tag) {
        return Err(OffsetFileError::malformed(format!(
            "'{tag}' cannot be stored as an element name"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_offsets, StackOffsets};
    use glam::DVec3;
    use stacker_core::ObjectRef;

    fn sample() -> OffsetTable {
        let mut stack = StackOffsets::new("stack001");
        stack.push(ObjectRef::parse("pCube2").unwrap(), DVec3::new(0.0, 2.0, -0.5));
        stack.push(ObjectRef::parse("pCone2").unwrap(), DVec3::new(1e-7, 3.0, 0.0));
        OffsetTable {
            stacks: vec![stack, StackOffsets::new("stack002")],
            ..OffsetTable::default()
        }
    }

    #[test]
    fn writes_expected_layout() {
        let xml = write_offsets(&sample()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<stacks>"));
        assert!(xml.contains("    <pCube2>\n      <tx value=\"0.0\"/>"));
        assert!(xml.contains("<ty value=\"2.0\"/>"));
        assert!(xml.contains("<stack002/>"));
    }

    #[test]
    fn written_tables_parse_back() {
        let table = sample();
        let parsed = parse_offsets(&write_offsets(&table).unwrap()).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn element_name_rules() {
        assert!(is_element_name("stack001"));
        assert!(is_element_name("_tower-a"));
        assert!(!is_element_name("1tower"));
        assert!(!is_element_name("ns:pCube"));
        assert!(!is_element_name("grp|pCube"));
        assert!(!is_element_name(""));
    }

    #[test]
    fn refuses_names_that_are_not_element_names() {
        let mut table = sample();
        table.stacks[0].name = "1st stack".into();
        assert!(matches!(
            write_offsets(&table),
            Err(OffsetFileError::Malformed(_))
        ));

        let mut table = sample();
        table.stacks[0].objects[0].object = ObjectRef::parse("ns:pCube2").unwrap();
        assert!(write_offsets(&table).is_err());
    }
}
