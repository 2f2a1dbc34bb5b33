use stacker_core::StackError;
use stacker_offsets::OffsetTable;
use stacker_scene::{SceneHost, Translation};
use tracing::{debug, info};

use crate::{ensure_exist, host_failure};

/// Apply every stored offset as a relative move of the named object.
///
/// All objects are checked for existence before the first move. Returns the
/// number of moves applied. Like [`crate::stack`], a host failure aborts the
/// replay and leaves earlier moves in place.
pub fn replay_offsets<H: SceneHost + ?Sized>(
    host: &mut H,
    table: &OffsetTable,
) -> Result<usize, StackError> {
    ensure_exist(&*host, table.entries().map(|(_, entry)| &entry.object))?;

    let mut moves = 0;
    for (stack, entry) in table.entries() {
        host.move_object(&entry.object, Translation::relative(entry.offset))
            .map_err(|err| host_failure(&entry.object, err))?;
        debug!(stack, object = %entry.object, offset = ?entry.offset, "replayed offset");
        moves += 1;
    }
    info!(stacks = table.stacks.len(), moves, "replayed offset table");
    Ok(moves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use stacker_offsets::{parse_offsets, StackOffsets};
    use stacker_testkit::{obj, unit_cube_row, RecordingHost};

    #[test]
    fn applies_offsets_relative_to_current_position() {
        let (mut scene, names) = unit_cube_row(2);
        let table = parse_offsets(
            r#"<stacks>
                 <stack001>
                   <cube1><ty value="2.0"/></cube1>
                   <cube2><tx value="-1.5"/><tz value="4"/></cube2>
                 </stack001>
               </stacks>"#,
        )
        .unwrap();
        let before: Vec<_> = names
            .iter()
            .map(|name| scene.bounding_box(name).unwrap().center())
            .collect();

        assert_eq!(replay_offsets(&mut scene, &table).unwrap(), 2);

        let after: Vec<_> = names
            .iter()
            .map(|name| scene.bounding_box(name).unwrap().center())
            .collect();
        assert_eq!(after[0] - before[0], DVec3::new(0.0, 2.0, 0.0));
        assert_eq!(after[1] - before[1], DVec3::new(-1.5, 0.0, 4.0));
    }

    #[test]
    fn unknown_object_moves_nothing() {
        let (scene, _) = unit_cube_row(1);
        let mut stack = StackOffsets::new("stack001");
        stack.push(obj("cube1"), DVec3::Y);
        stack.push(obj("missing"), DVec3::Y);
        let table = OffsetTable {
            stacks: vec![stack],
            ..OffsetTable::default()
        };
        let mut host = RecordingHost::new(scene);
        let err = replay_offsets(&mut host, &table).unwrap_err();
        assert_eq!(err, StackError::InvalidReference(obj("missing")));
        assert!(host.moves().is_empty());
    }

    #[test]
    fn empty_table_is_a_no_op() {
        let (mut scene, _) = unit_cube_row(1);
        assert_eq!(replay_offsets(&mut scene, &OffsetTable::new()).unwrap(), 0);
    }
}
