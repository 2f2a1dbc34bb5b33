use stacker_core::{ObjectRef, StackError};
use stacker_scene::{SceneHost, Translation};
use tracing::debug;

use crate::{ensure_exist, host_failure, query_bounds};

/// Place `moved` to the right of `reference`, leaving `gap` units between
/// their bounding boxes.
///
/// The new absolute x of `moved` is `reference.maxX + gap + half_width(moved)`;
/// y and z are left untouched.
pub fn offset_in_x<H: SceneHost + ?Sized>(
    host: &mut H,
    reference: &ObjectRef,
    moved: &ObjectRef,
    gap: f64,
) -> Result<(), StackError> {
    if !gap.is_finite() {
        return Err(StackError::malformed(format!("gap must be finite, got {gap}")));
    }
    ensure_exist(&*host, [reference, moved])?;

    let reference_bounds = query_bounds(&*host, reference)?;
    let moved_bounds = query_bounds(&*host, moved)?;
    let x = reference_bounds.max.x + gap + moved_bounds.half_width();
    host.move_object(moved, Translation::absolute_x(x))
        .map_err(|err| host_failure(moved, err))?;
    debug!(reference = %reference, moved = %moved, x, "offset object in x");
    Ok(())
}
