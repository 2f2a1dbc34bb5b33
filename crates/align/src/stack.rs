use glam::DVec3;
use serde::{Deserialize, Serialize};
use stacker_core::{ObjectRef, StackError};
use stacker_geometry::stacking_offset;
use stacker_scene::{SceneHost, Translation};
use tracing::{debug, warn};

use crate::{ensure_exist, host_failure, query_bounds};

/// What happens to already applied moves when a later pair fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Fail fast and keep earlier moves.
    #[default]
    Leave,
    /// Undo earlier moves (in reverse order) before reporting the failure.
    Rollback,
}

/// Stack `objects` bottom to top, each resting on the previous one.
///
/// For every adjacent pair `(current, next)`, `next` is moved relatively by
/// `top_center(current) - bottom_center(next)`. Pairs are processed strictly in
/// order because each move depends on the previous one. A host failure aborts
/// the remaining pairs and leaves earlier moves applied.
pub fn stack<H: SceneHost + ?Sized>(host: &mut H, objects: &[ObjectRef]) -> Result<(), StackError> {
    stack_with(host, objects, FailurePolicy::Leave)
}

/// [`stack`] with an explicit [`FailurePolicy`].
pub fn stack_with<H: SceneHost + ?Sized>(
    host: &mut H,
    objects: &[ObjectRef],
    policy: FailurePolicy,
) -> Result<(), StackError> {
    ensure_exist(&*host, objects)?;

    let mut applied: Vec<(&ObjectRef, DVec3)> = Vec::with_capacity(objects.len().saturating_sub(1));
    for pair in objects.windows(2) {
        let (base, moving) = (&pair[0], &pair[1]);
        match stack_pair(host, base, moving) {
            Ok(delta) => applied.push((moving, delta)),
            Err(err) => {
                warn!(
                    base = %base,
                    moving = %moving,
                    applied = applied.len(),
                    ?policy,
                    "stacking aborted: {err}"
                );
                if policy == FailurePolicy::Rollback {
                    roll_back(host, &applied);
                }
                return Err(err);
            }
        }
    }
    Ok(())
}

fn stack_pair<H: SceneHost + ?Sized>(
    host: &mut H,
    base: &ObjectRef,
    moving: &ObjectRef,
) -> Result<DVec3, StackError> {
    let base_bounds = query_bounds(&*host, base)?;
    let moving_bounds = query_bounds(&*host, moving)?;
    let delta = stacking_offset(&base_bounds, &moving_bounds);
    host.move_object(moving, Translation::relative(delta))
        .map_err(|err| host_failure(moving, err))?;
    debug!(base = %base, moving = %moving, ?delta, "stacked object");
    Ok(delta)
}

fn roll_back<H: SceneHost + ?Sized>(host: &mut H, applied: &[(&ObjectRef, DVec3)]) {
    for (object, delta) in applied.iter().rev() {
        if let Err(err) = host.move_object(object, Translation::relative(-*delta)) {
            warn!(object = %object, "rollback move failed: {err}");
        }
    }
}
