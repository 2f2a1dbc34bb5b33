use std::fmt;

use rand::{rngs::StdRng, Rng};
use stacker_align::{ensure_exist, offset_in_x, stack_with, FailurePolicy};
use stacker_core::{stack_group_name, ObjectRef, StackError};
use stacker_offsets::{OffsetTable, StackOffsets};
use stacker_scene::{HostError, SceneHost};
use thiserror::Error;
use tracing::{debug, info};

/// Vertical slot a pool feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Base,
    Middle,
    Top,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Base, Tier::Middle, Tier::Top];

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "base" | "bottom" => Some(Self::Base),
            "middle" | "mid" => Some(Self::Middle),
            "top" => Some(Self::Top),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Middle => "middle",
            Self::Top => "top",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate pieces for each tier of a stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackPools {
    base: Vec<ObjectRef>,
    middle: Vec<ObjectRef>,
    top: Vec<ObjectRef>,
}

impl StackPools {
    pub fn get(&self, tier: Tier) -> &[ObjectRef] {
        match tier {
            Tier::Base => &self.base,
            Tier::Middle => &self.middle,
            Tier::Top => &self.top,
        }
    }

    /// Replace the pool for `tier`.
    pub fn set(&mut self, tier: Tier, objects: Vec<ObjectRef>) {
        let slot = match tier {
            Tier::Base => &mut self.base,
            Tier::Middle => &mut self.middle,
            Tier::Top => &mut self.top,
        };
        *slot = objects;
    }

    fn all(&self) -> impl Iterator<Item = &ObjectRef> {
        self.base.iter().chain(&self.middle).chain(&self.top)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("the {0} pool is empty")]
    EmptyPool(Tier),
    #[error("stack count must be at least 1")]
    ZeroCount,
    #[error(transparent)]
    Stack(#[from] StackError),
}

/// Layout knobs for [`make_stacks`].
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSettings {
    pub gap: f64,
    pub group_prefix: String,
    pub failure_policy: FailurePolicy,
}

/// One assembled stack.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltStack {
    pub group: ObjectRef,
    /// `(source, copy)` for base, middle and top, in that order.
    pub pieces: Vec<(ObjectRef, ObjectRef)>,
}

/// Build `count` stacks from randomly picked pool pieces.
///
/// Each stack duplicates one piece per tier, stacks the copies, groups them as
/// `<prefix>NNN` (continuing after existing groups) and places the group `gap`
/// units to the right of the previous stack group.
pub fn make_stacks<H: SceneHost + ?Sized>(
    host: &mut H,
    pools: &StackPools,
    count: usize,
    settings: &BuildSettings,
    rng: &mut StdRng,
) -> Result<Vec<BuiltStack>, BuildError> {
    for tier in Tier::ALL {
        if pools.get(tier).is_empty() {
            return Err(BuildError::EmptyPool(tier));
        }
    }
    if count == 0 {
        return Err(BuildError::ZeroCount);
    }
    ensure_exist(&*host, pools.all())?;

    let mut index = next_free_index(&*host, &settings.group_prefix, 1)?;
    let mut previous = index
        .checked_sub(1)
        .filter(|prev| *prev > 0)
        .map(|prev| group_ref(&settings.group_prefix, prev))
        .transpose()?
        .filter(|group| host.exists(group));

    let mut built = Vec::with_capacity(count);
    for _ in 0..count {
        let mut pieces = Vec::with_capacity(Tier::ALL.len());
        for tier in Tier::ALL {
            let pool = pools.get(tier);
            let source = &pool[rng.gen_range(0..pool.len())];
            let copy = host
                .duplicate(source)
                .map_err(|err| host_failure(source, err))?;
            debug!(%tier, source = %source, copy = %copy, "picked piece");
            pieces.push((source.clone(), copy));
        }

        let copies: Vec<ObjectRef> = pieces.iter().map(|(_, copy)| copy.clone()).collect();
        stack_with(host, &copies, settings.failure_policy)?;

        let name = stack_group_name(&settings.group_prefix, index);
        let group = host
            .group(&copies, Some(&name))
            .map_err(|err| host_failure(&copies[0], err))?;

        if let Some(prev) = &previous {
            offset_in_x(host, prev, &group, settings.gap)?;
        }
        debug!(group = %group, "built stack");

        previous = Some(group.clone());
        built.push(BuiltStack { group, pieces });
        index = next_free_index(&*host, &settings.group_prefix, index + 1)?;
    }
    info!(stacks = built.len(), "built stacks");
    Ok(built)
}

/// Record how far each copy sits from its source, one `<stack>` per group.
pub fn capture_offsets<H: SceneHost + ?Sized>(
    host: &H,
    built: &[BuiltStack],
) -> Result<OffsetTable, StackError> {
    let mut table = OffsetTable::new();
    for stack in built {
        let mut offsets = StackOffsets::new(stack.group.short_name());
        for (source, copy) in &stack.pieces {
            let from = host
                .bounding_box(source)
                .map_err(|err| host_failure(source, err))?;
            let to = host
                .bounding_box(copy)
                .map_err(|err| host_failure(copy, err))?;
            offsets.push(copy.clone(), to.center() - from.center());
        }
        table.stacks.push(offsets);
    }
    Ok(table)
}

fn next_free_index<H: SceneHost + ?Sized>(
    host: &H,
    prefix: &str,
    from: usize,
) -> Result<usize, StackError> {
    let mut index = from;
    while host.exists(&group_ref(prefix, index)?) {
        index += 1;
    }
    Ok(index)
}

fn group_ref(prefix: &str, index: usize) -> Result<ObjectRef, StackError> {
    Ok(ObjectRef::parse(&stack_group_name(prefix, index))?)
}

fn host_failure(object: &ObjectRef, err: HostError) -> StackError {
    StackError::HostOperationFailed {
        object: object.clone(),
        reason: err.to_string(),
    }
}
