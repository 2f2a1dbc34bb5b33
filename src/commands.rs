use std::path::{Path, PathBuf};

use rand::{rngs::StdRng, SeedableRng};
use stacker_align::{offset_in_x, replay_offsets, stack_with};
use stacker_core::{ObjectRef, StackError};
use stacker_offsets::{read_offsets_file, write_offsets_file};
use stacker_scene::SceneHost;
use thiserror::Error;
use tracing::debug;

use crate::builder::{capture_offsets, make_stacks, BuildSettings, BuiltStack, StackPools, Tier};
use crate::config::StackerConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StackCommand {
    Help,
    List,
    Bbox { object: ObjectRef },
    Select { objects: Vec<ObjectRef> },
    /// Empty `objects` means "use the current selection".
    Pool { tier: Tier, objects: Vec<ObjectRef> },
    Stack { objects: Vec<ObjectRef> },
    Offset {
        reference: ObjectRef,
        moved: ObjectRef,
        gap: Option<f64>,
    },
    Build { count: Option<usize> },
    Replay { path: PathBuf },
    SaveOffsets { path: PathBuf },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub lines: Vec<String>,
}

pub fn parse_command(input: &str) -> Result<StackCommand, CommandError> {
    let input = input.trim();
    let input = input.strip_prefix('/').unwrap_or(input).trim();
    if input.is_empty() {
        return Ok(StackCommand::Help);
    }

    let mut parts = input.split_whitespace();
    let cmd = parts
        .next()
        .ok_or_else(|| CommandError::new("Missing command"))?
        .to_ascii_lowercase();
    let args: Vec<&str> = parts.collect();

    match cmd.as_str() {
        "help" | "?" => Ok(StackCommand::Help),
        "list" | "ls" => {
            if !args.is_empty() {
                return Err(CommandError::new("Usage: /list"));
            }
            Ok(StackCommand::List)
        }
        "bbox" => {
            if args.len() != 1 {
                return Err(CommandError::new("Usage: /bbox <object>"));
            }
            Ok(StackCommand::Bbox {
                object: parse_object(args[0])?,
            })
        }
        "select" => Ok(StackCommand::Select {
            objects: parse_objects(&args)?,
        }),
        "pool" => {
            let Some((tier, rest)) = args.split_first() else {
                return Err(CommandError::new("Usage: /pool <base|middle|top> [object...]"));
            };
            let tier = Tier::parse(tier)
                .ok_or_else(|| CommandError::new(format!("Unknown pool: {tier}")))?;
            Ok(StackCommand::Pool {
                tier,
                objects: parse_objects(rest)?,
            })
        }
        "stack" => Ok(StackCommand::Stack {
            objects: parse_objects(&args)?,
        }),
        "offset" => {
            if !(2..=3).contains(&args.len()) {
                return Err(CommandError::new("Usage: /offset <reference> <moved> [gap]"));
            }
            let gap = match args.get(2) {
                Some(raw) => Some(parse_gap(raw)?),
                None => None,
            };
            Ok(StackCommand::Offset {
                reference: parse_object(args[0])?,
                moved: parse_object(args[1])?,
                gap,
            })
        }
        "build" => {
            if args.len() > 1 {
                return Err(CommandError::new("Usage: /build [count]"));
            }
            let count = match args.first() {
                Some(raw) => Some(
                    raw.parse::<usize>()
                        .ok()
                        .filter(|count| *count > 0)
                        .ok_or_else(|| CommandError::new("Invalid build count"))?,
                ),
                None => None,
            };
            Ok(StackCommand::Build { count })
        }
        "replay" => Ok(StackCommand::Replay {
            path: single_path(&args, "Usage: /replay <offsets.xml>")?,
        }),
        "save-offsets" | "save" => Ok(StackCommand::SaveOffsets {
            path: single_path(&args, "Usage: /save-offsets <offsets.xml>")?,
        }),
        _ => Err(CommandError::new(format!(
            "Unknown command: {cmd}. Try /help"
        ))),
    }
}

fn parse_object(raw: &str) -> Result<ObjectRef, CommandError> {
    ObjectRef::parse(raw).map_err(|err| CommandError::new(format!("Invalid object name: {err}")))
}

fn parse_objects(raw: &[&str]) -> Result<Vec<ObjectRef>, CommandError> {
    raw.iter().map(|name| parse_object(name)).collect()
}

fn parse_gap(raw: &str) -> Result<f64, CommandError> {
    raw.parse::<f64>()
        .ok()
        .filter(|gap| gap.is_finite())
        .ok_or_else(|| CommandError::new(format!("Invalid gap: {raw}")))
}

fn single_path(args: &[&str], usage: &str) -> Result<PathBuf, CommandError> {
    match args {
        [path] => Ok(PathBuf::from(path)),
        _ => Err(CommandError::new(usage)),
    }
}

pub fn help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  /help".to_string(),
        "  /list".to_string(),
        "  /bbox <object>".to_string(),
        "  /select <object...>".to_string(),
        "  /pool <base|middle|top> [object...]   (defaults to selection)".to_string(),
        "  /stack [object...]                    (defaults to selection)".to_string(),
        "  /offset <reference> <moved> [gap]".to_string(),
        "  /build [count]".to_string(),
        "  /replay <offsets.xml>".to_string(),
        "  /save-offsets <offsets.xml>".to_string(),
    ]
}

/// Console state: the scene, the stack pools and what `build` produced.
pub struct Session<H> {
    host: H,
    pools: StackPools,
    config: StackerConfig,
    rng: StdRng,
    built: Vec<BuiltStack>,
}

impl<H: SceneHost> Session<H> {
    pub fn new(host: H, config: StackerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            host,
            pools: StackPools::default(),
            config,
            rng,
            built: Vec::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn pools(&self) -> &StackPools {
        &self.pools
    }

    /// Parse and run one console line.
    pub fn run_line(&mut self, line: &str) -> CommandOutput {
        match parse_command(line) {
            Ok(cmd) => self.execute_command(cmd),
            Err(err) => CommandOutput {
                lines: vec![format!("Error: {err}")],
            },
        }
    }

    pub fn execute_command(&mut self, cmd: StackCommand) -> CommandOutput {
        debug!(?cmd, "executing command");
        let mut out = CommandOutput::default();
        if let Err(err) = self.dispatch(cmd, &mut out) {
            out.lines.push(format!("Error: {err:#}"));
        }
        out
    }

    fn dispatch(&mut self, cmd: StackCommand, out: &mut CommandOutput) -> anyhow::Result<()> {
        match cmd {
            StackCommand::Help => out.lines.extend(help_lines()),
            StackCommand::List => out.lines.extend(self.list_lines()),
            StackCommand::Bbox { object } => {
                if !self.host.exists(&object) {
                    return Err(StackError::InvalidReference(object).into());
                }
                let bounds = self.host.bounding_box(&object)?;
                out.lines.push(format!(
                    "{object}: min {:.3} {:.3} {:.3} max {:.3} {:.3} {:.3}",
                    bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
                ));
            }
            StackCommand::Select { objects } => {
                self.host.select(&objects)?;
                out.lines.push(format!("Selected {} object(s)", objects.len()));
            }
            StackCommand::Pool { tier, objects } => {
                let objects = self.or_selection(objects);
                stacker_align::ensure_exist(&self.host, &objects)?;
                out.lines
                    .push(format!("{tier} pool: {}", join_names(&objects)));
                self.pools.set(tier, objects);
            }
            StackCommand::Stack { objects } => {
                let objects = self.or_selection(objects);
                stack_with(&mut self.host, &objects, self.config.failure_policy)?;
                out.lines.push(format!("Stacked {} object(s)", objects.len()));
            }
            StackCommand::Offset {
                reference,
                moved,
                gap,
            } => {
                let gap = gap.unwrap_or(self.config.gap);
                offset_in_x(&mut self.host, &reference, &moved, gap)?;
                out.lines
                    .push(format!("Moved {moved} {gap} unit(s) right of {reference}"));
            }
            StackCommand::Build { count } => {
                let count = count.unwrap_or(self.config.stack_count);
                let settings = BuildSettings {
                    gap: self.config.gap,
                    group_prefix: self.config.group_prefix.clone(),
                    failure_policy: self.config.failure_policy,
                };
                let built =
                    make_stacks(&mut self.host, &self.pools, count, &settings, &mut self.rng)?;
                for stack in &built {
                    let sources: Vec<ObjectRef> =
                        stack.pieces.iter().map(|(source, _)| source.clone()).collect();
                    out.lines
                        .push(format!("Built {} from {}", stack.group, join_names(&sources)));
                }
                self.built.extend(built);
            }
            StackCommand::Replay { path } => {
                let table = read_offsets_file(&path).map_err(|err| {
                    match StackError::try_from(err) {
                        Ok(err) => anyhow::Error::new(err),
                        Err(err) => anyhow::Error::new(err),
                    }
                })?;
                let moves = replay_offsets(&mut self.host, &table)?;
                out.lines.push(format!(
                    "Replayed {moves} offset(s) from {}",
                    path.display()
                ));
            }
            StackCommand::SaveOffsets { path } => {
                self.save_offsets(&path, out)?;
            }
        }
        Ok(())
    }

    fn save_offsets(&self, path: &Path, out: &mut CommandOutput) -> anyhow::Result<()> {
        if self.built.is_empty() {
            anyhow::bail!("nothing built yet; run /build first");
        }
        let table = capture_offsets(&self.host, &self.built)?;
        write_offsets_file(path, &table)?;
        out.lines.push(format!(
            "Saved {} offset(s) to {}",
            table.len(),
            path.display()
        ));
        Ok(())
    }

    fn or_selection(&self, objects: Vec<ObjectRef>) -> Vec<ObjectRef> {
        if objects.is_empty() {
            self.host.current_selection()
        } else {
            objects
        }
    }

    fn list_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let selection = self.host.current_selection();
        lines.push(format!("Selection: {}", join_names(&selection)));
        for tier in Tier::ALL {
            lines.push(format!("{tier} pool: {}", join_names(self.pools().get(tier))));
        }
        for stack in &self.built {
            lines.push(format!("{}: {} piece(s)", stack.group, stack.pieces.len()));
        }
        lines
    }
}

fn join_names(objects: &[ObjectRef]) -> String {
    if objects.is_empty() {
        return "(none)".to_string();
    }
    objects
        .iter()
        .map(ObjectRef::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}
