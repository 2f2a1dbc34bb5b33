//! stacker - stack scene objects by their bounding boxes
//!
//! Console front end driving the alignment engine against a JSON scene.

mod builder;
mod command_script;
mod commands;
mod config;

use anyhow::{Context, Result};
use command_script::CommandScript;
use commands::Session;
use config::StackerConfig;
use stacker_scene::MemoryScene;
use std::io::{self, BufRead, Write};
use std::{env, path::PathBuf};
use tracing::info;

fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    info!("Starting stacker v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOptions::parse(env::args().skip(1));
    if cli.help {
        print_usage();
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => StackerConfig::load_from_path(path),
        None => StackerConfig::load(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let scene = match &cli.scene {
        Some(path) => MemoryScene::load(path)
            .with_context(|| format!("failed to load scene {}", path.display()))?,
        None => MemoryScene::new(),
    };
    info!(objects = scene.len(), "scene ready");

    let mut session = Session::new(scene, config);
    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    let mut failures = 0usize;

    match &cli.script {
        Some(path) => {
            let script = CommandScript::from_path(path)?;
            for command in script.commands() {
                writeln!(stdout, "> {command}")?;
                failures += run_line(&mut session, command, &mut stdout)?;
            }
        }
        None => {
            for line in io::stdin().lock().lines() {
                let line = line.context("failed to read command from stdin")?;
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if matches!(line, "quit" | "exit" | "/quit" | "/exit") {
                    break;
                }
                failures += run_line(&mut session, line, &mut stdout)?;
            }
        }
    }

    if failures > 0 {
        tracing::warn!(failures, "some commands failed");
    }

    if let Some(out) = &cli.out {
        session
            .host()
            .save(out)
            .with_context(|| format!("failed to save scene {}", out.display()))?;
        info!("Saved scene to {}", out.display());
    }
    Ok(())
}

/// Run one command and print its output; returns 1 when it reported an error.
fn run_line(
    session: &mut Session<MemoryScene>,
    line: &str,
    out: &mut impl Write,
) -> Result<usize> {
    let output = session.run_line(line);
    let mut failed = 0;
    for text in &output.lines {
        if text.starts_with("Error:") {
            failed = 1;
        }
        writeln!(out, "{text}")?;
    }
    Ok(failed)
}

fn print_usage() {
    println!(
        "Usage: stacker [--scene scene.json] [--config stacker.toml] [--script script.json] \
         [--out scene.json] [--seed N]"
    );
    println!("Without --script, commands are read from stdin. Type /help for the command list.");
}

#[derive(Clone, Default)]
struct CliOptions {
    help: bool,
    scene: Option<PathBuf>,
    config: Option<PathBuf>,
    script: Option<PathBuf>,
    out: Option<PathBuf>,
    seed: Option<u64>,
}

impl CliOptions {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Self {
        let mut opts = CliOptions::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => opts.help = true,
                "--scene" => {
                    if let Some(path) = args.next() {
                        opts.scene = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--scene requires a file path");
                    }
                }
                "--config" => {
                    if let Some(path) = args.next() {
                        opts.config = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--config requires a file path");
                    }
                }
                "--script" => {
                    if let Some(path) = args.next() {
                        opts.script = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--script requires a file path");
                    }
                }
                "--out" => {
                    if let Some(path) = args.next() {
                        opts.out = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--out requires a file path");
                    }
                }
                "--seed" => {
                    if let Some(value) = args.next() {
                        match value.parse::<u64>() {
                            Ok(seed) => opts.seed = Some(seed),
                            Err(_) => tracing::error!("Invalid --seed value: {value}"),
                        }
                    } else {
                        tracing::error!("--seed requires a value");
                    }
                }
                other => tracing::warn!("Ignoring unknown argument: {other}"),
            }
        }

        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliOptions {
        CliOptions::parse(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn parses_paths_and_seed() {
        let cli = parse(&[
            "--scene", "in.json", "--script", "run.json", "--out", "out.json", "--seed", "12",
        ]);
        assert_eq!(cli.scene, Some(PathBuf::from("in.json")));
        assert_eq!(cli.script, Some(PathBuf::from("run.json")));
        assert_eq!(cli.out, Some(PathBuf::from("out.json")));
        assert_eq!(cli.seed, Some(12));
        assert!(cli.config.is_none());
        assert!(!cli.help);
    }

    #[test]
    fn missing_values_and_unknown_flags_are_ignored() {
        let cli = parse(&["--frob", "--seed", "many", "--config"]);
        assert!(cli.seed.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn script_session_reports_failures() {
        let mut session = Session::new(MemoryScene::new(), StackerConfig::default());
        let mut out = Vec::new();
        assert_eq!(run_line(&mut session, "/help", &mut out).unwrap(), 0);
        assert_eq!(run_line(&mut session, "/bbox ghost", &mut out).unwrap(), 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Error: object 'ghost' does not exist"));
    }
}
