use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use framec_dsl::{detect_format, CompiledFrame, IntegrationRegistry, PipelineError, SourceFormat};

mod logging;

use logging::{init_logging, LoggingConfig};

#[derive(Debug, Parser)]
#[command(name = "framec", version, about = "Compile frame DSL sources into flat frame rows")]
struct Cli {
    /// Log filter in `env_logger` syntax; falls back to `RUST_LOG`.
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report parse and validation diagnostics.
    Check {
        /// Source file, or `-` for stdin.
        file: PathBuf,
    },
    /// Compile a source file to JSON rows.
    Compile {
        file: PathBuf,
        /// Block integration registry (JSON).
        #[arg(long, env = "FRAMEC_BLOCKS")]
        blocks: PathBuf,
        /// Action integration registry (JSON).
        #[arg(long, env = "FRAMEC_ACTIONS")]
        actions: PathBuf,
        /// Use this frame id instead of generating one.
        #[arg(long)]
        frame_id: Option<String>,
        #[arg(long)]
        pretty: bool,
    },
    /// Rebuild the nested frame from compiled JSON rows.
    Decompile {
        file: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
    /// Print whether a file is DSL or XML.
    Detect { file: PathBuf },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(LoggingConfig { env_filter: cli.log.clone(), ..Default::default() });

    match cli.command {
        Command::Check { file } => check(&file),
        Command::Compile { file, blocks, actions, frame_id, pretty } => {
            compile(&file, &blocks, &actions, frame_id.as_deref(), pretty)
        }
        Command::Decompile { file, pretty } => decompile(&file, pretty),
        Command::Detect { file } => {
            println!("{}", detect_format(&read_input(&file)?));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_dsl(path: &Path) -> Result<String> {
    let src = read_input(path)?;
    if detect_format(&src) == SourceFormat::Xml {
        bail!("{} is XML; only the DSL syntax is supported", path.display());
    }
    Ok(src)
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    json.context("failed to serialize output")
}

fn check(file: &Path) -> Result<ExitCode> {
    let diagnostics = framec_dsl::check(&read_dsl(file)?);
    if diagnostics.is_empty() {
        eprintln!("{}: no problems found", file.display());
        return Ok(ExitCode::SUCCESS);
    }
    eprint!("{}", diagnostics.render_all());
    Ok(if diagnostics.has_errors() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn compile(file: &Path, blocks: &Path, actions: &Path, frame_id: Option<&str>, pretty: bool) -> Result<ExitCode> {
    let src = read_dsl(file)?;
    let registry = IntegrationRegistry::from_json(&read_input(blocks)?, &read_input(actions)?)
        .context("failed to load integration registry")?;

    match framec_dsl::compile_source(&src, &registry, frame_id) {
        Ok(compiled) => {
            println!("{}", to_json(&compiled, pretty)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            if let PipelineError::Compile(errors) = &e {
                for msg in errors.messages() {
                    eprintln!("error: {msg}");
                }
            } else {
                eprint!("{e}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn decompile(file: &Path, pretty: bool) -> Result<ExitCode> {
    let compiled: CompiledFrame = serde_json::from_str(&read_input(file)?)
        .with_context(|| format!("{} is not a compiled frame", file.display()))?;
    println!("{}", to_json(&framec_dsl::decompile(&compiled), pretty)?);
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn compile_arguments() {
        let cli = Cli::try_parse_from([
            "framec", "compile", "main.frame", "--blocks", "b.json", "--actions", "a.json", "--frame-id", "f1",
        ])
        .unwrap();
        match cli.command {
            Command::Compile { frame_id, pretty, .. } => {
                assert_eq!(frame_id.as_deref(), Some("f1"));
                assert!(!pretty);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_log_flag() {
        let cli = Cli::try_parse_from(["framec", "detect", "x", "--log", "debug"]).unwrap();
        assert_eq!(cli.log.as_deref(), Some("debug"));
    }
}
