//! Command-line front end for retarget.
//!
//! Reads a program (a file, stdin, or statements typed into `--repl`),
//! translates it with the built-in overlay for `--to` plus any user
//! overlays, and writes the result.

pub mod config;
pub mod error;

pub use config::RetargetConfig;
pub use error::CliError;

use clap::{ArgAction, Parser};
use retarget_core::{Mode, Overlay, OverlayBuilder, Transpiler};
use retarget_syntax::reader_for_extension;
use std::io::{BufRead, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

const DEFAULT_DIALECT: &str = "python";

#[derive(Parser, Debug)]
#[command(name = "retarget", version, about = "Translate programs between languages")]
pub struct Cli {
    /// Source file (stdin if not specified)
    pub input: Option<PathBuf>,

    /// Target language: python, javascript, lua
    #[arg(short, long)]
    pub to: Option<String>,

    /// Source dialect (default: from the file extension, else python)
    #[arg(short, long)]
    pub from: Option<String>,

    /// Extra overlay document, merged over the built-in one (repeatable)
    #[arg(long, value_name = "FILE")]
    pub overlay: Vec<PathBuf>,

    /// Config file (default: ./retarget.toml if present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Interactive session: each statement is translated as it is entered
    #[arg(long, conflicts_with = "input")]
    pub repl: bool,

    /// List the built-in target languages and exit
    #[arg(long)]
    pub list_targets: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Flags merged over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub target: String,
    pub dialect: String,
    pub overlays: Vec<PathBuf>,
}

impl Options {
    pub fn resolve(cli: &Cli, config: RetargetConfig) -> Result<Self, CliError> {
        let target = cli
            .to
            .clone()
            .or(config.defaults.target)
            .ok_or(CliError::NoTarget)?;

        let dialect = match (&cli.from, config.defaults.from, &cli.input) {
            (Some(from), _, _) => from.clone(),
            (None, Some(from), _) => from,
            (None, None, Some(path)) => dialect_for_path(path)?,
            (None, None, None) => DEFAULT_DIALECT.to_string(),
        };

        let mut overlays = config.overlays.paths;
        overlays.extend(cli.overlay.iter().cloned());

        Ok(Options {
            target,
            dialect,
            overlays,
        })
    }
}

fn dialect_for_path(path: &Path) -> Result<String, CliError> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(reader_for_extension)
        .map(|reader| reader.dialect().to_string())
        .ok_or_else(|| CliError::UnknownExtension(path.to_path_buf()))
}

/// Built-in overlay for `target` with each user document merged in order.
pub fn load_overlay(target: &str, documents: &[PathBuf]) -> Result<Overlay, CliError> {
    let mut builder = OverlayBuilder::for_target(target)?;
    for path in documents {
        let yaml = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.clone(),
            source,
        })?;
        builder = builder.merge_str(&yaml).map_err(|source| CliError::Overlay {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "merged overlay");
    }
    Ok(builder.build()?)
}

/// Run the command described by `cli`.
pub fn run(cli: Cli) -> Result<(), CliError> {
    if cli.list_targets {
        let mut stdout = std::io::stdout().lock();
        for target in Overlay::targets() {
            writeln!(stdout, "{target}")?;
        }
        return Ok(());
    }

    let cwd = std::env::current_dir()?;
    let config = RetargetConfig::load(cli.config.as_deref(), &cwd)?;
    let options = Options::resolve(&cli, config)?;
    let overlay = load_overlay(&options.target, &options.overlays)?;
    let mut transpiler = Transpiler::new(overlay);

    if cli.repl {
        let stdin = std::io::stdin();
        let prompt = stdin.is_terminal();
        return repl(
            &mut transpiler,
            &options.dialect,
            stdin.lock(),
            std::io::stdout().lock(),
            prompt,
        );
    }

    let source = match &cli.input {
        Some(path) => std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.clone(),
            source,
        })?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let output = transpiler.generate(&source, &options.dialect, Mode::Standalone)?;
    match &cli.output {
        Some(path) => std::fs::write(path, format!("{output}\n")).map_err(|source| CliError::Io {
            path: path.clone(),
            source,
        })?,
        None => writeln!(std::io::stdout().lock(), "{output}")?,
    }
    Ok(())
}

/// Chained session over `input`: prints only what each entry adds.
///
/// A line ending in `:` opens a block, which is submitted at the next blank
/// line. Translation errors are reported and the session continues.
pub fn repl(
    transpiler: &mut Transpiler,
    dialect: &str,
    input: impl BufRead,
    mut output: impl Write,
    prompt: bool,
) -> Result<(), CliError> {
    let mut pending = String::new();
    if prompt {
        eprint!(">>> ");
    }

    for line in input.lines() {
        let line = line?;
        let in_block = !pending.is_empty();
        if in_block && !line.trim().is_empty() {
            pending.push_str(&line);
            pending.push('\n');
        } else if !in_block && line.trim_end().ends_with(':') {
            pending.push_str(&line);
            pending.push('\n');
        } else {
            let entry = if in_block { std::mem::take(&mut pending) } else { line };
            if !entry.trim().is_empty() {
                submit(transpiler, dialect, &entry, &mut output)?;
            }
        }
        if prompt {
            eprint!("{}", if pending.is_empty() { ">>> " } else { "... " });
        }
    }

    if !pending.is_empty() {
        submit(transpiler, dialect, &pending, &mut output)?;
    }
    Ok(())
}

fn submit(
    transpiler: &mut Transpiler,
    dialect: &str,
    entry: &str,
    output: &mut impl Write,
) -> Result<(), CliError> {
    let before = transpiler.state().output().len();
    match transpiler.generate(entry, dialect, Mode::Chained) {
        Ok(_) => {
            for text in &transpiler.state().output()[before..] {
                writeln!(output, "{text}")?;
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "entry rejected");
            eprintln!("error: {e}");
        }
    }
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("retarget").chain(args.iter().copied()))
    }

    #[test]
    fn test_flags_override_config() {
        let config = RetargetConfig {
            defaults: config::DefaultsConfig {
                target: Some("lua".into()),
                from: Some("json".into()),
            },
            overlays: config::OverlaysConfig {
                paths: vec![PathBuf::from("house.yaml")],
            },
        };
        let options =
            Options::resolve(&cli(&["--to", "javascript", "--overlay", "mine.yaml"]), config).unwrap();
        assert_eq!(options.target, "javascript");
        assert_eq!(options.dialect, "json");
        assert_eq!(
            options.overlays,
            vec![PathBuf::from("house.yaml"), PathBuf::from("mine.yaml")]
        );
    }

    #[test]
    fn test_dialect_from_extension() {
        let options = Options::resolve(&cli(&["prog.py", "--to", "lua"]), RetargetConfig::default()).unwrap();
        assert_eq!(options.dialect, "python");

        let err = Options::resolve(&cli(&["prog.rb", "--to", "lua"]), RetargetConfig::default());
        assert!(matches!(err, Err(CliError::UnknownExtension(_))));
    }

    #[test]
    fn test_stdin_defaults_to_python() {
        let options = Options::resolve(&cli(&["--to", "lua"]), RetargetConfig::default()).unwrap();
        assert_eq!(options.dialect, "python");
    }

    #[test]
    fn test_target_required() {
        let err = Options::resolve(&cli(&[]), RetargetConfig::default());
        assert!(matches!(err, Err(CliError::NoTarget)));
    }

    #[test]
    fn test_verbose_counts() {
        assert_eq!(cli(&["-vv", "--list-targets"]).verbose, 2);
    }
}
