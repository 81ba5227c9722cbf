//! Command-line entry points.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use thiserror::Error;

use crate::app::convert::{Converter, SerdeConverter};
use crate::app::io::FileKind;
use crate::domain::errors::ParseError;
use crate::domain::model::Pane;
use crate::infra::config::Config;
use crate::infra::fs::{ReadError, read_file_as_text};
use crate::infra::logging::LogTarget;
use crate::ui::app::UiApp;

#[derive(Debug, Parser)]
#[command(
    name = "yyjj",
    author,
    version,
    about = "Edit JSONC and YAML side by side, kept in sync",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub edit: EditArgs,
}

#[derive(Debug, Default, Clone, Args)]
pub struct EditArgs {
    /// Import this file into the JSONC pane at startup
    #[arg(long, value_name = "FILE")]
    pub jsonc: Option<PathBuf>,

    /// Import this file into the YAML pane at startup
    #[arg(long, value_name = "FILE")]
    pub yaml: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Open the two-pane terminal editor
    Edit(EditArgs),
    /// Convert one file, picking the direction from its extension
    Convert {
        file: PathBuf,
        /// Write the result here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Failures of `yyjj convert`.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("{}: unsupported file type (expected .json, .jsonc or .yaml)", .path.display())]
    UnknownKind { path: PathBuf },
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(
        "{}:{}:{}: {}",
        .path.display(),
        .error.location().line,
        .error.location().column,
        .error.message
    )]
    Parse { path: PathBuf, error: ParseError },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        None => run_editor(cli.edit),
        Some(Commands::Edit(args)) => run_editor(args),
        Some(Commands::Convert { file, output }) => {
            crate::init(LogTarget::Stderr)?;
            let text = convert_file(&file)?;
            write_output(output.as_deref(), &text)?;
            Ok(())
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "yyjj", &mut io::stdout());
            Ok(())
        }
    }
}

fn run_editor(args: EditArgs) -> Result<()> {
    crate::init(LogTarget::default_file())?;
    let config = Config::load()?;
    let now = Instant::now();
    let mut app = UiApp::new(config, now);

    for (pane, path) in [(Pane::Jsonc, &args.jsonc), (Pane::Yaml, &args.yaml)] {
        if let Some(path) = path {
            app.import(pane, path, now)
                .with_context(|| format!("failed to import {}", path.display()))?;
        }
    }

    app.run()
}

/// Convert the file at `path` into the other format.
pub fn convert_file(path: &Path) -> Result<String, ConvertError> {
    let kind = FileKind::from_path(path).ok_or_else(|| ConvertError::UnknownKind {
        path: path.to_path_buf(),
    })?;
    let text = read_file_as_text(path)?;
    let converted = SerdeConverter::new()
        .convert(kind.pane(), &text)
        .map_err(|error| {
            tracing::warn!(path = %path.display(), %error, "conversion failed");
            ConvertError::Parse {
                path: path.to_path_buf(),
                error,
            }
        })?;
    tracing::info!(path = %path.display(), from = %kind.pane(), "converted file");
    Ok(converted)
}

fn write_output(output: Option<&Path>, text: &str) -> Result<(), ConvertError> {
    match output {
        Some(path) => fs::write(path, text).map_err(|source| ConvertError::Write {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut stdout = io::stdout().lock();
            let result = if text.ends_with('\n') {
                stdout.write_all(text.as_bytes())
            } else {
                writeln!(stdout, "{text}")
            };
            result.map_err(|source| ConvertError::Write {
                path: PathBuf::from("<stdout>"),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_invocation_opens_editor_with_imports() {
        let cli = Cli::parse_from(["yyjj", "--yaml", "cfg.yaml"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.edit.yaml, Some(PathBuf::from("cfg.yaml")));
        assert_eq!(cli.edit.jsonc, None);
    }

    #[test]
    fn parses_convert_with_output() {
        let cli = Cli::parse_from(["yyjj", "convert", "in.jsonc", "-o", "out.yaml"]);
        match cli.command {
            Some(Commands::Convert { file, output }) => {
                assert_eq!(file, PathBuf::from("in.jsonc"));
                assert_eq!(output, Some(PathBuf::from("out.yaml")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn convert_file_follows_extension() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let jsonc = dir.path().join("a.jsonc");
        fs::write(&jsonc, "{\n  // note\n  \"a\": [1, 2,],\n}")?;
        assert_eq!(convert_file(&jsonc)?, "a:\n- 1\n- 2\n");

        let yaml = dir.path().join("b.yaml");
        fs::write(&yaml, "b: true\n")?;
        assert_eq!(convert_file(&yaml)?, "{\n  \"b\": true\n}");
        Ok(())
    }

    #[test]
    fn convert_errors_name_the_location() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bad.json");
        fs::write(&path, "{\"a\": 1")?;
        let err = convert_file(&path).unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.starts_with(&format!("{}:1:8: ", path.display())), "{rendered}");

        let unknown = dir.path().join("notes.txt");
        fs::write(&unknown, "x")?;
        assert!(matches!(
            convert_file(&unknown),
            Err(ConvertError::UnknownKind { .. })
        ));
        Ok(())
    }
}
