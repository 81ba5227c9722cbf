//! Tracing subscriber setup.

use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use dirs_next::cache_dir;
use tracing::Level;

const LEVEL_ENV: &str = "YYJJ_LOG";

/// Where log events are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard error, for one-shot commands.
    Stderr,
    /// Append to a file; used while the terminal UI owns stdout.
    File(PathBuf),
}

impl LogTarget {
    /// Log file under the user's cache directory, falling back to the temp dir.
    pub fn default_file() -> Self {
        let base = cache_dir().unwrap_or_else(env::temp_dir);
        LogTarget::File(base.join("yyjj").join("yyjj.log"))
    }
}

/// Maximum level from `YYJJ_LOG`, defaulting to `info`.
pub fn level_from_env() -> Level {
    env::var(LEVEL_ENV)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(Level::INFO)
}

/// Install the global subscriber.
pub fn init(target: LogTarget) -> Result<()> {
    let level = level_from_env();
    let builder = tracing_subscriber::fmt().with_max_level(level);

    let installed = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create log directory {}", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };

    installed.map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}
