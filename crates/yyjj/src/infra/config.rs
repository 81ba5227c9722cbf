//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".yyjj/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub export: Export,
    #[serde(default)]
    pub session: Session,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SyncSettings {
    #[serde(default)]
    debounce_ms: Option<u64>,
}

impl SyncSettings {
    fn default_debounce_ms() -> u64 {
        300
    }

    pub fn debounce_ms(&self) -> u64 {
        self.debounce_ms.unwrap_or(Self::default_debounce_ms())
    }

    /// Quiet interval before an edit is converted.
    pub fn quiet_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_ms())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Export {
    #[serde(default)]
    dir: Option<String>,
}

impl Export {
    fn default_dir() -> &'static str {
        "."
    }

    /// Directory that exports are written into.
    pub fn dir(&self) -> PathBuf {
        PathBuf::from(self.dir.as_deref().unwrap_or(Self::default_dir()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Session {
    /// File whose contents replace the built-in JSONC sample.
    #[serde(default)]
    pub sample: Option<String>,
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    debounce_ms: Option<String>,
    export_dir: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            debounce_ms: env::var("YYJJ_DEBOUNCE_MS").ok(),
            export_dir: env::var("YYJJ_EXPORT_DIR").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(debounce_ms: &str, export_dir: &str) -> Self {
        Self {
            debounce_ms: Some(debounce_ms.to_owned()),
            export_dir: Some(export_dir.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        apply_env_overrides(merged, env_overrides)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            sync: SyncSettings {
                debounce_ms: other.sync.debounce_ms.or(self.sync.debounce_ms),
            },
            export: Export {
                dir: other.export.dir.or(self.export.dir),
            },
            session: Session {
                sample: other.session.sample.or(self.session.sample),
            },
        }
    }

    /// Text loaded into the JSONC pane at startup, when a sample file is configured.
    pub fn sample_text(&self) -> Option<String> {
        let path = self.session.sample.as_deref()?;
        match fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::warn!(path, error = %err, "failed to read configured sample");
                None
            }
        }
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("yyjj/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Result<Config> {
    if let Some(debounce_ms) = env.debounce_ms {
        config.sync.debounce_ms = Some(
            debounce_ms
                .trim()
                .parse()
                .with_context(|| format!("invalid YYJJ_DEBOUNCE_MS value '{debounce_ms}'"))?,
        );
    }
    if let Some(export_dir) = env.export_dir {
        config.export.dir = Some(export_dir);
    }
    Ok(config)
}
