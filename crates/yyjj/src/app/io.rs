//! Path-level import and export on top of the synchronization engine.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use thiserror::Error;
use time::OffsetDateTime;

use crate::app::convert::Converter;
use crate::app::sync::{Firing, SyncEngine};
use crate::domain::model::Pane;
use crate::infra::fs::{display_name, read_file_as_text};

/// Which pane a file belongs to, judged by its extension.
///
/// `.json` and `.jsonc` go to the JSONC pane and `.yaml` to the YAML pane. `.yml` is not
/// accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileKind(pub Pane);

impl FileKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".yaml") {
            return Some(FileKind(Pane::Yaml));
        }
        if lower.ends_with(".jsonc") || lower.ends_with(".json") {
            return Some(FileKind(Pane::Jsonc));
        }
        None
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_name(&display_name(path))
    }

    pub fn pane(self) -> Pane {
        self.0
    }
}

/// Reasons an import is refused before touching any buffer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("{name} is not a {expected} file")]
    WrongKind { name: String, expected: Pane },
}

/// Import the file at `path` into `pane`.
///
/// Files whose extension belongs to the other pane are refused. A file that cannot be read
/// records the read-failure error on `pane`; otherwise the contents go through
/// [`SyncEngine::import_into`].
pub fn import_path<C: Converter>(
    engine: &mut SyncEngine<C>,
    pane: Pane,
    path: &Path,
    now: Instant,
) -> Result<Firing, ImportError> {
    let name = display_name(path);
    if FileKind::from_name(&name) != Some(FileKind(pane)) {
        return Err(ImportError::WrongKind {
            name,
            expected: pane,
        });
    }

    match read_file_as_text(path) {
        Ok(contents) => Ok(engine.import_into(pane, contents, name, now)),
        Err(err) => {
            tracing::warn!(error = %err, "import read failed");
            engine.record_read_failure(pane);
            Ok(Firing::Failed)
        }
    }
}

/// Write the current contents of `pane` into `dir` under its effective filename.
pub fn export_to_dir<C: Converter>(
    engine: &mut SyncEngine<C>,
    pane: Pane,
    dir: &Path,
    now: OffsetDateTime,
) -> Result<PathBuf> {
    let export = engine.export_from(pane, now);
    let path = export.write_to_dir(dir)?;
    tracing::info!(pane = %pane, path = %path.display(), "exported buffer");
    Ok(path)
}
