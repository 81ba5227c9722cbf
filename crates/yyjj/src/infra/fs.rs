//! File system adapters for importing buffers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure to load a file as text.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path} is not valid UTF-8 text")]
    NotText { path: PathBuf },
}

/// Read the whole file at `path` as UTF-8 text.
pub fn read_file_as_text(path: &Path) -> Result<String, ReadError> {
    let bytes = fs::read(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| ReadError::NotText {
        path: path.to_path_buf(),
    })
}

/// Final path component used as the buffer's filename.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
