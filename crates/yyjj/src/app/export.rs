//! Export naming and artifact writing.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::domain::model::{Pane, PerPane};

/// Snapshot of a buffer ready to be handed to a save collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub pane: Pane,
    pub text: String,
    pub filename: String,
    pub mime_type: &'static str,
}

impl Export {
    /// Write the export into `dir`, creating the directory when missing.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create export directory: {}", dir.display()))?;
        }
        let path = dir.join(&self.filename);
        fs::write(&path, &self.text)
            .with_context(|| format!("failed to write export output to {}", path.display()))?;
        Ok(path)
    }
}

/// Produces export filenames for buffers without a stored filename.
///
/// Names are `<base>-<UTC timestamp><ext>`. When a pane would get the same name twice in a row a
/// numeric suffix keeps them apart.
#[derive(Debug, Default, Clone)]
pub struct ExportNamer {
    last: PerPane<Option<(String, u32)>>,
}

impl ExportNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective filename for `pane`: the stored name when present, otherwise a generated one.
    pub fn filename_for(
        &mut self,
        pane: Pane,
        stored: Option<&str>,
        now: OffsetDateTime,
    ) -> String {
        match stored {
            Some(name) => name.to_owned(),
            None => self.generate(pane, now),
        }
    }

    fn generate(&mut self, pane: Pane, now: OffsetDateTime) -> String {
        let stem = format!("{}-{}", pane.export_base(), timestamp(now));
        let slot = self.last.get_mut(pane);
        let counter = match slot.as_ref() {
            Some((previous, counter)) if *previous == stem => counter + 1,
            _ => 0,
        };
        *slot = Some((stem.clone(), counter));

        if counter == 0 {
            format!("{stem}{}", pane.extension())
        } else {
            format!("{stem}-{counter}{}", pane.extension())
        }
    }
}

fn timestamp(now: OffsetDateTime) -> String {
    let utc = now.to_offset(UtcOffset::UTC);
    utc.format(format_description!("[year]-[month]-[day]T[hour]-[minute]-[second]"))
        .unwrap_or_else(|_| utc.unix_timestamp().to_string())
}
