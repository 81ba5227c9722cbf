//! Domain models for the two synchronized buffers.

use std::fmt;

use crate::domain::errors::ParseError;

/// Identifies one of the two editing panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pane {
    /// Primary format: JSON with comments.
    Jsonc,
    /// Secondary format: YAML.
    Yaml,
}

impl Pane {
    pub const ALL: [Pane; 2] = [Pane::Jsonc, Pane::Yaml];

    /// The peer pane that receives this pane's conversions.
    pub fn other(self) -> Pane {
        match self {
            Pane::Jsonc => Pane::Yaml,
            Pane::Yaml => Pane::Jsonc,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Pane::Jsonc => "JSONC",
            Pane::Yaml => "YAML",
        }
    }

    /// Base name used when exporting a buffer that never came from a file.
    pub fn export_base(self) -> &'static str {
        "output"
    }

    pub fn extension(self) -> &'static str {
        match self {
            Pane::Jsonc => ".jsonc",
            Pane::Yaml => ".yaml",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Pane::Jsonc => "application/json",
            Pane::Yaml => "text/yaml",
        }
    }

    fn index(self) -> usize {
        match self {
            Pane::Jsonc => 0,
            Pane::Yaml => 1,
        }
    }
}

impl fmt::Display for Pane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Live text of one pane plus its error and file metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    pub text: String,
    pub error: Option<ParseError>,
    pub filename: Option<String>,
}

impl Buffer {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Value stored once per pane, indexed by [`Pane`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerPane<T> {
    slots: [T; 2],
}

impl<T> PerPane<T> {
    pub fn new(jsonc: T, yaml: T) -> Self {
        Self {
            slots: [jsonc, yaml],
        }
    }

    pub fn get(&self, pane: Pane) -> &T {
        &self.slots[pane.index()]
    }

    pub fn get_mut(&mut self, pane: Pane) -> &mut T {
        &mut self.slots[pane.index()]
    }
}
