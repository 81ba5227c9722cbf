//! Bidirectional synchronization between the JSONC and YAML buffers.
//!
//! Edits land in a buffer's live text immediately and arm that pane's debounce deadline. When the
//! deadline passes the pane either converts into its peer or, if the peer produced the last
//! successful conversion, swallows the firing as an echo of that conversion.
//!
//! Successful conversions record the source pane as the origin. The origin is consumed by the
//! very next firing on the peer pane, whatever the elapsed time. A failed conversion only
//! records an error on the source buffer; the peer buffer and the origin stay as they were.

use std::time::{Duration, Instant};

use time::OffsetDateTime;

use crate::app::convert::{Converter, SerdeConverter};
use crate::app::debounce::{DEFAULT_QUIET_INTERVAL, Debouncer};
use crate::app::export::{Export, ExportNamer};
use crate::domain::errors::ParseError;
use crate::domain::model::{Buffer, Pane, PerPane};

/// Document loaded into the JSONC pane when a session starts.
pub const DEFAULT_JSONC: &str = r#"{
  // Server settings
  "server": "localhost",
  "port": 8080,
  /* Database connection */
  "database": {
    "host": "db.example.com",
    "name": "myapp"
  }
}"#;

/// What a single debounce firing or import did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Firing {
    /// The peer was the origin; the marker was consumed and nothing converted.
    Echo,
    /// The pane converted into its peer and became the origin.
    Converted,
    /// The converter rejected the pane's text; the error is stored on the pane.
    Failed,
}

/// A firing observed by [`SyncEngine::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireReport {
    pub pane: Pane,
    pub outcome: Firing,
}

/// Owns both buffers and keeps them consistent through a [`Converter`].
#[derive(Debug)]
pub struct SyncEngine<C = SerdeConverter> {
    converter: C,
    buffers: PerPane<Buffer>,
    origin: Option<Pane>,
    debouncer: Debouncer,
    namer: ExportNamer,
}

impl SyncEngine<SerdeConverter> {
    /// Session seeded with [`DEFAULT_JSONC`] and the default quiet interval.
    pub fn with_defaults(now: Instant) -> Self {
        Self::start(SerdeConverter::new(), DEFAULT_JSONC, DEFAULT_QUIET_INTERVAL, now)
    }
}

impl<C: Converter> SyncEngine<C> {
    /// Create a session whose JSONC pane holds `sample` and whose YAML pane is empty, then
    /// synchronize once without waiting for a debounce.
    pub fn start(converter: C, sample: impl Into<String>, quiet: Duration, now: Instant) -> Self {
        let mut engine = Self {
            converter,
            buffers: PerPane::new(Buffer::with_text(sample), Buffer::default()),
            origin: None,
            debouncer: Debouncer::new(quiet),
            namer: ExportNamer::new(),
        };
        let outcome = engine.convert_from(Pane::Jsonc, now);
        tracing::debug!(outcome = ?outcome, "initial synchronization");
        engine
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    pub fn buffer(&self, pane: Pane) -> &Buffer {
        self.buffers.get(pane)
    }

    pub fn text(&self, pane: Pane) -> &str {
        &self.buffers.get(pane).text
    }

    pub fn error(&self, pane: Pane) -> Option<&ParseError> {
        self.buffers.get(pane).error.as_ref()
    }

    pub fn filename(&self, pane: Pane) -> Option<&str> {
        self.buffers.get(pane).filename.as_deref()
    }

    /// Pane that produced the last unconsumed successful conversion.
    pub fn origin(&self) -> Option<Pane> {
        self.origin
    }

    pub fn is_pending(&self, pane: Pane) -> bool {
        self.debouncer.is_pending(pane)
    }

    /// Earliest instant at which [`SyncEngine::poll`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.next_deadline()
    }

    /// Replace the live text of `pane` and (re)arm its debounce deadline.
    pub fn on_edit(&mut self, pane: Pane, text: impl Into<String>, now: Instant) {
        self.buffers.get_mut(pane).text = text.into();
        self.debouncer.arm(pane, now);
    }

    /// Fire every pane whose deadline has passed, earliest first.
    pub fn poll(&mut self, now: Instant) -> Vec<FireReport> {
        let mut reports = Vec::new();
        while let Some(pane) = self.debouncer.take_due(now) {
            let outcome = self.fire(pane, now);
            reports.push(FireReport { pane, outcome });
        }
        reports
    }

    /// Run the debounce firing for `pane` immediately.
    pub fn fire(&mut self, pane: Pane, now: Instant) -> Firing {
        self.debouncer.cancel(pane);
        if self.origin == Some(pane.other()) {
            self.origin = None;
            tracing::debug!(pane = %pane, "echo suppressed");
            return Firing::Echo;
        }
        self.convert_from(pane, now)
    }

    /// Load external contents into `pane` and synchronize without debouncing.
    ///
    /// On success the peer's filename and error are cleared since its text no longer mirrors a
    /// file of its own. On failure the peer is untouched.
    pub fn import_into(
        &mut self,
        pane: Pane,
        contents: impl Into<String>,
        filename: impl Into<String>,
        now: Instant,
    ) -> Firing {
        let buffer = self.buffers.get_mut(pane);
        buffer.text = contents.into();
        buffer.filename = Some(filename.into());

        // The import replaces whatever the pending firing (edit or echo) was about.
        if self.debouncer.cancel(pane) && self.origin == Some(pane.other()) {
            self.origin = None;
        }

        let outcome = self.convert_from(pane, now);
        if outcome == Firing::Converted {
            self.buffers.get_mut(pane.other()).filename = None;
        }
        tracing::info!(
            pane = %pane,
            filename = self.filename(pane).unwrap_or_default(),
            outcome = ?outcome,
            "imported file"
        );
        outcome
    }

    /// Record that an import into `pane` could not read its file.
    ///
    /// Text and filename keep their previous values.
    pub fn record_read_failure(&mut self, pane: Pane) {
        tracing::warn!(pane = %pane, "import read failed");
        self.buffers.get_mut(pane).error = Some(ParseError::read_failure());
    }

    /// Current text of `pane` with its effective export filename.
    pub fn export_from(&mut self, pane: Pane, now: OffsetDateTime) -> Export {
        let buffer = self.buffers.get(pane);
        let filename = self
            .namer
            .filename_for(pane, buffer.filename.as_deref(), now);
        Export {
            pane,
            text: buffer.text.clone(),
            filename,
            mime_type: pane.mime_type(),
        }
    }

    fn convert_from(&mut self, source: Pane, now: Instant) -> Firing {
        let target = source.other();
        match self.converter.convert(source, &self.buffers.get(source).text) {
            Ok(converted) => {
                self.buffers.get_mut(source).error = None;
                self.origin = Some(source);

                let peer = self.buffers.get_mut(target);
                peer.text = converted;
                peer.error = None;

                // Rewriting the peer counts as a change to it: any pending firing from earlier
                // typing is replaced by the echo firing that will consume the origin.
                self.debouncer.arm(target, now);
                tracing::debug!(from = %source, to = %target, "converted");
                Firing::Converted
            }
            Err(err) => {
                tracing::warn!(pane = %source, error = %err, "conversion failed");
                self.buffers.get_mut(source).error = Some(err);
                Firing::Failed
            }
        }
    }
}
