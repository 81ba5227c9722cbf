//! Per-pane debounce deadlines.

use std::time::{Duration, Instant};

use crate::domain::model::{Pane, PerPane};

/// Default quiet period before an edit is converted.
pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(300);

/// Coalesces bursts of edits per pane into a single firing.
///
/// Each pane owns at most one pending deadline. Arming replaces whatever was pending, so only the
/// last edit inside the quiet window ever fires.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    deadlines: PerPane<Option<Instant>>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadlines: PerPane::default(),
        }
    }

    /// Schedule a firing for `pane` one quiet interval after `now`, superseding any pending one.
    pub fn arm(&mut self, pane: Pane, now: Instant) {
        *self.deadlines.get_mut(pane) = Some(now + self.quiet);
    }

    /// Drop the pending firing for `pane`. Returns whether one was pending.
    pub fn cancel(&mut self, pane: Pane) -> bool {
        self.deadlines.get_mut(pane).take().is_some()
    }

    pub fn is_pending(&self, pane: Pane) -> bool {
        self.deadlines.get(pane).is_some()
    }

    pub fn deadline(&self, pane: Pane) -> Option<Instant> {
        *self.deadlines.get(pane)
    }

    /// Earliest pending deadline across both panes.
    pub fn next_deadline(&self) -> Option<Instant> {
        Pane::ALL
            .into_iter()
            .filter_map(|pane| self.deadline(pane))
            .min()
    }

    /// Remove and return the pane whose deadline is earliest and already due at `now`.
    ///
    /// Ties resolve in [`Pane::ALL`] order.
    pub fn take_due(&mut self, now: Instant) -> Option<Pane> {
        let mut due: Option<(Pane, Instant)> = None;
        for pane in Pane::ALL {
            if let Some(deadline) = self.deadline(pane)
                && deadline <= now
                && due.is_none_or(|(_, earliest)| deadline < earliest)
            {
                due = Some((pane, deadline));
            }
        }
        let (pane, _) = due?;
        self.cancel(pane);
        Some(pane)
    }
}
