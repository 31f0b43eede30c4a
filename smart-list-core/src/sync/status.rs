//! Save button state for a list.

use std::fmt;
use std::time::{Duration, Instant};

/// How long the transient "Saved" / "Save Failed" indicators stay up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorTimings {
    pub saved: Duration,
    pub failed: Duration,
}

impl Default for IndicatorTimings {
    fn default() -> Self {
        Self {
            saved: Duration::from_millis(2000),
            failed: Duration::from_millis(3000),
        }
    }
}

/// Per-list save state.
///
/// ```text
/// Clean/Dirty --begin--> Saving --ok--> Saved --(timeout)--> Clean | Dirty
///                              \--err--> Failed --(timeout)--> Dirty
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Clean,
    Dirty,
    Saving,
    /// `pending` is set when edits arrived while the save was in flight.
    Saved { at: Instant, pending: bool },
    Failed { at: Instant },
}

impl SaveStatus {
    pub fn is_saving(&self) -> bool {
        matches!(self, SaveStatus::Saving)
    }

    /// Whether the list has edits the server has not confirmed.
    pub fn has_unsaved_changes(&self) -> bool {
        match self {
            SaveStatus::Clean => false,
            SaveStatus::Dirty | SaveStatus::Failed { .. } => true,
            SaveStatus::Saving => true,
            SaveStatus::Saved { pending, .. } => *pending,
        }
    }

    /// Apply a local edit. Ignored while a save is in flight.
    pub fn mark_dirty(&mut self) {
        if !self.is_saving() {
            *self = SaveStatus::Dirty;
        }
    }

    /// Expire transient indicators whose display interval has passed.
    pub fn settle(self, now: Instant, timings: &IndicatorTimings) -> SaveStatus {
        match self {
            SaveStatus::Saved { at, pending } if now.duration_since(at) >= timings.saved => {
                if pending {
                    SaveStatus::Dirty
                } else {
                    SaveStatus::Clean
                }
            }
            SaveStatus::Failed { at } if now.duration_since(at) >= timings.failed => {
                SaveStatus::Dirty
            }
            other => other,
        }
    }

    /// Text of the list's save button.
    pub fn label(&self) -> &'static str {
        match self {
            SaveStatus::Clean => "💾 Save List",
            SaveStatus::Dirty => "💾 Save Changes",
            SaveStatus::Saving => "💾 Saving...",
            SaveStatus::Saved { .. } => "💾 Saved",
            SaveStatus::Failed { .. } => "💾 Save Failed",
        }
    }

    /// Short machine-readable name, used for JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveStatus::Clean => "clean",
            SaveStatus::Dirty => "dirty",
            SaveStatus::Saving => "saving",
            SaveStatus::Saved { .. } => "saved",
            SaveStatus::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
