//! Inactive-session sweep results.

use serde::{Deserialize, Serialize};

/// Counters from one pass over the result table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Rows read in this pass.
    pub scanned: usize,
    /// Rows deleted because their session is no longer active.
    pub deleted: usize,
    /// The scan hit its row limit; another pass is needed to finish.
    pub truncated: bool,
}

/// Why a guarded sweep did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepSkip {
    NotStarted,
    NotCoordinator,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepOutcome {
    Completed(SweepReport),
    Skipped { reason: SweepSkip },
}
