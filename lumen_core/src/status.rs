//! Outcome of one poll cycle.

use crate::error::TransportError;

/// Counters for a tick that enumerated every group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub groups: usize,
    /// Groups seen for the first time; recorded, not persisted.
    pub first_seen: usize,
    pub unchanged: usize,
    pub changed: usize,
    /// Correction commands issued across all changed groups.
    pub corrections: usize,
    pub sink_failures: usize,
    /// Sink writes still running when the fan-out deadline passed.
    pub sink_pending: usize,
}

/// Public status of a single poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Completed(TickSummary),
    /// Gateway call failed below the threshold; the rest of the tick was skipped.
    TransportFailed {
        error: TransportError,
        failures: u32,
    },
    /// Threshold reached (now or earlier). The alert has been sent; stop polling.
    Escalated {
        failures: u32,
        last_error: TransportError,
    },
}

impl TickOutcome {
    pub fn is_escalated(&self) -> bool {
        matches!(self, Self::Escalated { .. })
    }
}
