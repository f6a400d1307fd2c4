//! Snapshot comparison.
//!
//! Comparison is index-aligned: entry `i` of the previous snapshot is compared
//! with entry `i` of the current one on power, dimmer and colour only.
//! Timestamps and device ids are ignored, so a reordering of devices between
//! polls reads as a change.

use lumen_traits::{GroupSnapshot, LightState};

/// How a fresh snapshot relates to the last known one for its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// No previous snapshot; record it, but do not persist.
    First,
    Unchanged,
    Changed,
}

/// Semantic equality of two light states.
#[inline]
pub fn same_light(a: &LightState, b: &LightState) -> bool {
    a.power() == b.power() && a.dimmer() == b.dimmer() && a.color() == b.color()
}

/// True when the snapshots differ in length or in any index-aligned light.
pub fn changed(previous: &GroupSnapshot, current: &GroupSnapshot) -> bool {
    previous.len() != current.len()
        || previous
            .iter()
            .zip(current.iter())
            .any(|(a, b)| !same_light(a, b))
}

pub fn classify(previous: Option<&GroupSnapshot>, current: &GroupSnapshot) -> Observation {
    match previous {
        None => Observation::First,
        Some(prev) if changed(prev, current) => Observation::Changed,
        Some(_) => Observation::Unchanged,
    }
}
