//! Common time helpers for lumen_core.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use lumen_traits::Clock;

/// Longest single sleep while waiting; bounds shutdown latency.
pub const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Duration as whole milliseconds, saturating at `u64::MAX`.
#[inline]
pub fn millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

/// Sleep for `total` in slices, returning early once `stop` is set.
/// Returns true when the full duration elapsed.
pub fn sleep_unless_stopped<C: Clock + ?Sized>(clock: &C, total: Duration, stop: &AtomicBool) -> bool {
    let start = clock.now();
    loop {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let elapsed = clock.now().saturating_duration_since(start);
        if elapsed >= total {
            return true;
        }
        clock.sleep((total - elapsed).min(SLEEP_SLICE));
    }
}
