//! Runtime configuration for the poll loop.
//!
//! These are the structs used by `Poller` and the runner, separate from the
//! TOML-deserialized config in `lumen_config`.

use std::time::Duration;

/// Poll scheduling.
#[derive(Debug, Clone)]
pub struct PollCfg {
    /// Time between the starts of two consecutive ticks.
    pub interval: Duration,
}

impl Default for PollCfg {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
        }
    }
}

/// Persistence fan-out.
#[derive(Debug, Clone)]
pub struct FanoutCfg {
    /// Upper bound on how long a tick waits for its sinks.
    pub deadline: Duration,
}

impl Default for FanoutCfg {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(4),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResilienceCfg {
    /// Consecutive transport failures that trigger escalation.
    pub failure_threshold: u32,
}

impl Default for ResilienceCfg {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
        }
    }
}

/// Baseline learning.
#[derive(Debug, Clone)]
pub struct BaselineCfg {
    /// When false, nothing is rebuilt in the background; loaded baselines still apply.
    pub enabled: bool,
    pub lookback_days: u32,
    /// Percentile in (0, 100).
    pub percentile: f64,
    pub rebuild_interval: Duration,
}

impl Default for BaselineCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            lookback_days: 14,
            percentile: 85.0,
            rebuild_interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl BaselineCfg {
    pub fn lookback(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.lookback_days))
    }
}
