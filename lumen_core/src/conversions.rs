//! `From` implementations bridging `lumen_config` types to `lumen_core` types.

use std::time::Duration;

use crate::config::{BaselineCfg, FanoutCfg, PollCfg, ResilienceCfg};

impl From<&lumen_config::Poll> for PollCfg {
    fn from(c: &lumen_config::Poll) -> Self {
        Self {
            interval: Duration::from_millis(c.interval_ms),
        }
    }
}

impl From<&lumen_config::Fanout> for FanoutCfg {
    fn from(c: &lumen_config::Fanout) -> Self {
        Self {
            deadline: Duration::from_millis(c.deadline_ms),
        }
    }
}

impl From<&lumen_config::Resilience> for ResilienceCfg {
    fn from(c: &lumen_config::Resilience) -> Self {
        Self {
            failure_threshold: c.failure_threshold,
        }
    }
}

impl From<&lumen_config::Baseline> for BaselineCfg {
    fn from(c: &lumen_config::Baseline) -> Self {
        Self {
            enabled: c.enabled,
            lookback_days: c.lookback_days,
            percentile: c.percentile,
            rebuild_interval: Duration::from_secs(c.rebuild_interval_s),
        }
    }
}
