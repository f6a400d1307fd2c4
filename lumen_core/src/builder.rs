//! Type-state builder for `Poller`.
//!
//! The builder enforces at compile time that a transport and a notifier are
//! provided before `build()` is available. `try_build()` is always available
//! for dynamic checks.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use lumen_traits::{Clock, Notifier, StateSink, SystemClock, Transport};

use crate::baseline::BaselineCache;
use crate::config::{FanoutCfg, ResilienceCfg};
use crate::error::{BuildError, Result};
use crate::poller::Poller;
use crate::resilience::Escalation;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Poller`. All fields are validated on `build()`.
pub struct PollerBuilder<T, N> {
    transport: Option<Box<dyn Transport>>,
    notifier: Option<Arc<dyn Notifier>>,
    sinks: Vec<Arc<dyn StateSink>>,
    baselines: Option<Arc<BaselineCache>>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    fanout: Option<FanoutCfg>,
    resilience: Option<ResilienceCfg>,
    _t: PhantomData<T>,
    _n: PhantomData<N>,
}

impl Default for PollerBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            transport: None,
            notifier: None,
            sinks: Vec::new(),
            baselines: None,
            clock: None,
            fanout: None,
            resilience: None,
            _t: PhantomData,
            _n: PhantomData,
        }
    }
}

impl<T, N> PollerBuilder<T, N> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Poller> {
        let transport = self
            .transport
            .ok_or_else(|| eyre::Report::new(BuildError::MissingTransport))?;
        let notifier = self
            .notifier
            .ok_or_else(|| eyre::Report::new(BuildError::MissingNotifier))?;
        let fanout = self.fanout.unwrap_or_default();
        let resilience = self.resilience.unwrap_or_default();

        if fanout.deadline.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "fan-out deadline must be > 0",
            )));
        }
        if resilience.failure_threshold == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "failure_threshold must be >= 1",
            )));
        }
        let mut names: Vec<&str> = self.sinks.iter().map(|s| s.name()).collect();
        names.sort_unstable();
        if names.windows(2).any(|w| w[0] == w[1]) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "sink names must be unique",
            )));
        }

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(SystemClock::new()),
        };

        Ok(Poller {
            transport,
            sinks: self.sinks,
            baselines: self.baselines.unwrap_or_default(),
            escalation: Escalation::new(resilience.failure_threshold, notifier),
            clock,
            fanout,
            last_known: HashMap::new(),
            last_error: None,
        })
    }
}

/// Chainable setters that do not affect type-state.
impl<T, N> PollerBuilder<T, N> {
    /// Add a persistence sink. Order is the order of fan-out reports.
    pub fn with_sink(mut self, sink: Arc<dyn StateSink>) -> Self {
        self.sinks.push(sink);
        self
    }
    pub fn with_sinks<I: IntoIterator<Item = Arc<dyn StateSink>>>(mut self, sinks: I) -> Self {
        self.sinks.extend(sinks);
        self
    }
    /// Share a baseline cache with a rebuild schedule; defaults to an empty cache.
    pub fn with_baselines(mut self, cache: Arc<BaselineCache>) -> Self {
        self.baselines = Some(cache);
        self
    }
    /// Provide a custom clock implementation; defaults to `SystemClock` when not provided.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    pub fn with_fanout(mut self, fanout: FanoutCfg) -> Self {
        self.fanout = Some(fanout);
        self
    }
    pub fn with_resilience(mut self, resilience: ResilienceCfg) -> Self {
        self.resilience = Some(resilience);
        self
    }
}

// Setters that advance type-state
impl<N> PollerBuilder<Missing, N> {
    pub fn with_transport(self, transport: impl Transport + 'static) -> PollerBuilder<Set, N> {
        PollerBuilder {
            transport: Some(Box::new(transport)),
            notifier: self.notifier,
            sinks: self.sinks,
            baselines: self.baselines,
            clock: self.clock,
            fanout: self.fanout,
            resilience: self.resilience,
            _t: PhantomData,
            _n: PhantomData,
        }
    }
}

impl<T> PollerBuilder<T, Missing> {
    pub fn with_notifier(self, notifier: Arc<dyn Notifier>) -> PollerBuilder<T, Set> {
        PollerBuilder {
            transport: self.transport,
            notifier: Some(notifier),
            sinks: self.sinks,
            baselines: self.baselines,
            clock: self.clock,
            fanout: self.fanout,
            resilience: self.resilience,
            _t: PhantomData,
            _n: PhantomData,
        }
    }
}

impl PollerBuilder<Set, Set> {
    /// Validate and build the Poller. Only available when transport and notifier are set.
    pub fn build(self) -> Result<Poller> {
        self.try_build()
    }
}
