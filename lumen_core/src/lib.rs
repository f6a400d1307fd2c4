#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core polling logic (gateway-agnostic).
//!
//! This crate watches a lighting gateway, records state changes and learns
//! per-hour dimmer baselines. All outside interactions go through the
//! `lumen_traits` capabilities (`Transport`, `StateSink`, `HistoryStore`,
//! `Notifier`, `Clock`).
//!
//! ## Architecture
//!
//! - **Percentile**: integer percentile estimate (`percentile` module)
//! - **Diffing**: index-aligned snapshot comparison (`diff` module)
//! - **Fan-out**: concurrent sink writes with a bounded wait (`fanout` module)
//! - **Resilience**: consecutive-failure counter and one-shot escalation
//! - **Baselines**: atomically swapped `(group, hour)` table and its rebuild
//! - **Correction**: dimming commands toward the baseline (`corrector` module)
//! - **Orchestration**: `Poller::tick`, driven periodically by `runner::run`
//!
//! ## Concurrency
//!
//! Ticks run one at a time on the caller's thread. Sink writes run on
//! short-lived threads per tick. Baseline rebuilds run on their own thread and
//! publish a fresh map; readers never observe a partial rebuild.

pub mod baseline;
pub mod builder;
pub mod config;
mod conversions;
pub mod corrector;
pub mod diff;
pub mod error;
pub mod fanout;
pub mod mocks;
pub mod percentile;
pub mod poller;
pub mod resilience;
pub mod runner;
pub mod scheduler;
pub mod status;
pub mod transport_error;
pub mod util;

pub use baseline::{BaselineCache, BaselineMap, RebuildReport, hour_bucket, rebuild};
pub use builder::{Missing, PollerBuilder, Set};
pub use config::{BaselineCfg, FanoutCfg, PollCfg, ResilienceCfg};
pub use corrector::{Correction, CorrectionReport, correct};
pub use diff::{Observation, changed, classify};
pub use error::{BuildError, CoreError, Report, Result, SinkError, TransportError};
pub use fanout::{FanOutReport, SinkOutcome, SinkReport};
pub use percentile::percentile;
pub use poller::Poller;
pub use resilience::{CircuitState, Escalation, FailureVerdict, ResilienceCounter};
pub use runner::{RunOutcome, RunParams, run};
pub use scheduler::{BaselineScheduler, rebuild_now};
pub use status::{TickOutcome, TickSummary};
