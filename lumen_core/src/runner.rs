//! The periodic driver: one tick at a time, never overlapping, until stopped,
//! out of ticks, or escalated.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lumen_traits::HistoryStore;

use crate::config::{BaselineCfg, PollCfg};
use crate::error::{CoreError, Result};
use crate::poller::Poller;
use crate::scheduler::BaselineScheduler;
use crate::status::TickOutcome;
use crate::util::{millis, sleep_unless_stopped};

#[derive(Debug, Clone, Default)]
pub struct RunParams {
    pub poll: PollCfg,
    pub baseline: BaselineCfg,
    /// Stop after this many ticks; `None` runs until stopped.
    pub max_ticks: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The shutdown flag was set.
    Stopped { ticks: u64 },
    TicksExhausted { ticks: u64 },
}

/// Drive `poller` until `shutdown` is set or `max_ticks` is reached.
///
/// When `history` is given and baselines are enabled, a `BaselineScheduler`
/// rebuilds the poller's baseline cache in the background for the duration of
/// the run. Escalation ends the run with `CoreError::Escalated`.
pub fn run(
    poller: &mut Poller,
    params: RunParams,
    history: Option<Arc<dyn HistoryStore>>,
    shutdown: Arc<AtomicBool>,
) -> Result<RunOutcome> {
    let clock = poller.clock();
    let _scheduler = match history {
        Some(store) if params.baseline.enabled => Some(BaselineScheduler::spawn(
            store,
            poller.baselines(),
            params.baseline.clone(),
            clock.clone(),
        )?),
        _ => None,
    };

    tracing::info!(
        interval_ms = millis(params.poll.interval),
        max_ticks = ?params.max_ticks,
        "poll loop started"
    );

    let mut ticks: u64 = 0;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!(ticks, "poll loop stopped");
            return Ok(RunOutcome::Stopped { ticks });
        }

        let started = clock.now();
        let outcome = poller.tick();
        ticks += 1;
        match outcome {
            TickOutcome::Completed(summary) => {
                tracing::trace!(ticks, ?summary, "tick");
            }
            TickOutcome::TransportFailed { failures, .. } => {
                tracing::debug!(ticks, failures, "tick aborted by transport error");
            }
            TickOutcome::Escalated {
                failures,
                last_error,
            } => {
                return Err(eyre::Report::new(CoreError::Escalated {
                    failures,
                    last_error,
                }));
            }
        }

        if params.max_ticks.is_some_and(|max| ticks >= max) {
            tracing::info!(ticks, "tick budget exhausted");
            return Ok(RunOutcome::TicksExhausted { ticks });
        }

        // A slow tick shortens the wait; it never causes a catch-up burst.
        let elapsed = clock.now().saturating_duration_since(started);
        let wait = params.poll.interval.saturating_sub(elapsed);
        if !sleep_unless_stopped(clock.as_ref(), wait, &shutdown) {
            tracing::info!(ticks, "poll loop stopped");
            return Ok(RunOutcome::Stopped { ticks });
        }
    }
}
