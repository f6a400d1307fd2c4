//! Background baseline rebuilds on their own low-frequency timeline.
//!
//! Spawns one thread that rebuilds once immediately, then once per interval,
//! publishing each result into the shared `BaselineCache`. The thread is shut
//! down and joined when the `BaselineScheduler` is dropped.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use lumen_traits::{Clock, HistoryStore};

use crate::baseline::{BaselineCache, RebuildReport, rebuild};
use crate::config::BaselineCfg;
use crate::error::CoreError;
use crate::util::sleep_unless_stopped;

/// One rebuild over the configured lookback window ending at `now`.
pub fn rebuild_now(
    store: &dyn HistoryStore,
    cache: &BaselineCache,
    cfg: &BaselineCfg,
    now: DateTime<Utc>,
) -> Result<RebuildReport, CoreError> {
    rebuild(store, now - cfg.lookback(), cfg.percentile, cache)
}

pub struct BaselineScheduler {
    /// Shutdown flag checked between sleep slices
    shutdown: Arc<AtomicBool>,
    runs: Arc<AtomicU64>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl BaselineScheduler {
    pub fn spawn(
        store: Arc<dyn HistoryStore>,
        cache: Arc<BaselineCache>,
        cfg: BaselineCfg,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> std::io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let runs = Arc::new(AtomicU64::new(0));
        let runs_clone = runs.clone();

        let join_handle = std::thread::Builder::new()
            .name("baseline-rebuild".into())
            .spawn(move || {
                // The first rebuild runs even if shutdown is already requested.
                loop {
                    match rebuild_now(store.as_ref(), &cache, &cfg, clock.utc_now()) {
                        Ok(_) => {
                            runs_clone.fetch_add(1, Ordering::Relaxed);
                        }
                        // Keep serving the previous map; try again next interval.
                        Err(e) => tracing::error!(error = %e, "baseline rebuild failed"),
                    }
                    if !sleep_unless_stopped(clock.as_ref(), cfg.rebuild_interval, &shutdown_clone)
                    {
                        tracing::debug!("baseline scheduler received shutdown signal");
                        break;
                    }
                }
                tracing::trace!("baseline scheduler exiting cleanly");
            })?;

        Ok(Self {
            shutdown,
            runs,
            join_handle: Some(join_handle),
        })
    }

    /// Rebuilds that completed successfully so far.
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }
}

impl Drop for BaselineScheduler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // The thread exits after the current sleep slice, or after an in-progress rebuild.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("baseline scheduler joined"),
                Err(e) => tracing::warn!(?e, "baseline scheduler panicked during shutdown"),
            }
        }
    }
}
