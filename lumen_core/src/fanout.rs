//! Concurrent persistence of one snapshot to every configured sink.
//!
//! Each sink write runs on its own thread and reports back through a bounded
//! channel. The caller waits until every sink has answered or the deadline
//! passes, whichever comes first. Threads still writing at the deadline are
//! left to finish on their own; their result is simply not observed.
use crossbeam_channel as xch;
use lumen_traits::{GroupSnapshot, StateSink};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::SinkError;
use crate::transport_error::map_sink_error;

/// What the fan-out observed for one sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    Stored { elapsed: Duration },
    Failed(SinkError),
    /// No answer before the deadline (still writing, or the thread died).
    Pending,
}

#[derive(Debug, Clone)]
pub struct SinkReport {
    pub sink: String,
    pub outcome: SinkOutcome,
}

#[derive(Debug, Clone)]
pub struct FanOutReport {
    /// One entry per sink, in the order the sinks were given.
    pub reports: Vec<SinkReport>,
    /// How long the caller actually waited.
    pub waited: Duration,
}

impl FanOutReport {
    pub fn stored(&self) -> usize {
        self.count(|o| matches!(o, SinkOutcome::Stored { .. }))
    }
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SinkOutcome::Failed(_)))
    }
    pub fn pending(&self) -> usize {
        self.count(|o| matches!(o, SinkOutcome::Pending))
    }
    pub fn outcome(&self, sink: &str) -> Option<&SinkOutcome> {
        self.reports
            .iter()
            .find(|r| r.sink == sink)
            .map(|r| &r.outcome)
    }

    fn count(&self, pred: impl Fn(&SinkOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Write `snapshot` to all `sinks` concurrently, waiting at most `deadline`.
pub fn persist(
    snapshot: Arc<GroupSnapshot>,
    sinks: &[Arc<dyn StateSink>],
    deadline: Duration,
) -> FanOutReport {
    let started = Instant::now();
    let deadline_at = started + deadline;
    let (tx, rx) = xch::bounded::<(usize, SinkOutcome)>(sinks.len().max(1));

    let mut reports: Vec<SinkReport> = sinks
        .iter()
        .map(|s| SinkReport {
            sink: s.name().to_string(),
            outcome: SinkOutcome::Pending,
        })
        .collect();

    let mut in_flight = 0usize;
    for (idx, sink) in sinks.iter().enumerate() {
        let sink = Arc::clone(sink);
        let snap = Arc::clone(&snapshot);
        let tx = tx.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("sink-{}", sink.name()))
            .spawn(move || {
                let t0 = Instant::now();
                let outcome = match sink.persist(&snap) {
                    Ok(()) => {
                        let elapsed = t0.elapsed();
                        tracing::info!(
                            sink = sink.name(),
                            group = %snap.group(),
                            elapsed_ms = elapsed.as_millis() as u64,
                            "snapshot persisted"
                        );
                        SinkOutcome::Stored { elapsed }
                    }
                    Err(e) => {
                        let err = map_sink_error(sink.name(), e.as_ref());
                        tracing::error!(
                            sink = sink.name(),
                            group = %snap.group(),
                            elapsed_ms = t0.elapsed().as_millis() as u64,
                            error = %err,
                            "snapshot write failed"
                        );
                        SinkOutcome::Failed(err)
                    }
                };
                // Receiver is gone once the deadline passed; the write itself stands.
                let _ = tx.send((idx, outcome));
            });
        match spawned {
            Ok(_detached) => in_flight += 1,
            Err(e) => {
                tracing::error!(sink = %reports[idx].sink, error = %e, "could not spawn sink writer");
                reports[idx].outcome = SinkOutcome::Failed(SinkError {
                    sink: reports[idx].sink.clone(),
                    message: format!("spawn failed: {e}"),
                });
            }
        }
    }
    drop(tx);

    while in_flight > 0 {
        match rx.recv_deadline(deadline_at) {
            Ok((idx, outcome)) => {
                if let Some(r) = reports.get_mut(idx) {
                    r.outcome = outcome;
                }
                in_flight -= 1;
            }
            Err(xch::RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    group = %snapshot.group(),
                    pending = in_flight,
                    deadline_ms = deadline.as_millis() as u64,
                    "fan-out deadline elapsed; continuing without waiting"
                );
                break;
            }
            // Every remaining writer dropped its sender without answering (panic).
            Err(xch::RecvTimeoutError::Disconnected) => break,
        }
    }

    FanOutReport {
        reports,
        waited: started.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{FailingSink, MemorySink, SlowSink};
    use lumen_traits::GroupName;

    fn empty_snapshot() -> Arc<GroupSnapshot> {
        Arc::new(GroupSnapshot::new(GroupName::from("Hall"), Vec::new()))
    }

    #[test]
    fn no_sinks_returns_immediately() {
        let report = persist(empty_snapshot(), &[], Duration::from_secs(4));
        assert!(report.reports.is_empty());
        assert!(report.waited < Duration::from_millis(100));
    }

    #[test]
    fn failure_does_not_hide_sibling_success() {
        let ok = MemorySink::new("memory");
        let sinks: Vec<Arc<dyn StateSink>> =
            vec![Arc::new(FailingSink::new("broken")), Arc::new(ok.clone())];
        let report = persist(empty_snapshot(), &sinks, Duration::from_secs(2));
        assert_eq!(report.stored(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(ok.batches().len(), 1);
        match report.outcome("broken") {
            Some(SinkOutcome::Failed(e)) => assert_eq!(e.sink, "broken"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn slow_sink_is_reported_pending() {
        let sinks: Vec<Arc<dyn StateSink>> = vec![Arc::new(SlowSink::new(
            "slow",
            Duration::from_millis(300),
        ))];
        let report = persist(empty_snapshot(), &sinks, Duration::from_millis(20));
        assert_eq!(report.pending(), 1);
        assert!(report.waited < Duration::from_millis(250));
    }
}
