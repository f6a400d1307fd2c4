//! The poll orchestrator: one tick enumerates every group, diffs it against
//! the last known snapshot, corrects and persists changes.

use std::collections::HashMap;
use std::sync::Arc;

use lumen_traits::{Clock, GroupId, GroupName, GroupSnapshot, LightState, StateSink, Transport};

use crate::baseline::{BaselineCache, hour_bucket};
use crate::builder::{Missing, PollerBuilder};
use crate::config::FanoutCfg;
use crate::corrector::correct;
use crate::diff::{Observation, classify};
use crate::error::TransportError;
use crate::fanout;
use crate::resilience::{Escalation, FailureVerdict};
use crate::status::{TickOutcome, TickSummary};
use crate::transport_error::map_transport_error;

pub struct Poller {
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) sinks: Vec<Arc<dyn StateSink>>,
    pub(crate) baselines: Arc<BaselineCache>,
    pub(crate) escalation: Escalation,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) fanout: FanoutCfg,
    pub(crate) last_known: HashMap<GroupName, GroupSnapshot>,
    pub(crate) last_error: Option<TransportError>,
}

impl core::fmt::Debug for Poller {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Poller")
            .field("sinks", &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("groups_known", &self.last_known.len())
            .field("escalation", &self.escalation)
            .field("fanout", &self.fanout)
            .finish_non_exhaustive()
    }
}

impl Poller {
    /// Start building a Poller.
    pub fn builder() -> PollerBuilder<Missing, Missing> {
        PollerBuilder::default()
    }

    /// Last snapshot recorded for `group`, if it has been seen.
    ///
    /// Unchanged polls do not replace the entry, so its `observed_at`
    /// timestamps are those of the first sighting or the last change.
    pub fn last_known(&self, group: &GroupName) -> Option<&GroupSnapshot> {
        self.last_known.get(group)
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        Arc::clone(&self.clock)
    }

    pub fn baselines(&self) -> Arc<BaselineCache> {
        Arc::clone(&self.baselines)
    }

    pub fn escalation(&self) -> &Escalation {
        &self.escalation
    }

    /// Run one poll cycle.
    ///
    /// A transport error aborts the remaining groups of this tick. Groups
    /// processed before the error keep their effects.
    pub fn tick(&mut self) -> TickOutcome {
        if self.escalation.is_escalated() {
            if let Some(last_error) = self.last_error.clone() {
                return TickOutcome::Escalated {
                    failures: self.escalation.counter().failures(),
                    last_error,
                };
            }
        }

        let ids = match self.transport.list_group_ids() {
            Ok(ids) => ids,
            Err(e) => {
                let err = map_transport_error(e.as_ref());
                tracing::error!(error = %err, "failed to list groups");
                return self.transport_failed(err);
            }
        };

        let mut summary = TickSummary::default();
        for id in ids {
            let snapshot = match self.fetch_snapshot(id) {
                Ok(s) => s,
                Err(err) => {
                    tracing::error!(group_id = %id, error = %err, "failed to read group");
                    return self.transport_failed(err);
                }
            };
            summary.groups += 1;
            self.observe(snapshot, &mut summary);
        }

        self.escalation.on_success();
        tracing::debug!(
            groups = summary.groups,
            changed = summary.changed,
            corrections = summary.corrections,
            "tick complete"
        );
        TickOutcome::Completed(summary)
    }

    fn fetch_snapshot(&mut self, id: GroupId) -> Result<GroupSnapshot, TransportError> {
        let group = self
            .transport
            .group(id)
            .map_err(|e| map_transport_error(e.as_ref()))?;
        let observed_at = self.clock.utc_now();
        let mut states = Vec::with_capacity(group.device_ids.len());
        for dev in &group.device_ids {
            let device = self
                .transport
                .device(*dev)
                .map_err(|e| map_transport_error(e.as_ref()))?;
            // Remotes, plugs and similar have no light control.
            if let Some(light) = device.light.as_ref() {
                states.push(LightState::new(
                    device.id,
                    group.name.clone(),
                    light,
                    observed_at,
                ));
            }
        }
        Ok(GroupSnapshot::new(group.name, states))
    }

    fn observe(&mut self, mut snapshot: GroupSnapshot, summary: &mut TickSummary) {
        let group = snapshot.group().clone();
        match classify(self.last_known.get(&group), &snapshot) {
            Observation::First => {
                summary.first_seen += 1;
                tracing::info!(group = %group, lights = snapshot.len(), "group observed");
                self.last_known.insert(group, snapshot);
            }
            Observation::Unchanged => {
                summary.unchanged += 1;
            }
            Observation::Changed => {
                summary.changed += 1;
                tracing::info!(group = %group, lights = snapshot.len(), "light state changed");

                let hour = hour_bucket(self.clock.utc_now());
                let map = self.baselines.snapshot();
                let corrections = correct(&mut snapshot, &map, hour, self.transport.as_mut());
                summary.corrections += corrections.issued.len();

                let shared = Arc::new(snapshot);
                let report = fanout::persist(Arc::clone(&shared), &self.sinks, self.fanout.deadline);
                summary.sink_failures += report.failed();
                summary.sink_pending += report.pending();

                // Last observed wins, regardless of how the sinks fared.
                let snapshot = Arc::try_unwrap(shared).unwrap_or_else(|arc| (*arc).clone());
                self.last_known.insert(group, snapshot);
            }
        }
    }

    fn transport_failed(&mut self, error: TransportError) -> TickOutcome {
        self.last_error = Some(error.clone());
        match self.escalation.on_failure(&error) {
            FailureVerdict::Recoverable { failures } => {
                TickOutcome::TransportFailed { error, failures }
            }
            FailureVerdict::Escalate { failures }
            | FailureVerdict::AlreadyEscalated { failures } => TickOutcome::Escalated {
                failures,
                last_error: error,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MemorySink, ScriptedTransport, SpyNotifier};
    use chrono::{TimeZone, Utc};
    use lumen_traits::ManualClock;

    fn poller(t: &ScriptedTransport, sink: &MemorySink) -> Poller {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
        Poller::builder()
            .with_transport(t.clone())
            .with_notifier(Arc::new(SpyNotifier::new()))
            .with_sink(Arc::new(sink.clone()))
            .with_clock(Arc::new(clock))
            .build()
            .unwrap()
    }

    #[test]
    fn first_observation_is_recorded_not_persisted() {
        let t = ScriptedTransport::new();
        t.add_group(131_073, "Hall", &[(65_537, true, 120)]);
        let sink = MemorySink::new("memory");
        let mut p = poller(&t, &sink);

        let TickOutcome::Completed(s) = p.tick() else {
            panic!("expected completed tick");
        };
        assert_eq!(s.first_seen, 1);
        assert!(sink.batches().is_empty());
        assert!(p.last_known(&GroupName::from("Hall")).is_some());
    }

    #[test]
    fn unchanged_group_is_not_persisted() {
        let t = ScriptedTransport::new();
        t.add_group(1, "Hall", &[(10, true, 120)]);
        let sink = MemorySink::new("memory");
        let mut p = poller(&t, &sink);
        p.tick();
        let TickOutcome::Completed(s) = p.tick() else {
            panic!("expected completed tick");
        };
        assert_eq!(s.unchanged, 1);
        assert!(sink.batches().is_empty());
    }

    #[test]
    fn non_light_devices_are_skipped() {
        let t = ScriptedTransport::new();
        t.add_group(1, "Hall", &[(10, true, 120)]);
        t.add_non_light(1, 11);
        let sink = MemorySink::new("memory");
        let mut p = poller(&t, &sink);
        p.tick();
        assert_eq!(p.last_known(&GroupName::from("Hall")).map(GroupSnapshot::len), Some(1));
    }
}
