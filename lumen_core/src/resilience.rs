//! Consecutive-failure counting and the one-shot escalation policy.
//!
//! `ResilienceCounter` is the pure state machine (Normal -> Escalated).
//! `Escalation` pairs it with a notifier so the single alert is sent exactly
//! when the threshold is first reached. Neither exits the process; the driver
//! observes the terminal state and stops.

use std::sync::Arc;

use lumen_traits::Notifier;

use crate::error::TransportError;

/// Alert title used for the escalation notification.
pub const ALERT_TITLE: &str = "Lumen gateway poller stopped";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Normal,
    /// Terminal for the lifetime of the counter.
    Escalated,
}

/// Result of recording one transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureVerdict {
    /// Below threshold; retry on the next tick.
    Recoverable { failures: u32 },
    /// This failure reached the threshold. Reported once per counter.
    Escalate { failures: u32 },
    /// Already escalated earlier; nothing new to do.
    AlreadyEscalated { failures: u32 },
}

#[derive(Debug, Clone)]
pub struct ResilienceCounter {
    threshold: u32,
    failures: u32,
    state: CircuitState,
}

impl ResilienceCounter {
    /// `threshold` is clamped to at least 1.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            failures: 0,
            state: CircuitState::Normal,
        }
    }

    pub fn record_success(&mut self) {
        if self.state == CircuitState::Normal {
            self.failures = 0;
        }
    }

    pub fn record_failure(&mut self) -> FailureVerdict {
        self.failures = self.failures.saturating_add(1);
        match self.state {
            CircuitState::Escalated => FailureVerdict::AlreadyEscalated {
                failures: self.failures,
            },
            CircuitState::Normal if self.failures >= self.threshold => {
                self.state = CircuitState::Escalated;
                FailureVerdict::Escalate {
                    failures: self.failures,
                }
            }
            CircuitState::Normal => FailureVerdict::Recoverable {
                failures: self.failures,
            },
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
    pub fn state(&self) -> CircuitState {
        self.state
    }
    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

/// Formats the escalation alert body.
pub fn alert_body(failures: u32, error: &TransportError) -> String {
    format!("Failed to call gateway, stopping application. Retried {failures} times. Error [{error}]")
}

/// Counter plus notifier: the transport-calling path reports every outcome here.
pub struct Escalation {
    counter: ResilienceCounter,
    notifier: Arc<dyn Notifier>,
}

impl core::fmt::Debug for Escalation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Escalation")
            .field("counter", &self.counter)
            .finish_non_exhaustive()
    }
}

impl Escalation {
    pub fn new(threshold: u32, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            counter: ResilienceCounter::new(threshold),
            notifier,
        }
    }

    pub fn on_success(&mut self) {
        if self.counter.failures() > 0 && self.counter.state() == CircuitState::Normal {
            tracing::info!(
                failures = self.counter.failures(),
                "gateway reachable again; failure streak reset"
            );
        }
        self.counter.record_success();
    }

    /// Count a failure; on the transition to Escalated send the one alert.
    pub fn on_failure(&mut self, error: &TransportError) -> FailureVerdict {
        let verdict = self.counter.record_failure();
        match verdict {
            FailureVerdict::Recoverable { failures } => {
                tracing::warn!(
                    failures,
                    threshold = self.counter.threshold(),
                    error = %error,
                    "gateway call failed; retrying next tick"
                );
            }
            FailureVerdict::Escalate { failures } => {
                let body = alert_body(failures, error);
                tracing::error!(failures, error = %error, "{body}");
                self.notifier.send(ALERT_TITLE, &body);
            }
            FailureVerdict::AlreadyEscalated { failures } => {
                tracing::debug!(failures, "failure after escalation ignored");
            }
        }
        verdict
    }

    pub fn counter(&self) -> &ResilienceCounter {
        &self.counter
    }

    pub fn is_escalated(&self) -> bool {
        self.counter.state() == CircuitState::Escalated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::SpyNotifier;

    #[test]
    fn four_failures_then_success_resets() {
        let mut c = ResilienceCounter::new(5);
        for i in 1..=4 {
            assert_eq!(c.record_failure(), FailureVerdict::Recoverable { failures: i });
        }
        c.record_success();
        assert_eq!(c.failures(), 0);
        assert_eq!(c.state(), CircuitState::Normal);
        assert_eq!(c.record_failure(), FailureVerdict::Recoverable { failures: 1 });
    }

    #[test]
    fn threshold_reached_escalates_once() {
        let mut c = ResilienceCounter::new(3);
        c.record_failure();
        c.record_failure();
        assert_eq!(c.record_failure(), FailureVerdict::Escalate { failures: 3 });
        assert_eq!(c.record_failure(), FailureVerdict::AlreadyEscalated { failures: 4 });
        c.record_success();
        assert_eq!(c.state(), CircuitState::Escalated);
        assert_eq!(c.failures(), 4);
    }

    #[test]
    fn zero_threshold_is_clamped() {
        let mut c = ResilienceCounter::new(0);
        assert_eq!(c.threshold(), 1);
        assert_eq!(c.record_failure(), FailureVerdict::Escalate { failures: 1 });
    }

    #[test]
    fn escalation_sends_exactly_one_alert() {
        let spy = SpyNotifier::new();
        let mut esc = Escalation::new(2, Arc::new(spy.clone()));
        let err = TransportError::Timeout;
        esc.on_failure(&err);
        assert!(spy.sent().is_empty());
        esc.on_failure(&err);
        esc.on_failure(&err);
        let sent = spy.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ALERT_TITLE);
        assert_eq!(
            sent[0].1,
            "Failed to call gateway, stopping application. Retried 2 times. Error [gateway timed out]"
        );
        assert!(esc.is_escalated());
    }
}
