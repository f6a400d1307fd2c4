//! Nudges powered-on lights toward the learned baseline for the current hour.

use lumen_traits::{DeviceId, GroupSnapshot, Transport};

use crate::baseline::BaselineMap;
use crate::error::TransportError;
use crate::transport_error::map_transport_error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correction {
    pub device: DeviceId,
    pub from: u8,
    pub to: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectionReport {
    /// Commands sent, successful or not.
    pub issued: Vec<Correction>,
    pub failed: Vec<(DeviceId, TransportError)>,
}

impl CorrectionReport {
    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}

/// Correct every powered-on light of `snapshot` whose dimmer differs from the
/// baseline at `hour`.
///
/// The snapshot is updated to the target value whether or not the command
/// succeeds; a failed command is logged and the remaining lights are still
/// processed.
pub fn correct<T: Transport + ?Sized>(
    snapshot: &mut GroupSnapshot,
    baselines: &BaselineMap,
    hour: u8,
    transport: &mut T,
) -> CorrectionReport {
    let mut report = CorrectionReport::default();
    let Some(target) = baselines.get(snapshot.group(), hour) else {
        return report;
    };

    for idx in 0..snapshot.len() {
        let state = &snapshot.states()[idx];
        if !state.power() || state.dimmer() == target {
            continue;
        }
        let device = state.device_id();
        let from = state.dimmer();
        match transport.set_dimming(device, target) {
            Ok(()) => {
                tracing::info!(
                    group = %snapshot.group(),
                    device_id = %device,
                    hour,
                    from,
                    to = target,
                    "dimmer corrected to baseline"
                );
            }
            Err(e) => {
                let err = map_transport_error(e.as_ref());
                tracing::error!(
                    group = %snapshot.group(),
                    device_id = %device,
                    to = target,
                    error = %err,
                    "dimming command failed"
                );
                report.failed.push((device, err));
            }
        }
        let corrected = state.with_dimmer(target);
        snapshot.replace(idx, corrected);
        report.issued.push(Correction {
            device,
            from,
            to: target,
        });
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::ScriptedTransport;
    use chrono::{TimeZone, Utc};
    use lumen_traits::{GroupName, LightControl, LightState};

    fn snapshot(lights: &[(u32, bool, u8)]) -> GroupSnapshot {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 14, 5, 0).unwrap();
        let states = lights
            .iter()
            .map(|&(id, power, dimmer)| {
                LightState::new(
                    DeviceId(id),
                    GroupName::from("Kitchen"),
                    &LightControl {
                        power,
                        dimmer,
                        color: "f1e0b5".into(),
                    },
                    at,
                )
            })
            .collect();
        GroupSnapshot::new(GroupName::from("Kitchen"), states)
    }

    fn kitchen_at_14(value: u8) -> BaselineMap {
        let mut m = BaselineMap::new();
        m.insert(GroupName::from("Kitchen"), 14, value);
        m
    }

    #[test]
    fn off_lights_and_matching_lights_are_left_alone() {
        let mut snap = snapshot(&[(1, false, 200), (2, true, 150)]);
        let mut t = ScriptedTransport::new();
        let report = correct(&mut snap, &kitchen_at_14(150), 14, &mut t);
        assert!(report.is_empty());
        assert!(t.commands().is_empty());
        assert_eq!(snap.states()[0].dimmer(), 200);
    }

    #[test]
    fn no_baseline_for_hour_means_no_commands() {
        let mut snap = snapshot(&[(1, true, 200)]);
        let mut t = ScriptedTransport::new();
        let report = correct(&mut snap, &kitchen_at_14(150), 15, &mut t);
        assert!(report.is_empty());
        assert_eq!(snap.states()[0].dimmer(), 200);
    }

    #[test]
    fn failed_command_still_updates_snapshot_and_continues() {
        let mut snap = snapshot(&[(1, true, 200), (2, true, 90)]);
        let mut t = ScriptedTransport::new();
        t.fail_commands(true);
        let report = correct(&mut snap, &kitchen_at_14(150), 14, &mut t);
        assert_eq!(report.issued.len(), 2);
        assert_eq!(report.failed.len(), 2);
        assert!(snap.iter().all(|s| s.dimmer() == 150));
    }

    #[test]
    fn works_through_a_trait_object() {
        let mut snap = snapshot(&[(7, true, 10)]);
        let mut t = ScriptedTransport::new();
        let dyn_t: &mut dyn Transport = &mut t;
        let report = correct(&mut snap, &kitchen_at_14(40), 14, dyn_t);
        assert_eq!(
            report.issued,
            vec![Correction {
                device: DeviceId(7),
                from: 10,
                to: 40
            }]
        );
    }
}
