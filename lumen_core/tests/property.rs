use chrono::{TimeZone, Utc};
use lumen_core::{changed, percentile};
use lumen_traits::{DeviceId, GroupName, GroupSnapshot, LightControl, LightState};
use proptest::prelude::*;

fn snapshot(values: &[(bool, u8)]) -> GroupSnapshot {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let states = values
        .iter()
        .enumerate()
        .map(|(i, &(power, dimmer))| {
            LightState::new(
                DeviceId(i as u32),
                GroupName::from("Hall"),
                &LightControl {
                    power,
                    dimmer,
                    color: "f1e0b5".into(),
                },
                at,
            )
        })
        .collect();
    GroupSnapshot::new(GroupName::from("Hall"), states)
}

proptest! {
    #[test]
    fn percentile_stays_within_sample_bounds(
        values in prop::collection::vec(0i64..=255, 1..200),
        p in 0.5f64..99.5,
    ) {
        let v = percentile(&values, p).unwrap();
        let min = *values.iter().min().unwrap();
        let max = *values.iter().max().unwrap();
        prop_assert!(v >= min && v <= max);
    }

    #[test]
    fn percentile_is_monotonic_in_p(
        values in prop::collection::vec(0i64..=255, 1..100),
        a in 1.0f64..98.0,
        delta in 0.0f64..1.0,
    ) {
        let lo = percentile(&values, a).unwrap();
        let hi = percentile(&values, a + delta).unwrap();
        prop_assert!(lo <= hi);
    }

    #[test]
    fn snapshot_never_differs_from_itself(
        values in prop::collection::vec((any::<bool>(), any::<u8>()), 0..16),
    ) {
        let a = snapshot(&values);
        let b = snapshot(&values);
        prop_assert!(!changed(&a, &b));
    }

    #[test]
    fn any_dimmer_edit_is_a_change(
        values in prop::collection::vec((any::<bool>(), any::<u8>()), 1..16),
        idx in any::<prop::sample::Index>(),
    ) {
        let i = idx.index(values.len());
        let mut edited = values.clone();
        edited[i].1 = edited[i].1.wrapping_add(1);
        prop_assert!(changed(&snapshot(&values), &snapshot(&edited)));
    }
}
