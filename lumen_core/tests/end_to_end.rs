//! Real fixture gateway and CSV store behind the poller.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use lumen_core::mocks::SpyNotifier;
use lumen_core::{BaselineCache, Poller, TickOutcome};
use lumen_gateway::{CsvHistoryStore, FixtureGateway};
use lumen_traits::{BaselineEntry, DeviceId, GroupName, HistoryStore, ManualClock, StateSink};
use tempfile::tempdir;

fn write_bulb(dir: &Path, dimmer: u8) {
    fs::write(
        dir.join("device_65537.json"),
        format!(r#"{{"9001":"Bulb","9003":65537,"3311":[{{"5850":1,"5851":{dimmer},"5706":"f1e0b5"}}]}}"#),
    )
    .unwrap();
}

fn write_scene(dir: &Path) {
    fs::write(dir.join("groups.json"), "[131073]").unwrap();
    fs::write(
        dir.join("group_131073.json"),
        r#"{"9001":"Kitchen","9003":131073,"9018":{"15002":{"9003":[65537,65540]}}}"#,
    )
    .unwrap();
    fs::write(dir.join("device_65540.json"), r#"{"9001":"Remote","9003":65540}"#).unwrap();
    write_bulb(dir, 200);
}

fn completed(outcome: TickOutcome) -> lumen_core::TickSummary {
    match outcome {
        TickOutcome::Completed(s) => s,
        other => panic!("expected a completed tick, got {other:?}"),
    }
}

#[test]
fn changed_kitchen_is_dimmed_to_baseline_and_recorded_once() {
    let tmp = tempdir().unwrap();
    let gw_dir = tmp.path().join("gateway");
    fs::create_dir_all(&gw_dir).unwrap();
    write_scene(&gw_dir);

    let store = Arc::new(
        CsvHistoryStore::open(tmp.path().join("history.csv"), tmp.path().join("baselines.csv"))
            .unwrap(),
    );
    store
        .upsert_baseline(&BaselineEntry {
            group: GroupName::from("Kitchen"),
            hour: 14,
            value: 150,
        })
        .unwrap();
    let cache = Arc::new(BaselineCache::load(store.as_ref()).unwrap());

    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 14, 5, 0).unwrap());
    let sink: Arc<dyn StateSink> = store.clone();
    let mut poller = Poller::builder()
        .with_transport(FixtureGateway::new(&gw_dir))
        .with_notifier(Arc::new(SpyNotifier::new()))
        .with_sink(sink)
        .with_baselines(cache)
        .with_clock(Arc::new(clock))
        .build()
        .unwrap();

    let first = completed(poller.tick());
    assert_eq!(first.first_seen, 1);

    // Someone turns the kitchen up.
    write_bulb(&gw_dir, 220);
    let second = completed(poller.tick());
    assert_eq!(second.changed, 1);
    assert_eq!(second.corrections, 1);

    let bulb = FixtureGateway::new(&gw_dir)
        .read_device(DeviceId(65_537))
        .unwrap();
    assert_eq!(bulb.light.unwrap().dimmer, 150);

    // The gateway now reports the corrected value, which matches what was recorded.
    let third = completed(poller.tick());
    assert_eq!(third.unchanged, 1);

    let rows = store
        .select_historical(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].dimmer, 150);
    assert_eq!(rows[0].group_name.as_str(), "Kitchen");
}
