//! History files that were cut short or edited by hand stay usable.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Duration, TimeZone, Utc};
use lumen_gateway::CsvHistoryStore;
use lumen_traits::{
    DeviceId, GroupName, GroupSnapshot, HistoryStore, LightControl, LightState, StateSink,
};
use rstest::rstest;
use tempfile::tempdir;

fn hall(dimmer: u8, at: DateTime<Utc>) -> GroupSnapshot {
    let light = LightControl {
        power: true,
        dimmer,
        color: "f1e0b5".into(),
    };
    GroupSnapshot::new(
        GroupName::from("Hall"),
        vec![LightState::new(DeviceId(65_537), GroupName::from("Hall"), &light, at)],
    )
}

fn open(dir: &Path) -> CsvHistoryStore {
    CsvHistoryStore::open(dir.join("h.csv"), dir.join("b.csv")).unwrap()
}

#[test]
fn torn_trailing_row_is_skipped_and_next_append_starts_clean() {
    let tmp = tempdir().unwrap();
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    open(tmp.path()).persist(&hall(120, at)).unwrap();

    // A crash mid-write leaves half a row with no newline.
    let mut f = OpenOptions::new()
        .append(true)
        .open(tmp.path().join("h.csv"))
        .unwrap();
    f.write_all(b"2,Hall,tr").unwrap();
    drop(f);

    let store = open(tmp.path());
    let since = at - Duration::hours(1);
    let rows = store.select_historical(since).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].dimmer, 120);

    store.persist(&hall(80, at + Duration::minutes(5))).unwrap();
    let rows = store.select_historical(since).unwrap();
    let ids: Vec<u64> = rows.iter().map(|r| r.event_id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(rows[1].dimmer, 80);
}

#[rstest]
#[case("event_id,group_name,power,dimmer,color,observed_at\n1,Hall,true,loud,f1e0b5,2024-06-01T09:00:00Z\n")]
#[case("event_id,group_name,power,dimmer,color,observed_at\n1,Hall,true,120,f1e0b5\n")]
#[case("event_id,group_name,power,dimmer,color,observed_at\n1,Hall,true,120,f1e0b5,yesterday\n")]
fn unreadable_rows_do_not_hide_the_rest(#[case] head: &str) {
    let tmp = tempdir().unwrap();
    let good = "7,Hall,true,60,f1e0b5,2024-06-01T10:00:00Z\n";
    fs::write(tmp.path().join("h.csv"), format!("{head}{good}")).unwrap();

    let store = open(tmp.path());
    let rows = store
        .select_historical(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_id, 7);

    // Ids continue after the highest readable one.
    store
        .persist(&hall(90, Utc.with_ymd_and_hms(2024, 6, 1, 11, 0, 0).unwrap()))
        .unwrap();
    let last = store
        .select_historical(Utc.with_ymd_and_hms(2024, 6, 1, 10, 30, 0).unwrap())
        .unwrap();
    assert_eq!(last[0].event_id, 8);
}

#[test]
fn bad_baseline_row_is_skipped() {
    let tmp = tempdir().unwrap();
    fs::write(
        tmp.path().join("b.csv"),
        "group,hour,value\nKitchen,noon,150\nHall,9,40\n",
    )
    .unwrap();

    let rows = open(tmp.path()).load_baselines().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].group.as_str(), "Hall");
    assert_eq!(rows[0].value, 40);
}

#[test]
fn failed_append_does_not_consume_an_event_id() {
    let tmp = tempdir().unwrap();
    let store = open(tmp.path());
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();

    // A directory where the history file belongs makes the write fail.
    fs::create_dir(tmp.path().join("h.csv")).unwrap();
    assert!(store.persist(&hall(120, at)).is_err());
    fs::remove_dir(tmp.path().join("h.csv")).unwrap();

    store.persist(&hall(120, at)).unwrap();
    let rows = store.select_historical(at - Duration::hours(1)).unwrap();
    let ids: Vec<u64> = rows.iter().map(|r| r.event_id).collect();
    assert_eq!(ids, vec![1]);
}
