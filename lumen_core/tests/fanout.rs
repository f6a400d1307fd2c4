//! Fan-out keeps sinks independent and bounds the wait.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};
use lumen_core::fanout::{SinkOutcome, persist};
use lumen_core::mocks::{FailingSink, MemorySink, SlowSink};
use lumen_traits::{DeviceId, GroupName, GroupSnapshot, LightControl, LightState, StateSink};

fn kitchen() -> Arc<GroupSnapshot> {
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 14, 0, 0).unwrap();
    let light = LightControl {
        power: true,
        dimmer: 120,
        color: "f1e0b5".into(),
    };
    Arc::new(GroupSnapshot::new(
        GroupName::from("Kitchen"),
        vec![LightState::new(DeviceId(65_537), GroupName::from("Kitchen"), &light, at)],
    ))
}

#[test]
fn slow_sink_does_not_hold_back_the_others() {
    let a = MemorySink::new("sql");
    let b = MemorySink::new("documents");
    let slow = SlowSink::new("archive", Duration::from_millis(600));
    let sinks: Vec<Arc<dyn StateSink>> = vec![
        Arc::new(a.clone()),
        Arc::new(slow.clone()),
        Arc::new(b.clone()),
    ];

    let t0 = Instant::now();
    let report = persist(kitchen(), &sinks, Duration::from_millis(100));
    let waited = t0.elapsed();

    assert!(waited < Duration::from_millis(500), "waited {waited:?}");
    assert_eq!(report.stored(), 2);
    assert_eq!(report.pending(), 1);
    assert_eq!(report.outcome("archive"), Some(&SinkOutcome::Pending));
    assert_eq!(a.batches().len(), 1);
    assert_eq!(b.batches().len(), 1);
    assert_eq!(b.batches()[0].states()[0].dimmer(), 120);

    // The slow write is not cancelled; it lands after the caller moved on.
    let until = Instant::now() + Duration::from_secs(3);
    while slow.completed() == 0 && Instant::now() < until {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(slow.completed(), 1);
}

#[test]
fn all_fast_sinks_return_before_deadline() {
    let sinks: Vec<Arc<dyn StateSink>> = vec![
        Arc::new(MemorySink::new("a")),
        Arc::new(FailingSink::new("b")),
        Arc::new(MemorySink::new("c")),
    ];
    let t0 = Instant::now();
    let report = persist(kitchen(), &sinks, Duration::from_secs(4));
    assert!(t0.elapsed() < Duration::from_secs(1));
    assert_eq!(report.stored(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.pending(), 0);
    let names: Vec<&str> = report.reports.iter().map(|r| r.sink.as_str()).collect();
    assert_eq!(names, ["a", "b", "c"]);
}
