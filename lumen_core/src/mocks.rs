//! Test and helper mocks for lumen_core.
//!
//! All mocks are cheap to clone; clones share state, so a test can hand one
//! copy to the poller and inspect or script the other.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use lumen_traits::{
    BaselineEntry, BoxError, Device, DeviceId, Group, GroupId, GroupName, GroupSnapshot,
    HistoricalRecord, HistoryStore, LightControl, Notifier, StateSink, Transport,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct Scene {
    groups: Vec<Group>,
    devices: HashMap<DeviceId, Device>,
    offline: bool,
    fail_next: u32,
    fail_commands: bool,
    commands: Vec<(DeviceId, u8)>,
    requests: u64,
}

/// In-memory gateway whose behaviour tests script as they go.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    scene: Arc<Mutex<Scene>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group of lights given as `(device_id, power, dimmer)`.
    pub fn add_group(&self, id: u32, name: &str, lights: &[(u32, bool, u8)]) {
        let mut scene = lock(&self.scene);
        let mut device_ids = Vec::with_capacity(lights.len());
        for &(dev, power, dimmer) in lights {
            device_ids.push(DeviceId(dev));
            scene.devices.insert(
                DeviceId(dev),
                Device {
                    id: DeviceId(dev),
                    name: format!("light-{dev}"),
                    light: Some(LightControl {
                        power,
                        dimmer,
                        color: "f1e0b5".into(),
                    }),
                },
            );
        }
        scene.groups.push(Group {
            id: GroupId(id),
            name: GroupName::from(name),
            device_ids,
        });
    }

    /// Add a device without light control (e.g. a remote) to an existing group.
    pub fn add_non_light(&self, group: u32, dev: u32) {
        let mut scene = lock(&self.scene);
        scene.devices.insert(
            DeviceId(dev),
            Device {
                id: DeviceId(dev),
                name: format!("remote-{dev}"),
                light: None,
            },
        );
        if let Some(g) = scene.groups.iter_mut().find(|g| g.id == GroupId(group)) {
            g.device_ids.push(DeviceId(dev));
        }
    }

    pub fn set_light(&self, dev: u32, power: bool, dimmer: u8) {
        let mut scene = lock(&self.scene);
        if let Some(light) = scene
            .devices
            .get_mut(&DeviceId(dev))
            .and_then(|d| d.light.as_mut())
        {
            light.power = power;
            light.dimmer = dimmer;
        }
    }

    /// While offline every request fails with a timeout.
    pub fn set_offline(&self, offline: bool) {
        lock(&self.scene).offline = offline;
    }

    /// Fail the next `n` requests, then recover.
    pub fn fail_next_requests(&self, n: u32) {
        lock(&self.scene).fail_next = n;
    }

    pub fn fail_commands(&self, fail: bool) {
        lock(&self.scene).fail_commands = fail;
    }

    /// Dimming commands received so far, in order.
    pub fn commands(&self) -> Vec<(DeviceId, u8)> {
        lock(&self.scene).commands.clone()
    }

    pub fn requests(&self) -> u64 {
        lock(&self.scene).requests
    }

    fn begin_request(&self) -> Result<MutexGuard<'_, Scene>, BoxError> {
        let mut scene = lock(&self.scene);
        scene.requests += 1;
        if scene.offline {
            return Err("gateway request timed out".into());
        }
        if scene.fail_next > 0 {
            scene.fail_next -= 1;
            return Err("gateway request timed out".into());
        }
        Ok(scene)
    }
}

impl Transport for ScriptedTransport {
    fn list_group_ids(&mut self) -> Result<Vec<GroupId>, BoxError> {
        let scene = self.begin_request()?;
        Ok(scene.groups.iter().map(|g| g.id).collect())
    }

    fn group(&mut self, id: GroupId) -> Result<Group, BoxError> {
        let scene = self.begin_request()?;
        scene
            .groups
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .ok_or_else(|| format!("group {id} not found").into())
    }

    fn device(&mut self, id: DeviceId) -> Result<Device, BoxError> {
        let scene = self.begin_request()?;
        scene
            .devices
            .get(&id)
            .cloned()
            .ok_or_else(|| format!("device {id} not found").into())
    }

    fn set_dimming(&mut self, device: DeviceId, value: u8) -> Result<(), BoxError> {
        let mut scene = lock(&self.scene);
        scene.commands.push((device, value));
        if scene.fail_commands {
            return Err("dimming command rejected".into());
        }
        if let Some(light) = scene.devices.get_mut(&device).and_then(|d| d.light.as_mut()) {
            light.dimmer = value;
        }
        Ok(())
    }
}

/// Sink that keeps every snapshot it receives.
#[derive(Debug, Clone)]
pub struct MemorySink {
    name: String,
    batches: Arc<Mutex<Vec<GroupSnapshot>>>,
}

impl MemorySink {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            batches: Arc::default(),
        }
    }

    pub fn batches(&self) -> Vec<GroupSnapshot> {
        lock(&self.batches).clone()
    }
}

impl StateSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }
    fn persist(&self, batch: &GroupSnapshot) -> Result<(), BoxError> {
        lock(&self.batches).push(batch.clone());
        Ok(())
    }
}

/// Sink that takes `delay` (real time) before succeeding.
#[derive(Debug, Clone)]
pub struct SlowSink {
    name: String,
    delay: Duration,
    completed: Arc<AtomicUsize>,
}

impl SlowSink {
    pub fn new(name: &str, delay: Duration) -> Self {
        Self {
            name: name.to_string(),
            delay,
            completed: Arc::default(),
        }
    }

    /// Writes that have finished, including ones the caller stopped waiting for.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl StateSink for SlowSink {
    fn name(&self) -> &str {
        &self.name
    }
    fn persist(&self, _batch: &GroupSnapshot) -> Result<(), BoxError> {
        std::thread::sleep(self.delay);
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Sink whose every write fails.
#[derive(Debug, Clone)]
pub struct FailingSink {
    name: String,
}

impl FailingSink {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl StateSink for FailingSink {
    fn name(&self) -> &str {
        &self.name
    }
    fn persist(&self, _batch: &GroupSnapshot) -> Result<(), BoxError> {
        Err(std::io::Error::other("storage unavailable").into())
    }
}

/// In-memory history: a sink for snapshots plus a baseline table.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    rows: Arc<Mutex<Vec<HistoricalRecord>>>,
    baselines: Arc<Mutex<BTreeMap<(GroupName, u8), u8>>>,
    next_event: Arc<AtomicU64>,
    upserts: Arc<AtomicUsize>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one history row directly.
    pub fn push(&self, group: &str, dimmer: u8, observed_at: DateTime<Utc>) {
        let event_id = self.next_event.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.rows).push(HistoricalRecord {
            event_id,
            group_name: GroupName::from(group),
            power: true,
            dimmer,
            color: "f1e0b5".into(),
            observed_at,
        });
    }

    pub fn rows(&self) -> Vec<HistoricalRecord> {
        lock(&self.rows).clone()
    }

    /// Number of baseline writes performed.
    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn baseline(&self, group: &str, hour: u8) -> Option<u8> {
        lock(&self.baselines)
            .get(&(GroupName::from(group), hour))
            .copied()
    }
}

impl StateSink for MemoryHistory {
    fn name(&self) -> &str {
        "memory-history"
    }

    fn persist(&self, batch: &GroupSnapshot) -> Result<(), BoxError> {
        let event_id = self.next_event.fetch_add(1, Ordering::SeqCst) + 1;
        let mut rows = lock(&self.rows);
        for s in batch {
            rows.push(HistoricalRecord {
                event_id,
                group_name: s.group().clone(),
                power: s.power(),
                dimmer: s.dimmer(),
                color: s.color().to_string(),
                observed_at: s.observed_at(),
            });
        }
        Ok(())
    }
}

impl HistoryStore for MemoryHistory {
    fn select_historical(&self, since: DateTime<Utc>) -> Result<Vec<HistoricalRecord>, BoxError> {
        Ok(lock(&self.rows)
            .iter()
            .filter(|r| r.observed_at > since)
            .cloned()
            .collect())
    }

    fn load_baselines(&self) -> Result<Vec<BaselineEntry>, BoxError> {
        Ok(lock(&self.baselines)
            .iter()
            .map(|((group, hour), value)| BaselineEntry {
                group: group.clone(),
                hour: *hour,
                value: *value,
            })
            .collect())
    }

    fn upsert_baseline(&self, entry: &BaselineEntry) -> Result<(), BoxError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        lock(&self.baselines).insert((entry.group.clone(), entry.hour), entry.value);
        Ok(())
    }
}

/// Notifier that records every message.
#[derive(Debug, Clone, Default)]
pub struct SpyNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl SpyNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(title, body)` pairs in send order.
    pub fn sent(&self) -> Vec<(String, String)> {
        lock(&self.sent).clone()
    }
}

impl Notifier for SpyNotifier {
    fn send(&self, title: &str, body: &str) {
        lock(&self.sent).push((title.to_string(), body.to_string()));
    }
}
