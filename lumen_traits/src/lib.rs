//! Capability seams between the poll loop and the outside world.
//!
//! The core never talks to a gateway, a database or a chat service directly;
//! it only sees these traits. Errors cross the boundary boxed and are mapped
//! to typed errors by `lumen_core`.

pub mod clock;
pub mod model;

pub use clock::{Clock, ManualClock, SystemClock};
pub use model::{
    BaselineEntry, Device, DeviceId, Group, GroupId, GroupName, GroupSnapshot, HistoricalRecord,
    LightControl, LightState,
};

use chrono::{DateTime, Utc};

/// Error type used at every trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Request/response access to the device gateway.
///
/// Calls are sequential by nature; implementations own whatever session
/// state the underlying link needs.
pub trait Transport {
    fn list_group_ids(&mut self) -> Result<Vec<GroupId>, BoxError>;
    fn group(&mut self, id: GroupId) -> Result<Group, BoxError>;
    fn device(&mut self, id: DeviceId) -> Result<Device, BoxError>;
    /// Ask the gateway to dim one device to `value` (0..=255).
    fn set_dimming(&mut self, device: DeviceId, value: u8) -> Result<(), BoxError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn list_group_ids(&mut self) -> Result<Vec<GroupId>, BoxError> {
        (**self).list_group_ids()
    }
    fn group(&mut self, id: GroupId) -> Result<Group, BoxError> {
        (**self).group(id)
    }
    fn device(&mut self, id: DeviceId) -> Result<Device, BoxError> {
        (**self).device(id)
    }
    fn set_dimming(&mut self, device: DeviceId, value: u8) -> Result<(), BoxError> {
        (**self).set_dimming(device, value)
    }
}

/// A durable destination for changed snapshots. Several sinks run side by side.
pub trait StateSink: Send + Sync {
    /// Short stable name used in logs and fan-out reports.
    fn name(&self) -> &str;
    fn persist(&self, batch: &GroupSnapshot) -> Result<(), BoxError>;
}

/// Read side of the history plus the durable baseline table.
pub trait HistoryStore: Send + Sync {
    /// All records with `observed_at > since`.
    fn select_historical(&self, since: DateTime<Utc>) -> Result<Vec<HistoricalRecord>, BoxError>;
    fn load_baselines(&self) -> Result<Vec<BaselineEntry>, BoxError>;
    /// Insert or overwrite the row for `(entry.group, entry.hour)`.
    fn upsert_baseline(&self, entry: &BaselineEntry) -> Result<(), BoxError>;
}

/// Outbound human notification. Best effort; implementations log their own failures.
pub trait Notifier: Send + Sync {
    fn send(&self, title: &str, body: &str);
}
