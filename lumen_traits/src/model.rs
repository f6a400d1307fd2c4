//! Value types shared by the gateway, the poll loop and the stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gateway-side identifier of a group (room or zone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

/// Gateway-side identifier of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u32);

/// Human name of a group. Snapshots, history rows and baselines are keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupName(String);

impl GroupName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GroupName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for GroupName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Light-control block reported by a bulb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightControl {
    pub power: bool,
    pub dimmer: u8,
    pub color: String,
}

/// A device as enumerated from the gateway. Only devices with a light
/// control block contribute to snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub light: Option<LightControl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: GroupName,
    pub device_ids: Vec<DeviceId>,
}

/// Observed state of one light at one poll instant.
///
/// Values are never mutated in place; a correction produces a new value via
/// [`LightState::with_dimmer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightState {
    power: bool,
    dimmer: u8,
    color: String,
    group: GroupName,
    observed_at: DateTime<Utc>,
    device_id: DeviceId,
}

impl LightState {
    pub fn new(
        device_id: DeviceId,
        group: GroupName,
        light: &LightControl,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            power: light.power,
            dimmer: light.dimmer,
            color: light.color.clone(),
            group,
            observed_at,
            device_id,
        }
    }

    pub fn power(&self) -> bool {
        self.power
    }
    pub fn dimmer(&self) -> u8 {
        self.dimmer
    }
    pub fn color(&self) -> &str {
        &self.color
    }
    pub fn group(&self) -> &GroupName {
        &self.group
    }
    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }
    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    /// Copy of this state with a different dimmer value.
    #[must_use]
    pub fn with_dimmer(&self, dimmer: u8) -> Self {
        Self {
            dimmer,
            ..self.clone()
        }
    }
}

/// All light states of one group at one poll instant, in device enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    group: GroupName,
    states: Vec<LightState>,
}

impl GroupSnapshot {
    pub fn new(group: GroupName, states: Vec<LightState>) -> Self {
        Self { group, states }
    }

    pub fn group(&self) -> &GroupName {
        &self.group
    }
    pub fn states(&self) -> &[LightState] {
        &self.states
    }
    pub fn len(&self) -> usize {
        self.states.len()
    }
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, LightState> {
        self.states.iter()
    }

    /// Swap in a new value at `index`, returning the previous one.
    pub fn replace(&mut self, index: usize, state: LightState) -> Option<LightState> {
        let slot = self.states.get_mut(index)?;
        Some(std::mem::replace(slot, state))
    }
}

impl<'a> IntoIterator for &'a GroupSnapshot {
    type Item = &'a LightState;
    type IntoIter = std::slice::Iter<'a, LightState>;
    fn into_iter(self) -> Self::IntoIter {
        self.states.iter()
    }
}

/// Append-only history row. All rows of one persisted snapshot share an event id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub event_id: u64,
    pub group_name: GroupName,
    pub power: bool,
    pub dimmer: u8,
    pub color: String,
    pub observed_at: DateTime<Utc>,
}

/// Learned target dimmer for one (group, hour-of-day) bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaselineEntry {
    pub group: GroupName,
    pub hour: u8,
    pub value: u8,
}
