//! A gateway backed by payload files on disk.
//!
//! Layout of the fixture directory:
//!
//! - `groups.json`: list of group ids (`/15004`)
//! - `group_<id>.json`: one group payload (`/15004/<id>`)
//! - `device_<id>.json`: one device payload (`/15001/<id>`)
//! - `OFFLINE`: when present, every request times out
//!
//! Files are read on every request, so editing them while a poller runs
//! changes what it observes. Dimming commands are applied to the device file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use lumen_traits::{BoxError, Device, DeviceId, Group, GroupId, Transport};

use crate::error::{GatewayError, Result};
use crate::payload::{self, DevicePayload};
use crate::util::write_atomic;

/// Marker file that makes the fixture behave like an unreachable gateway.
pub const OFFLINE_MARKER: &str = "OFFLINE";

#[derive(Debug, Clone)]
pub struct FixtureGateway {
    dir: PathBuf,
}

impl FixtureGateway {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        if !self.dir.is_dir() {
            return Err(GatewayError::Unreachable(self.dir.display().to_string()));
        }
        if self.dir.join(OFFLINE_MARKER).exists() {
            return Err(GatewayError::Timeout);
        }
        let path = self.dir.join(name);
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => GatewayError::NotFound(path.display().to_string()),
            _ => GatewayError::Io(e),
        })
    }

    pub fn read_group_ids(&self) -> Result<Vec<GroupId>> {
        payload::decode_group_ids(&self.read("groups.json")?)
    }

    pub fn read_group(&self, id: GroupId) -> Result<Group> {
        payload::decode_group(&self.read(&format!("group_{id}.json"))?)
    }

    pub fn read_device(&self, id: DeviceId) -> Result<Device> {
        payload::decode_device(&self.read(&format!("device_{id}.json"))?)
    }

    /// Apply a set-dimming command body to the stored device payload.
    pub fn apply_dimming(&self, id: DeviceId, value: u8) -> Result<()> {
        let name = format!("device_{id}.json");
        let mut device: DevicePayload = serde_json::from_slice(&self.read(&name)?)?;
        let command: Command = serde_json::from_slice(&payload::encode_dimming(value))?;
        let Some(light) = device.light_control.first_mut() else {
            return Err(GatewayError::NotFound(format!("light control on device {id}")));
        };
        if let Some(dimmer) = command.light_control.first().and_then(|c| c.dimmer) {
            light.dimmer = dimmer;
        }
        let bytes = serde_json::to_vec(&device)?;
        write_atomic(&self.dir.join(name), &bytes)?;
        tracing::debug!(device_id = %id, value, "fixture dimming applied");
        Ok(())
    }
}

#[derive(Deserialize)]
struct Command {
    #[serde(rename = "3311", default)]
    light_control: Vec<CommandLight>,
}

#[derive(Deserialize)]
struct CommandLight {
    #[serde(rename = "5851")]
    dimmer: Option<u8>,
}

impl Transport for FixtureGateway {
    fn list_group_ids(&mut self) -> std::result::Result<Vec<GroupId>, BoxError> {
        Ok(self.read_group_ids()?)
    }
    fn group(&mut self, id: GroupId) -> std::result::Result<Group, BoxError> {
        Ok(self.read_group(id)?)
    }
    fn device(&mut self, id: DeviceId) -> std::result::Result<Device, BoxError> {
        Ok(self.read_device(id)?)
    }
    fn set_dimming(&mut self, device: DeviceId, value: u8) -> std::result::Result<(), BoxError> {
        Ok(self.apply_dimming(device, value)?)
    }
}
