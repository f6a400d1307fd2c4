//! In-memory gateway for demos and smoke runs.

use std::collections::BTreeMap;

use lumen_traits::{BoxError, Device, DeviceId, Group, GroupId, GroupName, LightControl, Transport};

use crate::error::GatewayError;

/// Static scene of groups and lights. Dimming commands update the scene.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGateway {
    groups: BTreeMap<GroupId, Group>,
    devices: BTreeMap<DeviceId, Device>,
}

impl SimulatedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(&mut self, id: u32, name: &str, lights: Vec<(u32, LightControl)>) {
        let mut device_ids = Vec::with_capacity(lights.len());
        for (dev, light) in lights {
            device_ids.push(DeviceId(dev));
            self.devices.insert(
                DeviceId(dev),
                Device {
                    id: DeviceId(dev),
                    name: format!("{name} light {dev}"),
                    light: Some(light),
                },
            );
        }
        self.groups.insert(
            GroupId(id),
            Group {
                id: GroupId(id),
                name: GroupName::from(name),
                device_ids,
            },
        );
        tracing::debug!(group_id = id, group = name, "simulated group added");
    }

    pub fn light(&self, dev: DeviceId) -> Option<&LightControl> {
        self.devices.get(&dev).and_then(|d| d.light.as_ref())
    }
}

impl Transport for SimulatedGateway {
    fn list_group_ids(&mut self) -> Result<Vec<GroupId>, BoxError> {
        Ok(self.groups.keys().copied().collect())
    }

    fn group(&mut self, id: GroupId) -> Result<Group, BoxError> {
        self.groups
            .get(&id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("group {id}")).into())
    }

    fn device(&mut self, id: DeviceId) -> Result<Device, BoxError> {
        self.devices
            .get(&id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("device {id}")).into())
    }

    fn set_dimming(&mut self, device: DeviceId, value: u8) -> Result<(), BoxError> {
        let light = self
            .devices
            .get_mut(&device)
            .and_then(|d| d.light.as_mut())
            .ok_or_else(|| GatewayError::NotFound(format!("light {device}")))?;
        light.dimmer = value;
        Ok(())
    }
}
