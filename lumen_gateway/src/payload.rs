//! Trådfri-style JSON payloads.
//!
//! The gateway speaks numeric keys:
//!
//! | key | meaning |
//! |---|---|
//! | `9001` | name |
//! | `9003` | id |
//! | `9018.15002.9003` | device ids of a group |
//! | `3311` | light control list (first entry is used) |
//! | `5850` | power, 0 or 1 |
//! | `5851` | dimmer, 0..=255 |
//! | `5706` | colour as hex |

use serde::{Deserialize, Serialize};

use lumen_traits::{Device, DeviceId, Group, GroupId, GroupName, LightControl};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPayload {
    #[serde(rename = "9003")]
    pub id: u32,
    #[serde(rename = "9001")]
    pub name: String,
    #[serde(rename = "9018", default)]
    pub content: GroupContent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupContent {
    #[serde(rename = "15002", default)]
    pub device_list: DeviceList,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceList {
    #[serde(rename = "9003", default)]
    pub device_ids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePayload {
    #[serde(rename = "9003")]
    pub id: u32,
    #[serde(rename = "9001", default)]
    pub name: String,
    #[serde(rename = "3311", default, skip_serializing_if = "Vec::is_empty")]
    pub light_control: Vec<LightControlPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightControlPayload {
    #[serde(rename = "5850", default)]
    pub power: u8,
    #[serde(rename = "5851", default)]
    pub dimmer: u8,
    #[serde(rename = "5706", default)]
    pub color: String,
}

impl From<GroupPayload> for Group {
    fn from(p: GroupPayload) -> Self {
        Self {
            id: GroupId(p.id),
            name: GroupName::new(p.name),
            device_ids: p
                .content
                .device_list
                .device_ids
                .into_iter()
                .map(DeviceId)
                .collect(),
        }
    }
}

impl From<&LightControlPayload> for LightControl {
    fn from(p: &LightControlPayload) -> Self {
        Self {
            power: p.power != 0,
            dimmer: p.dimmer,
            color: p.color.clone(),
        }
    }
}

impl From<DevicePayload> for Device {
    fn from(p: DevicePayload) -> Self {
        Self {
            id: DeviceId(p.id),
            name: p.name,
            light: p.light_control.first().map(LightControl::from),
        }
    }
}

pub fn decode_group_ids(bytes: &[u8]) -> Result<Vec<GroupId>> {
    let ids: Vec<u32> = serde_json::from_slice(bytes)?;
    Ok(ids.into_iter().map(GroupId).collect())
}

pub fn decode_group(bytes: &[u8]) -> Result<Group> {
    let p: GroupPayload = serde_json::from_slice(bytes)?;
    Ok(p.into())
}

pub fn decode_device(bytes: &[u8]) -> Result<Device> {
    let p: DevicePayload = serde_json::from_slice(bytes)?;
    Ok(p.into())
}

/// Body of a set-dimming command: `{"3311":[{"5851":value}]}`.
pub fn encode_dimming(value: u8) -> Vec<u8> {
    serde_json::json!({ "3311": [{ "5851": value }] })
        .to_string()
        .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_payload_decodes_device_ids_in_order() {
        let raw = br#"{"9001":"Kitchen","9003":131073,"9018":{"15002":{"9003":[65537,65536]}},"5850":1}"#;
        let g = decode_group(raw).unwrap();
        assert_eq!(g.id, GroupId(131_073));
        assert_eq!(g.name.as_str(), "Kitchen");
        assert_eq!(g.device_ids, vec![DeviceId(65_537), DeviceId(65_536)]);
    }

    #[test]
    fn bulb_uses_first_light_control_entry() {
        let raw = br#"{"9001":"Bulb","9003":65537,"3311":[{"5850":1,"5851":200,"5706":"f1e0b5"},{"5850":0,"5851":1}]}"#;
        let d = decode_device(raw).unwrap();
        let light = d.light.unwrap();
        assert!(light.power);
        assert_eq!(light.dimmer, 200);
        assert_eq!(light.color, "f1e0b5");
    }

    #[test]
    fn remote_has_no_light() {
        let raw = br#"{"9001":"Remote","9003":65540,"3": {"1": "TRADFRI remote control"}}"#;
        assert!(decode_device(raw).unwrap().light.is_none());
    }

    #[test]
    fn dimmer_out_of_range_is_a_payload_error() {
        let raw = br#"{"9003":1,"3311":[{"5851":300}]}"#;
        assert!(matches!(
            decode_device(raw),
            Err(crate::error::GatewayError::Payload(_))
        ));
    }

    #[test]
    fn group_ids_list() {
        assert_eq!(
            decode_group_ids(b"[131073, 131074]").unwrap(),
            vec![GroupId(131_073), GroupId(131_074)]
        );
    }

    #[test]
    fn dimming_command_shape() {
        let v: serde_json::Value = serde_json::from_slice(&encode_dimming(150)).unwrap();
        assert_eq!(v["3311"][0]["5851"], 150);
    }
}
