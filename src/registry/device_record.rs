// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::DeviceId;

/// Reconciled state snapshot for one tracked device.
///
/// Records are created by an `add` event with every field at its default,
/// then filled in by `available` and `ready`.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use nodewatch::registry::{DeviceId, DeviceRecord, NodeState};
///
/// let record = DeviceRecord::new(DeviceId::new(3).unwrap(), Utc::now());
/// assert!(!record.ready);
/// assert_eq!(record.state, NodeState::Nop);
/// assert!(record.info.name.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceRecord {
    /// Producer-assigned device id.
    pub id: DeviceId,
    /// Descriptive metadata, empty until the device is available.
    pub info: DeviceInfo,
    /// Lifecycle tag.
    pub state: NodeState,
    /// Whether the device finished its interview.
    pub ready: bool,
    /// Protocol-level capabilities.
    #[serde(rename = "caps")]
    pub capabilities: NodeCapabilities,
    /// Functional device class flags.
    #[serde(rename = "class")]
    pub device_class: DeviceClass,
    /// Wall-clock time of the last applied mutation.
    pub last_seen: DateTime<Utc>,
}

impl DeviceRecord {
    /// Creates a default-initialized record.
    #[must_use]
    pub fn new(id: DeviceId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            info: DeviceInfo::default(),
            state: NodeState::default(),
            ready: false,
            capabilities: NodeCapabilities::default(),
            device_class: DeviceClass::default(),
            last_seen: now,
        }
    }
}

/// Descriptive metadata reported when a device becomes available.
///
/// Wire names follow the producer's field names. Missing or `null` fields
/// become empty strings, and numbers or booleans are kept in their textual
/// form, so a partially populated report never fails the whole update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Manufacturer name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub manufacturer: String,
    /// Manufacturer id.
    #[serde(
        rename = "manufacturerid",
        default,
        deserialize_with = "lenient_string"
    )]
    pub manufacturer_id: String,
    /// Product name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub product: String,
    /// Product type.
    #[serde(rename = "producttype", default, deserialize_with = "lenient_string")]
    pub product_type: String,
    /// Product id.
    #[serde(rename = "productid", default, deserialize_with = "lenient_string")]
    pub product_id: String,
    /// Generic device type.
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub device_type: String,
    /// User-assigned display name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// User-assigned location.
    #[serde(rename = "loc", default, deserialize_with = "lenient_string")]
    pub location: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Lifecycle tag of a device.
///
/// No reconciled action sets this yet; every record starts at [`NodeState::Nop`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    /// No state reported.
    #[default]
    Nop,
    /// Awake.
    Awake,
    /// Asleep.
    Asleep,
    /// Dead.
    Dead,
    /// Alive.
    Alive,
}

/// Protocol-level capability flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct NodeCapabilities {
    /// Always listening (mains powered).
    #[serde(rename = "is_listening")]
    pub listening: bool,
    /// Routes messages for other devices.
    #[serde(rename = "is_routing")]
    pub routing: bool,
    /// Supports beaming.
    #[serde(rename = "is_beaming")]
    pub beaming: bool,
    /// Is a controller.
    #[serde(rename = "is_controller")]
    pub controller: bool,
    /// Is the primary controller.
    #[serde(rename = "is_primary_controller")]
    pub primary_controller: bool,
}

/// Functional class flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceClass {
    /// Reports metering values.
    #[serde(rename = "is_meter")]
    pub meter: bool,
    /// Is a switch.
    #[serde(rename = "is_switch")]
    pub switch: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> DeviceId {
        DeviceId::new(n).unwrap()
    }

    #[test]
    fn new_record_is_default() {
        let now = Utc::now();
        let record = DeviceRecord::new(id(4), now);
        assert_eq!(record.id, id(4));
        assert_eq!(record.info, DeviceInfo::default());
        assert_eq!(record.state, NodeState::Nop);
        assert!(!record.ready);
        assert_eq!(record.capabilities, NodeCapabilities::default());
        assert_eq!(record.device_class, DeviceClass::default());
        assert_eq!(record.last_seen, now);
    }

    #[test]
    fn info_from_full_payload() {
        let info: DeviceInfo = serde_json::from_str(
            r#"{
                "manufacturer": "Aeotec",
                "manufacturerid": "0x0086",
                "product": "Smart Switch 6",
                "producttype": "0x0003",
                "productid": "0x0060",
                "type": "Binary Power Switch",
                "name": "Kettle",
                "loc": "Kitchen"
            }"#,
        )
        .unwrap();
        assert_eq!(info.manufacturer, "Aeotec");
        assert_eq!(info.manufacturer_id, "0x0086");
        assert_eq!(info.product_type, "0x0003");
        assert_eq!(info.product_id, "0x0060");
        assert_eq!(info.device_type, "Binary Power Switch");
        assert_eq!(info.name, "Kettle");
        assert_eq!(info.location, "Kitchen");
    }

    #[test]
    fn info_missing_fields_become_empty() {
        let info: DeviceInfo = serde_json::from_str(r#"{"name": "Porch"}"#).unwrap();
        assert_eq!(info.name, "Porch");
        assert!(info.manufacturer.is_empty());
        assert!(info.location.is_empty());
    }

    #[test]
    fn info_tolerates_null_and_numbers() {
        let info: DeviceInfo =
            serde_json::from_str(r#"{"manufacturerid": 134, "loc": null}"#).unwrap();
        assert_eq!(info.manufacturer_id, "134");
        assert!(info.location.is_empty());
    }

    #[test]
    fn record_serializes_with_wire_names() {
        let record = DeviceRecord::new(id(2), Utc::now());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 2);
        assert_eq!(json["state"], "nop");
        assert_eq!(json["ready"], false);
        assert_eq!(json["caps"]["is_primary_controller"], false);
        assert_eq!(json["class"]["is_switch"], false);
        assert!(json["info"]["manufacturerid"].is_string());
        assert!(json["last_seen"].is_string());
    }
}
