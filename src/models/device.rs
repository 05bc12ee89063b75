//! Camera device descriptors and per-user settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::params::SensorType;

/// A camera body: display metadata plus how many custom preset slots it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    pub sensor: SensorType,
    pub processor: String,
    pub custom_slot_count: u8,
}

impl Device {
    fn known(id: &str, name: &str, sensor: SensorType, processor: &str, slots: u8) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            sensor,
            processor: processor.to_string(),
            custom_slot_count: slots,
        }
    }

    /// Built-in catalog of camera bodies, newest sensor generation first.
    pub fn catalog() -> Vec<Device> {
        vec![
            Self::known("x100vi", "Fujifilm X100VI", SensorType::XTransV, "X-Processor 5", 7),
            Self::known("xt5", "Fujifilm X-T5", SensorType::XTransV, "X-Processor 5", 7),
            Self::known("xh2", "Fujifilm X-H2", SensorType::XTransV, "X-Processor 5", 7),
            Self::known("xt50", "Fujifilm X-T50", SensorType::XTransV, "X-Processor 5", 7),
            Self::known("xt4", "Fujifilm X-T4", SensorType::XTransIV, "X-Processor 4", 7),
            Self::known("x100v", "Fujifilm X100V", SensorType::XTransIV, "X-Processor 4", 7),
            Self::known("xs10", "Fujifilm X-S10", SensorType::XTransIV, "X-Processor 4", 4),
            Self::known("xe4", "Fujifilm X-E4", SensorType::XTransIV, "X-Processor 4", 4),
            Self::known("xt2", "Fujifilm X-T2", SensorType::XTransIII, "X-Processor Pro", 7),
            Self::known("x100f", "Fujifilm X100F", SensorType::XTransIII, "X-Processor Pro", 4),
            Self::known("xt1", "Fujifilm X-T1", SensorType::XTransII, "EXR Processor II", 7),
            Self::known("xpro1", "Fujifilm X-Pro1", SensorType::XTransI, "EXR Processor Pro", 0),
            Self::known("gfx100ii", "Fujifilm GFX 100 II", SensorType::Gfx, "GFX Processor", 7),
            Self::known("gfx50r", "Fujifilm GFX 50R", SensorType::Gfx, "GFX Processor", 7),
        ]
    }

    /// Looks up a catalog device by id (case-insensitive).
    pub fn find(id: &str) -> Option<Device> {
        Self::catalog()
            .into_iter()
            .find(|d| d.id.eq_ignore_ascii_case(id))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}, {} custom slots)",
            self.name, self.sensor, self.processor, self.custom_slot_count
        )
    }
}

/// Per-user settings: the selected camera body and its slot assignments.
///
/// Slot values are non-owning recipe-id references; a slot may point at a
/// recipe that no longer exists and is then simply displayed as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub device: Device,
    pub custom_slots: BTreeMap<String, Option<String>>,
}

impl UserSettings {
    /// Slot keys for a device: `C1..C<n>`.
    pub fn slot_keys(device: &Device) -> Vec<String> {
        (1..=device.custom_slot_count)
            .map(|n| format!("C{}", n))
            .collect()
    }

    /// Fresh settings for a device with every slot empty.
    pub fn for_device(device: Device) -> Self {
        let custom_slots = Self::slot_keys(&device)
            .into_iter()
            .map(|key| (key, None))
            .collect();
        Self {
            device,
            custom_slots,
        }
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        let device = Device::find("x100vi").unwrap_or_else(|| {
            Device::known("x100vi", "Fujifilm X100VI", SensorType::XTransV, "X-Processor 5", 7)
        });
        Self::for_device(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        let device = Device::find("XT5").unwrap();
        assert_eq!(device.name, "Fujifilm X-T5");
        assert_eq!(device.sensor, SensorType::XTransV);
        assert!(Device::find("nikon-z6").is_none());
    }

    #[test]
    fn test_default_settings_has_empty_slots() {
        let settings = UserSettings::default();
        assert_eq!(settings.device.id, "x100vi");
        assert_eq!(settings.custom_slots.len(), 7);
        assert!(settings.custom_slots.values().all(|v| v.is_none()));
        assert!(settings.custom_slots.contains_key("C1"));
        assert!(settings.custom_slots.contains_key("C7"));
    }

    #[test]
    fn test_for_device_respects_slot_count() {
        let device = Device::find("xs10").unwrap();
        let settings = UserSettings::for_device(device);
        assert_eq!(settings.custom_slots.len(), 4);
        assert!(!settings.custom_slots.contains_key("C5"));
    }

    #[test]
    fn test_settings_json_round_trip() {
        let settings = UserSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("customSlots"));
        assert!(json.contains("customSlotCount"));

        let parsed: UserSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, settings);
    }
}
