use std::collections::BTreeMap;
use std::collections::HashMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::device::Device;
use super::entity::EntityInfo;

/// State of a light entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LightState {
    /// Whether the light is on or off. `None` while the appliance has not reported it.
    pub on: Option<bool>,

    /// Brightness level (0-255), if supported.
    pub brightness: Option<u8>,

    /// RGB color, if supported.
    pub rgb: Option<[u8; 3]>,
}

/// State of a binary sensor entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BinarySensorState {
    /// Whether the sensor is active (meaning depends on device class:
    /// door open, etc.). `None` means unavailable.
    pub on: Option<bool>,
}

impl BinarySensorState {
    pub fn available(&self) -> bool {
        self.on.is_some()
    }
}

/// Value reported by a sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorValue {
    Timestamp(DateTime<Utc>),
    Number(f64),
    Text(String),
}

impl SensorValue {
    /// Convert a raw vendor JSON value into a sensor value.
    ///
    /// Booleans are reported as text; arrays, objects and null have no sensor representation.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(SensorValue::Number),
            serde_json::Value::String(s) => Some(SensorValue::Text(s.clone())),
            serde_json::Value::Bool(b) => Some(SensorValue::Text(b.to_string())),
            _ => None,
        }
    }
}

/// State of a sensor entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorState {
    /// `None` means unavailable.
    pub value: Option<SensorValue>,
}

impl SensorState {
    pub fn available(&self) -> bool {
        self.value.is_some()
    }
}

/// State of a switch entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SwitchState {
    /// `None` means unavailable.
    pub on: Option<bool>,

    /// Extra attributes exposed alongside the state.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// Centralized snapshot of the entire engine state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct State {
    pub devices: HashMap<String, Device>,
    pub entities: HashMap<String, EntityInfo>,
    pub lights: HashMap<String, LightState>,
    pub binary_sensors: HashMap<String, BinarySensorState>,
    pub sensors: HashMap<String, SensorState>,
    pub switches: HashMap<String, SwitchState>,
}

impl State {
    /// Drop an entity and any state recorded for it.
    pub(super) fn remove_entity(&mut self, entity_id: &str) {
        self.entities.remove(entity_id);
        self.lights.remove(entity_id);
        self.binary_sensors.remove(entity_id);
        self.sensors.remove(entity_id);
        self.switches.remove(entity_id);
        for device in self.devices.values_mut() {
            device.entity_ids.retain(|id| id != entity_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_value_from_json() {
        assert_eq!(
            SensorValue::from_json(&serde_json::json!(42)),
            Some(SensorValue::Number(42.0))
        );
        assert_eq!(
            SensorValue::from_json(&serde_json::json!("Run")),
            Some(SensorValue::Text("Run".to_string()))
        );
        assert_eq!(SensorValue::from_json(&serde_json::Value::Null), None);
    }

    #[test]
    fn test_sensor_value_serializes_untagged() {
        let json = serde_json::to_value(SensorValue::Number(12.5)).unwrap();
        assert_eq!(json, serde_json::json!(12.5));
    }

    #[test]
    fn test_unavailable_by_default() {
        assert!(!BinarySensorState::default().available());
        assert!(!SensorState::default().available());
    }
}
