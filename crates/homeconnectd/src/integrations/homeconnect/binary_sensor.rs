use serde_json::Value;
use tracing::warn;

use super::appliance::StatusMap;
use super::keys;
use crate::engine::BinarySensorState;

/// Declarative mapping from a status key to a boolean
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinarySensorSpec {
    pub description: &'static str,
    pub key: &'static str,
    pub on_values: &'static [&'static str],
    pub off_values: &'static [&'static str],
    pub device_class: Option<&'static str>,
}

/// Door sensor shared by every appliance with a door
pub const DOOR: BinarySensorSpec = BinarySensorSpec {
    description: "Door",
    key: keys::DOOR_STATE,
    on_values: &[keys::DOOR_OPEN],
    off_values: &[keys::DOOR_CLOSED, keys::DOOR_LOCKED],
    device_class: Some("door"),
};

/// Binary sensor entity (e.g., door sensor)
#[derive(Debug, Clone)]
pub struct BinarySensor {
    pub spec: BinarySensorSpec,

    /// Last evaluated state
    pub state: BinarySensorState,
}

impl BinarySensor {
    pub fn new(spec: BinarySensorSpec) -> Self {
        Self {
            spec,
            state: BinarySensorState::default(),
        }
    }

    /// Map the current status onto the sensor. `None` means unavailable.
    pub fn evaluate(spec: &BinarySensorSpec, status: &StatusMap) -> Option<bool> {
        let value = status.value(spec.key)?;
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) if spec.on_values.contains(&s.as_str()) => Some(true),
            Value::String(s) if spec.off_values.contains(&s.as_str()) => Some(false),
            other => {
                warn!("Unexpected value for {}: {}", spec.key, other);
                None
            }
        }
    }

    /// Re-evaluate against the status map, returning whether the state changed
    pub fn update_state(&mut self, status: &StatusMap) -> bool {
        let next = BinarySensorState {
            on: Self::evaluate(&self.spec, status),
        };
        if next == self.state {
            return false;
        }
        self.state = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn status_with_door(value: Value) -> StatusMap {
        let mut status = StatusMap::new();
        status.set(keys::DOOR_STATE, value);
        status
    }

    #[test]
    fn test_door_open() {
        let status = status_with_door(json!(keys::DOOR_OPEN));
        assert_eq!(BinarySensor::evaluate(&DOOR, &status), Some(true));
    }

    #[test]
    fn test_door_closed_and_locked() {
        let closed = status_with_door(json!(keys::DOOR_CLOSED));
        let locked = status_with_door(json!(keys::DOOR_LOCKED));
        assert_eq!(BinarySensor::evaluate(&DOOR, &closed), Some(false));
        assert_eq!(BinarySensor::evaluate(&DOOR, &locked), Some(false));
    }

    #[test]
    fn test_boolean_value_passes_through() {
        let status = status_with_door(json!(true));
        assert_eq!(BinarySensor::evaluate(&DOOR, &status), Some(true));
    }

    #[test]
    fn test_unknown_value_is_unavailable() {
        let status = status_with_door(json!("BSH.Common.EnumType.DoorState.Ajar"));
        assert_eq!(BinarySensor::evaluate(&DOOR, &status), None);
    }

    #[test]
    fn test_missing_key_is_unavailable() {
        let mut sensor = BinarySensor::new(DOOR);
        assert!(!sensor.update_state(&StatusMap::new()));
        assert!(!sensor.state.available());
    }

    #[test]
    fn test_update_state_reports_changes_only() {
        let mut sensor = BinarySensor::new(DOOR);
        let status = status_with_door(json!(keys::DOOR_OPEN));

        assert!(sensor.update_state(&status));
        assert_eq!(sensor.state.on, Some(true));
        assert!(!sensor.update_state(&status));
    }
}
