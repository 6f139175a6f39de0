use serde::Serialize;

use super::state::BinarySensorState;
use super::state::LightState;
use super::state::SensorState;
use super::state::SwitchState;

/// State-change events published by the engine.
///
/// Distinct from `FromIntegrationMessage` (transport-level). The engine converts
/// `FromIntegrationMessage` into `Event` at the boundary, after the state snapshot
/// has been updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    LightStateChanged {
        entity_id: String,
        state: LightState,
    },
    BinarySensorStateChanged {
        entity_id: String,
        state: BinarySensorState,
    },
    SensorStateChanged {
        entity_id: String,
        state: SensorState,
    },
    SwitchStateChanged {
        entity_id: String,
        state: SwitchState,
    },
    EntityRemoved {
        entity_id: String,
    },
}
