//! Type-safe message system for homeconnectd
//!
//! Messages are split by direction to enforce correct usage at compile time:
//! - `FromIntegrationMessage`: Events from integrations to the engine
//! - `ToIntegrationMessage`: Commands from the engine to integrations

use super::device::Device;
use super::entity::EntityInfo;
use super::state::BinarySensorState;
use super::state::LightState;
use super::state::SensorState;
use super::state::SwitchState;

/// Messages FROM integrations TO the engine (events/state updates)
#[derive(Debug, Clone)]
pub enum FromIntegrationMessage {
    /// A device was discovered (or its metadata changed)
    DeviceDiscovered { device: Device },

    /// An entity was discovered and registered
    EntityDiscovered {
        info: EntityInfo,
        integration_name: String,
    },

    /// An entity was removed (appliance unpaired, etc.)
    EntityRemoved { entity_id: String },

    LightStateChanged {
        entity_id: String,
        state: LightState,
    },

    /// A binary sensor's state changed (e.g., door sensor)
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
}

/// Messages FROM the engine TO integrations (commands)
#[derive(Debug, Clone)]
pub enum ToIntegrationMessage {
    /// Command to change a light's state
    LightCommand {
        entity_id: String,
        on: bool,
        brightness: Option<u8>,
        rgb: Option<[u8; 3]>,
    },

    /// Command to turn a switch on or off
    SwitchCommand { entity_id: String, on: bool },

    /// Integration-specific service targeting the appliance that owns `entity_id`
    ServiceCall {
        entity_id: String,
        service: String,
        data: serde_json::Value,
    },
}

impl ToIntegrationMessage {
    /// Entity the command is addressed to, used for routing
    pub fn entity_id(&self) -> &str {
        match self {
            ToIntegrationMessage::LightCommand { entity_id, .. }
            | ToIntegrationMessage::SwitchCommand { entity_id, .. }
            | ToIntegrationMessage::ServiceCall { entity_id, .. } => entity_id,
        }
    }
}
