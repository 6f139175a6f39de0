//! Runtime view of one appliance: its status map and the entities built from its descriptor.

use std::collections::HashMap;
use std::collections::HashSet;

use chrono::DateTime;
use chrono::Utc;

use super::appliance::ApplianceInfo;
use super::appliance::StatusMap;
use super::binary_sensor::BinarySensor;
use super::device::ApplianceKind;
use super::device::DeviceDescriptor;
use super::device::EntitySpec;
use super::events::ApplianceEvent;
use super::light::Light;
use super::sensor::Sensor;
use super::switch::PowerSwitch;
use super::switch::ProgramSwitch;
use crate::engine::Device;
use crate::engine::EntityInfo;
use crate::engine::FromIntegrationMessage;
use crate::engine::Platform;
use crate::engine::slugify;

/// Identifier namespace used in device identifiers
pub const IDENTIFIER_DOMAIN: &str = "homeconnect";

/// State holder behind one entity
#[derive(Debug, Clone)]
pub enum Adapter {
    BinarySensor(BinarySensor),
    Sensor(Sensor),
    ProgramSwitch(ProgramSwitch),
    PowerSwitch(PowerSwitch),
    Light(Light),
}

impl Adapter {
    pub fn from_spec(spec: &EntitySpec) -> Self {
        match spec {
            EntitySpec::BinarySensor(spec) => Adapter::BinarySensor(BinarySensor::new(*spec)),
            EntitySpec::Sensor(spec) => Adapter::Sensor(Sensor::new(*spec)),
            EntitySpec::ProgramSwitch { program, .. } => {
                Adapter::ProgramSwitch(ProgramSwitch::new(*program))
            }
            EntitySpec::PowerSwitch { power_off_state } => {
                Adapter::PowerSwitch(PowerSwitch::new(*power_off_state))
            }
            EntitySpec::Light(kind) => Adapter::Light(Light::new(*kind)),
        }
    }

    /// Re-evaluate against the status map, returning whether the state changed
    pub fn update_state(&mut self, status: &StatusMap, now: DateTime<Utc>) -> bool {
        match self {
            Adapter::BinarySensor(sensor) => sensor.update_state(status),
            Adapter::Sensor(sensor) => sensor.update_state(status, now),
            Adapter::ProgramSwitch(switch) => switch.update_state(status),
            Adapter::PowerSwitch(switch) => switch.update_state(status),
            Adapter::Light(light) => light.update_state(status),
        }
    }

    /// Message reporting the current state to the engine
    pub fn state_message(&self, entity_id: &str) -> FromIntegrationMessage {
        let entity_id = entity_id.to_string();
        match self {
            Adapter::BinarySensor(sensor) => FromIntegrationMessage::BinarySensorStateChanged {
                entity_id,
                state: sensor.state.clone(),
            },
            Adapter::Sensor(sensor) => FromIntegrationMessage::SensorStateChanged {
                entity_id,
                state: sensor.state.clone(),
            },
            Adapter::ProgramSwitch(switch) => FromIntegrationMessage::SwitchStateChanged {
                entity_id,
                state: switch.state.clone(),
            },
            Adapter::PowerSwitch(switch) => FromIntegrationMessage::SwitchStateChanged {
                entity_id,
                state: switch.state.clone(),
            },
            Adapter::Light(light) => FromIntegrationMessage::LightStateChanged {
                entity_id,
                state: light.state.clone(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApplianceEntity {
    pub info: EntityInfo,
    pub adapter: Adapter,
}

/// Pick `{platform}.{slug}`, appending `_2`, `_3`, ... until it is unused
pub fn allocate_entity_id(platform: Platform, name: &str, used: &mut HashSet<String>) -> String {
    let base = format!("{}.{}", platform, slugify(name));
    let mut entity_id = base.clone();
    let mut suffix = 2;
    while used.contains(&entity_id) {
        entity_id = format!("{}_{}", base, suffix);
        suffix += 1;
    }
    used.insert(entity_id.clone());
    entity_id
}

#[derive(Debug, Clone)]
pub struct Appliance {
    pub info: ApplianceInfo,
    pub kind: ApplianceKind,
    pub status: StatusMap,
    pub entities: Vec<ApplianceEntity>,
    /// Bumped on every event that changes `status`
    revision: u64,
    /// Revision at which the status was last cleared
    cleared_at: u64,
    /// Revision of the last event that changed each key
    key_revisions: HashMap<String, u64>,
}

impl Appliance {
    /// Build the appliance's entities. `used_ids` holds entity ids already taken.
    pub fn new(
        info: ApplianceInfo,
        kind: ApplianceKind,
        status: StatusMap,
        used_ids: &mut HashSet<String>,
    ) -> Self {
        let entities = DeviceDescriptor::for_kind(kind)
            .entity_specs()
            .iter()
            .map(|spec| {
                let name = format!("{} {}", info.name, spec.description());
                let platform = spec.platform();
                ApplianceEntity {
                    info: EntityInfo {
                        entity_id: allocate_entity_id(platform, &name, used_ids),
                        unique_id: format!("{}-{}", info.ha_id, spec.description()),
                        name,
                        platform,
                        device_id: Some(info.ha_id.clone()),
                        device_class: spec.device_class().map(str::to_string),
                        unit: spec.unit().map(str::to_string),
                        icon: spec.icon().map(str::to_string),
                    },
                    adapter: Adapter::from_spec(spec),
                }
            })
            .collect();

        Self {
            info,
            kind,
            status,
            entities,
            revision: 0,
            cleared_at: 0,
            key_revisions: HashMap::new(),
        }
    }

    /// Current event revision, taken before fetching a fresh status
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Merge an event into the status map, returning whether anything changed
    pub fn apply_event(&mut self, event: ApplianceEvent) -> bool {
        let before = self.status.clone();
        if !event.apply(&mut self.status) {
            return false;
        }
        self.revision += 1;
        for (key, entry) in self.status.iter() {
            if before.get(key) != Some(entry) {
                self.key_revisions.insert(key.clone(), self.revision);
            }
        }
        true
    }

    /// Forget everything known about the appliance's status
    pub fn clear_status(&mut self) {
        self.revision += 1;
        self.cleared_at = self.revision;
        self.status = StatusMap::new();
        self.key_revisions.clear();
    }

    /// Install a status fetched when the revision was `fetched_at`.
    ///
    /// Keys changed by events since then keep their event value, and a status
    /// cleared since then stays cleared. Returns whether the status was replaced.
    pub fn replace_status(&mut self, mut fresh: StatusMap, fetched_at: u64) -> bool {
        if self.cleared_at > fetched_at {
            return false;
        }
        for (key, revision) in &self.key_revisions {
            if *revision > fetched_at {
                if let Some(entry) = self.status.get(key) {
                    fresh.insert(key.clone(), entry.clone());
                }
            }
        }
        self.status = fresh;
        true
    }

    pub fn ha_id(&self) -> &str {
        &self.info.ha_id
    }

    pub fn device(&self) -> Device {
        let mut device = Device::new(self.info.ha_id.clone(), self.info.name.clone());
        device.identifiers = vec![(IDENTIFIER_DOMAIN.to_string(), self.info.ha_id.clone())];
        device.manufacturer = self.info.brand.clone();
        device.model = self.info.vib.clone();
        device
    }

    /// Re-evaluate every entity, returning messages for the ones that changed
    pub fn update_entities(&mut self, now: DateTime<Utc>) -> Vec<FromIntegrationMessage> {
        let status = &self.status;
        self.entities
            .iter_mut()
            .filter_map(|entity| {
                entity
                    .adapter
                    .update_state(status, now)
                    .then(|| entity.adapter.state_message(&entity.info.entity_id))
            })
            .collect()
    }

    /// Current state of every entity
    pub fn state_messages(&self) -> Vec<FromIntegrationMessage> {
        self.entities
            .iter()
            .map(|entity| entity.adapter.state_message(&entity.info.entity_id))
            .collect()
    }

    /// Messages withdrawing every entity of the appliance
    pub fn removal_messages(&self) -> Vec<FromIntegrationMessage> {
        self.entities
            .iter()
            .map(|entity| FromIntegrationMessage::EntityRemoved {
                entity_id: entity.info.entity_id.clone(),
            })
            .collect()
    }

    pub fn entity_mut(&mut self, entity_id: &str) -> Option<&mut ApplianceEntity> {
        self.entities
            .iter_mut()
            .find(|entity| entity.info.entity_id == entity_id)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::integrations::homeconnect::appliance::StatusItem;
    use crate::integrations::homeconnect::keys;

    fn info(ha_id: &str, name: &str, appliance_type: &str) -> ApplianceInfo {
        ApplianceInfo {
            ha_id: ha_id.to_string(),
            name: name.to_string(),
            appliance_type: appliance_type.to_string(),
            brand: Some("Siemens".to_string()),
            vib: Some("HB676G5S6".to_string()),
            enumber: None,
            connected: true,
        }
    }

    #[test]
    fn test_allocate_entity_id_suffixes_collisions() {
        let mut used = HashSet::new();
        assert_eq!(
            allocate_entity_id(Platform::Switch, "Oven Power", &mut used),
            "switch.oven_power"
        );
        assert_eq!(
            allocate_entity_id(Platform::Switch, "Oven Power", &mut used),
            "switch.oven_power_2"
        );
        assert_eq!(
            allocate_entity_id(Platform::Switch, "Oven-Power", &mut used),
            "switch.oven_power_3"
        );
        assert_eq!(
            allocate_entity_id(Platform::Sensor, "Oven Power", &mut used),
            "sensor.oven_power"
        );
    }

    #[test]
    fn test_entity_info() {
        let mut used = HashSet::new();
        let oven = Appliance::new(
            info("SIEMENS-HB676G5S6-68A40E3B2E6B", "Oven", "Oven"),
            ApplianceKind::Oven,
            StatusMap::new(),
            &mut used,
        );

        let door = &oven.entities[0].info;
        assert_eq!(door.entity_id, "binary_sensor.oven_door");
        assert_eq!(door.unique_id, "SIEMENS-HB676G5S6-68A40E3B2E6B-Door");
        assert_eq!(door.name, "Oven Door");
        assert_eq!(door.device_class.as_deref(), Some("door"));

        let remaining = &oven.entities[1].info;
        assert_eq!(remaining.entity_id, "sensor.oven_remaining_program_time");
        assert_eq!(remaining.device_class.as_deref(), Some("timestamp"));

        let power = oven
            .entities
            .iter()
            .find(|e| e.info.name == "Oven Power")
            .unwrap();
        assert_eq!(power.info.entity_id, "switch.oven_power");
        assert_eq!(used.len(), oven.entities.len());
    }

    #[test]
    fn test_two_appliances_with_same_name() {
        let mut used = HashSet::new();
        let first = Appliance::new(
            info("A", "Washer", "Washer"),
            ApplianceKind::Washer,
            StatusMap::new(),
            &mut used,
        );
        let second = Appliance::new(
            info("B", "Washer", "Washer"),
            ApplianceKind::Washer,
            StatusMap::new(),
            &mut used,
        );
        assert_eq!(first.entities[0].info.entity_id, "binary_sensor.washer_door");
        assert_eq!(second.entities[0].info.entity_id, "binary_sensor.washer_door_2");
        assert_eq!(second.entities[0].info.unique_id, "B-Door");
    }

    #[test]
    fn test_device() {
        let appliance = Appliance::new(
            info("SIEMENS-HB676G5S6-68A40E3B2E6B", "Oven", "Oven"),
            ApplianceKind::Oven,
            StatusMap::new(),
            &mut HashSet::new(),
        );
        let device = appliance.device();
        assert_eq!(device.id, "SIEMENS-HB676G5S6-68A40E3B2E6B");
        assert_eq!(
            device.identifiers,
            vec![(
                "homeconnect".to_string(),
                "SIEMENS-HB676G5S6-68A40E3B2E6B".to_string()
            )]
        );
        assert_eq!(device.manufacturer.as_deref(), Some("Siemens"));
        assert_eq!(device.model.as_deref(), Some("HB676G5S6"));
    }

    #[test]
    fn test_refresh_keeps_newer_event_values() {
        let mut dishwasher = Appliance::new(
            info("DW", "Dishwasher", "Dishwasher"),
            ApplianceKind::Dishwasher,
            StatusMap::new(),
            &mut HashSet::new(),
        );
        dishwasher.status.set(keys::DOOR_STATE, json!(keys::DOOR_CLOSED));

        let fetched_at = dishwasher.revision();
        let mut fetched = StatusMap::new();
        fetched.set(keys::DOOR_STATE, json!(keys::DOOR_CLOSED));
        fetched.set(keys::OPERATION_STATE, json!(keys::OPERATION_RUN));

        // Door opens while the fetch is in flight.
        assert!(dishwasher.apply_event(ApplianceEvent::Status(vec![StatusItem {
            key: keys::DOOR_STATE.to_string(),
            value: Some(json!(keys::DOOR_OPEN)),
            unit: None,
        }])));

        assert!(dishwasher.replace_status(fetched.clone(), fetched_at));
        assert_eq!(dishwasher.status.str_value(keys::DOOR_STATE), Some(keys::DOOR_OPEN));
        assert_eq!(
            dishwasher.status.str_value(keys::OPERATION_STATE),
            Some(keys::OPERATION_RUN)
        );

        // A fetch started after the event wins outright.
        let fetched_at = dishwasher.revision();
        assert!(dishwasher.replace_status(fetched, fetched_at));
        assert_eq!(dishwasher.status.str_value(keys::DOOR_STATE), Some(keys::DOOR_CLOSED));
    }

    #[test]
    fn test_refresh_after_clear_is_dropped() {
        let mut washer = Appliance::new(
            info("W", "Washer", "Washer"),
            ApplianceKind::Washer,
            StatusMap::new(),
            &mut HashSet::new(),
        );
        let fetched_at = washer.revision();
        washer.clear_status();

        let mut fetched = StatusMap::new();
        fetched.set(keys::DOOR_STATE, json!(keys::DOOR_OPEN));
        assert!(!washer.replace_status(fetched, fetched_at));
        assert!(washer.status.is_empty());
    }

    #[test]
    fn test_update_entities_reports_only_changes() {
        let mut fridge = Appliance::new(
            info("F", "Fridge", "FridgeFreezer"),
            ApplianceKind::FridgeFreezer,
            StatusMap::new(),
            &mut HashSet::new(),
        );
        let now = Utc::now();
        assert!(fridge.update_entities(now).is_empty());

        fridge.status.set(keys::DOOR_STATE, json!(keys::DOOR_OPEN));
        let messages = fridge.update_entities(now);
        assert_eq!(messages.len(), 2);
        assert!(matches!(
            &messages[0],
            FromIntegrationMessage::BinarySensorStateChanged { entity_id, state }
                if entity_id == "binary_sensor.fridge_door" && state.on == Some(true)
        ));

        assert!(fridge.update_entities(now).is_empty());
        assert_eq!(fridge.state_messages().len(), 2);
    }
}
