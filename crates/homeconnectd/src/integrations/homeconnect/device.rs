//! Appliance classification and the static entity table per appliance type.

use std::collections::HashSet;

use strum::Display;
use strum::EnumIter;
use strum::EnumString;

use super::binary_sensor;
use super::binary_sensor::BinarySensorSpec;
use super::keys;
use super::light::LightKind;
use super::programs;
use super::sensor;
use super::sensor::SensorSpec;
use crate::engine::Platform;

/// Appliance types known to the integration, named as in the vendor `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum ApplianceKind {
    Dryer,
    Washer,
    WasherDryer,
    Dishwasher,
    Oven,
    CoffeeMaker,
    Hood,
    FridgeFreezer,
    Hob,
}

impl ApplianceKind {
    /// Classify a vendor appliance type. Unknown types return `None`.
    pub fn from_type(appliance_type: &str) -> Option<Self> {
        appliance_type.parse().ok()
    }
}

/// Capabilities of one appliance type
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    pub kind: ApplianceKind,
    pub door: Option<BinarySensorSpec>,
    pub programs: Option<&'static [&'static str]>,
    pub lights: &'static [LightKind],
    /// Power state that counts as "off" (some appliances only support standby)
    pub power_off_state: &'static str,
}

/// One entity declared by a descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum EntitySpec {
    BinarySensor(BinarySensorSpec),
    Sensor(SensorSpec),
    ProgramSwitch {
        program: &'static str,
        description: String,
    },
    PowerSwitch {
        power_off_state: &'static str,
    },
    Light(LightKind),
}

impl EntitySpec {
    pub fn platform(&self) -> Platform {
        match self {
            EntitySpec::BinarySensor(_) => Platform::BinarySensor,
            EntitySpec::Sensor(_) => Platform::Sensor,
            EntitySpec::ProgramSwitch { .. } | EntitySpec::PowerSwitch { .. } => Platform::Switch,
            EntitySpec::Light(_) => Platform::Light,
        }
    }

    /// Short description, appended to the appliance name and used in the unique id
    pub fn description(&self) -> &str {
        match self {
            EntitySpec::BinarySensor(spec) => spec.description,
            EntitySpec::Sensor(spec) => spec.description,
            EntitySpec::ProgramSwitch { description, .. } => description,
            EntitySpec::PowerSwitch { .. } => "Power",
            EntitySpec::Light(kind) => kind.description(),
        }
    }

    pub fn device_class(&self) -> Option<&'static str> {
        match self {
            EntitySpec::BinarySensor(spec) => spec.device_class,
            EntitySpec::Sensor(spec) => spec.device_class,
            _ => None,
        }
    }

    pub fn unit(&self) -> Option<&'static str> {
        match self {
            EntitySpec::Sensor(spec) => spec.unit,
            _ => None,
        }
    }

    pub fn icon(&self) -> Option<&'static str> {
        match self {
            EntitySpec::Sensor(spec) => spec.icon,
            _ => None,
        }
    }
}

/// Description of a program switch: `Program <last key segment>`
fn program_description(program: &str) -> String {
    format!("Program {}", keys::last_segment(program))
}

/// Disambiguated description for programs sharing a last segment
/// (`LaundryCare.Dryer.Program.Cotton` -> `Program Dryer Cotton`)
fn qualified_program_description(program: &str) -> String {
    let mut segments = program.split('.');
    let family = segments.nth(1).unwrap_or(program);
    format!("Program {} {}", family, keys::last_segment(program))
}

impl DeviceDescriptor {
    pub fn for_kind(kind: ApplianceKind) -> Self {
        let base = DeviceDescriptor {
            kind,
            door: None,
            programs: None,
            lights: &[],
            power_off_state: keys::POWER_OFF,
        };

        match kind {
            ApplianceKind::Dryer => DeviceDescriptor {
                door: Some(binary_sensor::DOOR),
                programs: Some(programs::DRYER),
                ..base
            },
            ApplianceKind::Washer => DeviceDescriptor {
                door: Some(binary_sensor::DOOR),
                programs: Some(programs::WASHER),
                ..base
            },
            ApplianceKind::WasherDryer => DeviceDescriptor {
                door: Some(binary_sensor::DOOR),
                programs: Some(programs::WASHER_DRYER),
                ..base
            },
            ApplianceKind::Dishwasher => DeviceDescriptor {
                door: Some(binary_sensor::DOOR),
                programs: Some(programs::DISHWASHER),
                lights: &[LightKind::Ambient],
                ..base
            },
            ApplianceKind::Oven => DeviceDescriptor {
                door: Some(binary_sensor::DOOR),
                programs: Some(programs::OVEN),
                power_off_state: keys::POWER_STANDBY,
                ..base
            },
            ApplianceKind::CoffeeMaker => DeviceDescriptor {
                programs: Some(programs::COFFEE_MAKER),
                power_off_state: keys::POWER_STANDBY,
                ..base
            },
            ApplianceKind::Hood => DeviceDescriptor {
                programs: Some(programs::HOOD),
                lights: &[LightKind::Functional, LightKind::Ambient],
                ..base
            },
            ApplianceKind::FridgeFreezer => DeviceDescriptor {
                door: Some(binary_sensor::DOOR),
                ..base
            },
            ApplianceKind::Hob => DeviceDescriptor {
                programs: Some(programs::HOB),
                ..base
            },
        }
    }

    /// Entities of this appliance type, in registration order: door, program sensors,
    /// program switches, power switch, lights.
    pub fn entity_specs(&self) -> Vec<EntitySpec> {
        let mut specs = Vec::new();

        if let Some(door) = self.door {
            specs.push(EntitySpec::BinarySensor(door));
        }

        if let Some(programs) = self.programs {
            specs.extend(sensor::PROGRAM_SENSORS.iter().copied().map(EntitySpec::Sensor));

            let mut seen = HashSet::new();
            let ambiguous: HashSet<&str> = programs
                .iter()
                .map(|p| keys::last_segment(p))
                .filter(|segment| !seen.insert(*segment))
                .collect();

            for program in programs.iter().copied() {
                let description = if ambiguous.contains(keys::last_segment(program)) {
                    qualified_program_description(program)
                } else {
                    program_description(program)
                };
                specs.push(EntitySpec::ProgramSwitch {
                    program,
                    description,
                });
            }
        }

        specs.push(EntitySpec::PowerSwitch {
            power_off_state: self.power_off_state,
        });

        specs.extend(self.lights.iter().copied().map(EntitySpec::Light));

        specs
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    fn render(kind: ApplianceKind) -> String {
        DeviceDescriptor::for_kind(kind)
            .entity_specs()
            .iter()
            .map(|spec| format!("{}: {}", spec.platform(), spec.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_from_type() {
        assert_eq!(ApplianceKind::from_type("Oven"), Some(ApplianceKind::Oven));
        assert_eq!(
            ApplianceKind::from_type("WasherDryer"),
            Some(ApplianceKind::WasherDryer)
        );
        assert_eq!(ApplianceKind::from_type("oven"), None);
        assert_eq!(ApplianceKind::from_type("Refrigerator"), None);
    }

    #[test]
    fn test_type_names_round_trip() {
        for kind in ApplianceKind::iter() {
            assert_eq!(ApplianceKind::from_type(&kind.to_string()), Some(kind));
        }
    }

    #[test]
    fn test_every_appliance_has_power_switch() {
        for kind in ApplianceKind::iter() {
            let specs = DeviceDescriptor::for_kind(kind).entity_specs();
            let power = specs
                .iter()
                .filter(|s| matches!(s, EntitySpec::PowerSwitch { .. }))
                .count();
            assert_eq!(power, 1, "{kind}");
        }
    }

    #[test]
    fn test_power_off_state() {
        assert_eq!(
            DeviceDescriptor::for_kind(ApplianceKind::Oven).power_off_state,
            keys::POWER_STANDBY
        );
        assert_eq!(
            DeviceDescriptor::for_kind(ApplianceKind::CoffeeMaker).power_off_state,
            keys::POWER_STANDBY
        );
        assert_eq!(
            DeviceDescriptor::for_kind(ApplianceKind::Dishwasher).power_off_state,
            keys::POWER_OFF
        );
    }

    #[test]
    fn test_descriptions_unique_per_appliance() {
        for kind in ApplianceKind::iter() {
            let specs = DeviceDescriptor::for_kind(kind).entity_specs();
            let mut seen = HashSet::new();
            for spec in &specs {
                assert!(seen.insert(spec.description().to_string()), "{kind}: {}", spec.description());
            }
        }
    }

    #[test]
    fn test_washer_dryer_disambiguates_shared_programs() {
        let specs = DeviceDescriptor::for_kind(ApplianceKind::WasherDryer).entity_specs();
        let descriptions: Vec<_> = specs.iter().map(|s| s.description().to_string()).collect();
        assert!(descriptions.contains(&"Program Washer Cotton".to_string()));
        assert!(descriptions.contains(&"Program Dryer Cotton".to_string()));
        assert!(descriptions.contains(&"Program CottonEco".to_string()));
        assert!(!descriptions.contains(&"Program Cotton".to_string()));
    }

    #[test]
    fn test_fridge_freezer_entities() {
        insta::assert_snapshot!(render(ApplianceKind::FridgeFreezer), @r"
        binary_sensor: Door
        switch: Power
        ");
    }

    #[test]
    fn test_hood_entities() {
        insta::assert_snapshot!(render(ApplianceKind::Hood), @r"
        sensor: Remaining Program Time
        sensor: Elapsed Program Time
        sensor: Duration
        sensor: Program Progress
        sensor: Operation State
        switch: Program Automatic
        switch: Program Venting
        switch: Program DelayedShutOff
        switch: Power
        light: Light
        light: AmbientLight
        ");
    }

    #[test]
    fn test_hob_entities() {
        insta::assert_snapshot!(render(ApplianceKind::Hob), @r"
        sensor: Remaining Program Time
        sensor: Elapsed Program Time
        sensor: Duration
        sensor: Program Progress
        sensor: Operation State
        switch: Program PowerLevelMode
        switch: Power
        ");
    }

    #[test]
    fn test_entity_counts() {
        let count = |kind| DeviceDescriptor::for_kind(kind).entity_specs().len();
        let sensors = sensor::PROGRAM_SENSORS.len();
        assert_eq!(count(ApplianceKind::Dryer), 1 + sensors + 16 + 1);
        assert_eq!(count(ApplianceKind::Washer), 1 + sensors + 21 + 1);
        assert_eq!(count(ApplianceKind::WasherDryer), 1 + sensors + 37 + 1);
        assert_eq!(count(ApplianceKind::Dishwasher), 1 + sensors + 22 + 1 + 1);
        assert_eq!(count(ApplianceKind::Oven), 1 + sensors + 14 + 1);
        assert_eq!(count(ApplianceKind::CoffeeMaker), sensors + 29 + 1);
    }
}
