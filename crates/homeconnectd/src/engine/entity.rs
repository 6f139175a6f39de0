//! Entity metadata shared between integrations and the engine.

use serde::Deserialize;
use serde::Serialize;
use strum::Display;
use strum::EnumString;

/// Entity platform, used as the prefix of entity ids (e.g. `switch.oven_power`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    BinarySensor,
    Sensor,
    Switch,
    Light,
}

/// Static description of an entity, reported once on discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityInfo {
    /// Entity ID (e.g., "switch.oven_power")
    pub entity_id: String,

    /// Identifier that is stable across restarts and renames
    pub unique_id: String,

    /// Human-readable name
    pub name: String,

    pub platform: Platform,

    /// Id of the owning device, if any
    pub device_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Turn a display name into the object part of an entity id.
///
/// Lowercases ASCII alphanumerics and joins every other run of characters into a single `_`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("unnamed");
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_display() {
        assert_eq!(Platform::BinarySensor.to_string(), "binary_sensor");
        assert_eq!(Platform::Light.to_string(), "light");
        assert_eq!("switch".parse::<Platform>().unwrap(), Platform::Switch);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Oven Door"), "oven_door");
        assert_eq!(slugify("Washer Program Cotton.CottonEco"), "washer_program_cotton_cottoneco");
        assert_eq!(slugify("  Küche -- Hood  "), "k_che_hood");
        assert_eq!(slugify("---"), "unnamed");
    }
}
