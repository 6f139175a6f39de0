use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// Appliance as returned by `GET /api/homeappliances`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplianceInfo {
    #[serde(rename = "haId")]
    pub ha_id: String,

    pub name: String,

    #[serde(rename = "type")]
    pub appliance_type: String,

    #[serde(default)]
    pub brand: Option<String>,

    /// Vendor model number
    #[serde(default)]
    pub vib: Option<String>,

    #[serde(default)]
    pub enumber: Option<String>,

    #[serde(default)]
    pub connected: bool,
}

/// One `{key, value, unit}` entry of a status, settings, options or event payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusItem {
    pub key: String,

    #[serde(default)]
    pub value: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Latest known value of a status key
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusEntry {
    pub value: Option<serde_json::Value>,
    pub unit: Option<String>,
}

/// Everything known about one appliance: status, settings, active program and its options,
/// merged into a single map keyed by vendor key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusMap {
    entries: BTreeMap<String, StatusEntry>,
}

impl StatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&StatusEntry> {
        self.entries.get(key)
    }

    /// Value of a key, `None` when the key is absent or carries no value
    pub fn value(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key).and_then(|e| e.value.as_ref())
    }

    /// String value of a key, `None` when absent or not a string
    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.value(key).and_then(|v| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        let entry = self.entries.entry(key.into()).or_default();
        entry.value = Some(value);
    }

    /// Merge vendor items into the map, replacing known keys
    pub fn merge(&mut self, items: impl IntoIterator<Item = StatusItem>) {
        for item in items {
            let entry = self.entries.entry(item.key).or_default();
            entry.value = item.value;
            if item.unit.is_some() {
                entry.unit = item.unit;
            }
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: StatusEntry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StatusEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<StatusItem> for StatusMap {
    fn from_iter<T: IntoIterator<Item = StatusItem>>(iter: T) -> Self {
        let mut map = Self::new();
        map.merge(iter);
        map
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_appliance_info() {
        let appliance: ApplianceInfo = serde_json::from_value(json!({
            "name": "Oven",
            "brand": "Siemens",
            "vib": "HB676G5S6",
            "connected": true,
            "type": "Oven",
            "enumber": "HB676G5S6/01",
            "haId": "SIEMENS-HB676G5S6-68A40E3B2E6B"
        }))
        .unwrap();

        assert_eq!(appliance.ha_id, "SIEMENS-HB676G5S6-68A40E3B2E6B");
        assert_eq!(appliance.appliance_type, "Oven");
        assert_eq!(appliance.vib.as_deref(), Some("HB676G5S6"));
        assert!(appliance.connected);
    }

    #[test]
    fn test_merge_keeps_unit_when_missing() {
        let mut status: StatusMap = vec![StatusItem {
            key: "BSH.Common.Option.RemainingProgramTime".to_string(),
            value: Some(json!(600)),
            unit: Some("seconds".to_string()),
        }]
        .into_iter()
        .collect();

        status.merge(vec![StatusItem {
            key: "BSH.Common.Option.RemainingProgramTime".to_string(),
            value: Some(json!(540)),
            unit: None,
        }]);

        let entry = status.get("BSH.Common.Option.RemainingProgramTime").unwrap();
        assert_eq!(entry.value, Some(json!(540)));
        assert_eq!(entry.unit.as_deref(), Some("seconds"));
    }

    #[test]
    fn test_value_accessors() {
        let mut status = StatusMap::new();
        status.set("BSH.Common.Status.DoorState", json!("BSH.Common.EnumType.DoorState.Open"));
        status.set("Cooking.Common.Setting.Lighting", json!(true));

        assert_eq!(
            status.str_value("BSH.Common.Status.DoorState"),
            Some("BSH.Common.EnumType.DoorState.Open")
        );
        assert_eq!(status.str_value("Cooking.Common.Setting.Lighting"), None);
        assert_eq!(status.value("missing"), None);
        assert_eq!(status.len(), 2);
    }
}
