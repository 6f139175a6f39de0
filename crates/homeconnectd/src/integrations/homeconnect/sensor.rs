use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use tracing::warn;

use super::appliance::StatusMap;
use super::keys;
use crate::engine::SensorState;
use crate::engine::SensorValue;

/// How a raw status value is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// Raw number or string
    Plain,
    /// Seconds from now, reported as an absolute UTC timestamp
    Timestamp,
    /// Enum value reduced to its last dotted segment
    Enum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSpec {
    pub description: &'static str,
    pub key: &'static str,
    pub kind: SensorKind,
    pub unit: Option<&'static str>,
    pub icon: Option<&'static str>,
    pub device_class: Option<&'static str>,
}

/// Sensors created for every appliance that runs programs
pub const PROGRAM_SENSORS: &[SensorSpec] = &[
    SensorSpec {
        description: "Remaining Program Time",
        key: keys::OPTION_REMAINING_PROGRAM_TIME,
        kind: SensorKind::Timestamp,
        unit: None,
        icon: None,
        device_class: Some("timestamp"),
    },
    SensorSpec {
        description: "Elapsed Program Time",
        key: keys::OPTION_ELAPSED_PROGRAM_TIME,
        kind: SensorKind::Plain,
        unit: Some("s"),
        icon: Some("mdi:progress-clock"),
        device_class: None,
    },
    SensorSpec {
        description: "Duration",
        key: keys::OPTION_DURATION,
        kind: SensorKind::Plain,
        unit: Some("s"),
        icon: Some("mdi:update"),
        device_class: None,
    },
    SensorSpec {
        description: "Program Progress",
        key: keys::OPTION_PROGRAM_PROGRESS,
        kind: SensorKind::Plain,
        unit: Some("%"),
        icon: Some("mdi:progress-clock"),
        device_class: None,
    },
    SensorSpec {
        description: "Operation State",
        key: keys::OPERATION_STATE,
        kind: SensorKind::Enum,
        unit: None,
        icon: Some("mdi:state-machine"),
        device_class: None,
    },
];

/// `now + seconds`, or `None` when the offset is not representable
fn seconds_from(now: DateTime<Utc>, seconds: f64) -> Option<DateTime<Utc>> {
    let millis = (seconds * 1000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    let offset = Duration::try_milliseconds(millis as i64)?;
    now.checked_add_signed(offset)
}

#[derive(Debug, Clone)]
pub struct Sensor {
    pub spec: SensorSpec,
    pub state: SensorState,
}

impl Sensor {
    pub fn new(spec: SensorSpec) -> Self {
        Self {
            spec,
            state: SensorState::default(),
        }
    }

    /// Compute the next value from the status map.
    ///
    /// `previous` is the last reported value; timestamp sensors use it to stop
    /// reporting a countdown that has already run out.
    pub fn evaluate(
        spec: &SensorSpec,
        status: &StatusMap,
        previous: Option<&SensorValue>,
        now: DateTime<Utc>,
    ) -> Option<SensorValue> {
        let value = status.value(spec.key)?;

        match spec.kind {
            SensorKind::Timestamp => {
                if let Some(SensorValue::Timestamp(at)) = previous {
                    if *at < now {
                        return None;
                    }
                }
                let Some(seconds) = value.as_f64() else {
                    warn!("Non-numeric value for {}: {}", spec.key, value);
                    return None;
                };
                let at = seconds_from(now, seconds);
                if at.is_none() {
                    warn!("Out of range value for {}: {}", spec.key, value);
                }
                at.map(SensorValue::Timestamp)
            }
            SensorKind::Enum => value
                .as_str()
                .map(|s| SensorValue::Text(keys::last_segment(s).to_string()))
                .or_else(|| SensorValue::from_json(value)),
            SensorKind::Plain => SensorValue::from_json(value),
        }
    }

    /// Re-evaluate against the status map, returning whether the state changed
    pub fn update_state(&mut self, status: &StatusMap, now: DateTime<Utc>) -> bool {
        let next = SensorState {
            value: Self::evaluate(&self.spec, status, self.state.value.as_ref(), now),
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
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::integrations::homeconnect::appliance::StatusItem;

    fn spec(description: &str) -> SensorSpec {
        *PROGRAM_SENSORS
            .iter()
            .find(|s| s.description == description)
            .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_missing_key_is_unavailable() {
        let mut sensor = Sensor::new(spec("Program Progress"));
        assert!(!sensor.update_state(&StatusMap::new(), now()));
        assert!(!sensor.state.available());
    }

    #[test]
    fn test_plain_value() {
        let mut status = StatusMap::new();
        status.set(keys::OPTION_PROGRAM_PROGRESS, json!(42));

        let mut sensor = Sensor::new(spec("Program Progress"));
        assert!(sensor.update_state(&status, now()));
        assert_eq!(sensor.state.value, Some(SensorValue::Number(42.0)));
    }

    #[test]
    fn test_operation_state_reports_last_segment() {
        let mut status = StatusMap::new();
        status.set(keys::OPERATION_STATE, json!(keys::OPERATION_RUN));

        let value = Sensor::evaluate(&spec("Operation State"), &status, None, now());
        assert_eq!(value, Some(SensorValue::Text("Run".to_string())));
    }

    #[test]
    fn test_remaining_time_is_absolute() {
        let mut status = StatusMap::new();
        status.set(keys::OPTION_REMAINING_PROGRAM_TIME, json!(600));

        let value = Sensor::evaluate(&spec("Remaining Program Time"), &status, None, now());
        assert_eq!(
            value,
            Some(SensorValue::Timestamp(
                Utc.with_ymd_and_hms(2024, 3, 1, 12, 10, 0).unwrap()
            ))
        );
    }

    #[test]
    fn test_remaining_time_unavailable_once_elapsed() {
        let mut status = StatusMap::new();
        status.set(keys::OPTION_REMAINING_PROGRAM_TIME, json!(0));

        let elapsed = SensorValue::Timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 11, 59, 0).unwrap());
        let value = Sensor::evaluate(
            &spec("Remaining Program Time"),
            &status,
            Some(&elapsed),
            now(),
        );
        assert_eq!(value, None);

        // Once unavailable, the next poll reports the countdown again.
        let value = Sensor::evaluate(&spec("Remaining Program Time"), &status, None, now());
        assert_eq!(value, Some(SensorValue::Timestamp(now())));
    }

    #[test]
    fn test_remaining_time_out_of_range() {
        let spec = spec("Remaining Program Time");
        for seconds in [json!(1e15), json!(-1e300), json!(1e300)] {
            let mut status = StatusMap::new();
            status.set(keys::OPTION_REMAINING_PROGRAM_TIME, seconds);
            assert_eq!(Sensor::evaluate(&spec, &status, None, now()), None);
        }

        let mut sensor = Sensor::new(spec);
        let mut status = StatusMap::new();
        status.set(keys::OPTION_REMAINING_PROGRAM_TIME, json!(1e15));
        assert!(!sensor.update_state(&status, now()));
        assert!(!sensor.state.available());
    }

    #[test]
    fn test_entry_without_value_is_unavailable() {
        let status: StatusMap = [StatusItem {
            key: keys::OPTION_PROGRAM_PROGRESS.to_string(),
            value: None,
            unit: Some("%".to_string()),
        }]
        .into_iter()
        .collect();
        assert!(status.get(keys::OPTION_PROGRAM_PROGRESS).is_some());

        let mut sensor = Sensor::new(spec("Program Progress"));
        assert!(!sensor.update_state(&status, now()));
        assert_eq!(sensor.state.value, None);
    }

    #[test]
    fn test_program_sensor_table() {
        let table = PROGRAM_SENSORS
            .iter()
            .map(|s| {
                format!(
                    "{} | {} | {} | {} | {}",
                    s.description,
                    s.key,
                    s.unit.unwrap_or("-"),
                    s.icon.unwrap_or("-"),
                    s.device_class.unwrap_or("-")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        insta::assert_snapshot!(table, @r"
        Remaining Program Time | BSH.Common.Option.RemainingProgramTime | - | - | timestamp
        Elapsed Program Time | BSH.Common.Option.ElapsedProgramTime | s | mdi:progress-clock | -
        Duration | BSH.Common.Option.Duration | s | mdi:update | -
        Program Progress | BSH.Common.Option.ProgramProgress | % | mdi:progress-clock | -
        Operation State | BSH.Common.Status.OperationState | - | mdi:state-machine | -
        ");
    }
}
