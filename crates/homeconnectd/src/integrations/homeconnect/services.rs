//! Appliance-level services that have no entity counterpart.

use serde_json::Value;
use strum::EnumString;
use strum::IntoStaticStr;

use super::client::ApplianceRequest;
use super::keys;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ServiceError {
    #[error("Unknown service: {0}")]
    Unknown(String),

    #[error("Service {0} requires field '{1}'")]
    MissingField(&'static str, &'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
enum ServiceName {
    SelectProgram,
    PauseProgram,
    ResumeProgram,
    SetOptionActive,
    SetOptionSelected,
    ChangeSetting,
}

/// A parsed service call
#[derive(Debug, Clone, PartialEq)]
pub enum Service {
    SelectProgram { program: String },
    PauseProgram,
    ResumeProgram,
    SetOptionActive { key: String, value: String },
    SetOptionSelected { key: String, value: String },
    ChangeSetting { key: String, value: String },
}

/// Values of key/value services are sent as strings, whatever JSON type they arrive as
fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Service {
    pub fn parse(name: &str, data: &Value) -> Result<Self, ServiceError> {
        let service: ServiceName = name
            .parse()
            .map_err(|_| ServiceError::Unknown(name.to_string()))?;
        let service_name: &'static str = service.into();

        let string_field = |field: &'static str| {
            data.get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(ServiceError::MissingField(service_name, field))
        };
        let key_value = || -> Result<(String, String), ServiceError> {
            let key = string_field("key")?;
            let value = data
                .get("value")
                .filter(|v| !v.is_null())
                .map(coerce_to_string)
                .ok_or(ServiceError::MissingField(service_name, "value"))?;
            Ok((key, value))
        };

        Ok(match service {
            ServiceName::SelectProgram => Service::SelectProgram {
                program: string_field("program")?,
            },
            ServiceName::PauseProgram => Service::PauseProgram,
            ServiceName::ResumeProgram => Service::ResumeProgram,
            ServiceName::SetOptionActive => {
                let (key, value) = key_value()?;
                Service::SetOptionActive { key, value }
            }
            ServiceName::SetOptionSelected => {
                let (key, value) = key_value()?;
                Service::SetOptionSelected { key, value }
            }
            ServiceName::ChangeSetting => {
                let (key, value) = key_value()?;
                Service::ChangeSetting { key, value }
            }
        })
    }

    pub fn request(&self) -> ApplianceRequest {
        match self {
            Service::SelectProgram { program } => ApplianceRequest::SelectProgram {
                program: program.clone(),
            },
            Service::PauseProgram => ApplianceRequest::Command {
                key: keys::COMMAND_PAUSE_PROGRAM.to_string(),
            },
            Service::ResumeProgram => ApplianceRequest::Command {
                key: keys::COMMAND_RESUME_PROGRAM.to_string(),
            },
            Service::SetOptionActive { key, value } => ApplianceRequest::SetActiveOption {
                key: key.clone(),
                value: Value::String(value.clone()),
            },
            Service::SetOptionSelected { key, value } => ApplianceRequest::SetSelectedOption {
                key: key.clone(),
                value: Value::String(value.clone()),
            },
            Service::ChangeSetting { key, value } => ApplianceRequest::SetSetting {
                key: key.clone(),
                value: Value::String(value.clone()),
            },
        }
    }
}
