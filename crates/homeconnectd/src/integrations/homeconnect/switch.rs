use std::collections::BTreeMap;

use serde_json::Value;
use serde_json::json;

use super::appliance::StatusMap;
use super::client::ApplianceRequest;
use super::keys;
use crate::engine::SwitchState;

/// Switch that runs one program while on
#[derive(Debug, Clone)]
pub struct ProgramSwitch {
    pub program: &'static str,
    pub state: SwitchState,
}

impl ProgramSwitch {
    pub fn new(program: &'static str) -> Self {
        Self {
            program,
            state: SwitchState::default(),
        }
    }

    /// Program switches are always available; on iff their program is the active one
    pub fn evaluate(program: &str, status: &StatusMap) -> bool {
        status.str_value(keys::ACTIVE_PROGRAM) == Some(program)
    }

    pub fn update_state(&mut self, status: &StatusMap) -> bool {
        let on = Some(Self::evaluate(self.program, status));
        if self.state.on == on {
            return false;
        }
        self.state.on = on;
        true
    }

    pub fn command(&self, on: bool) -> ApplianceRequest {
        if on {
            ApplianceRequest::StartProgram {
                program: self.program.to_string(),
            }
        } else {
            ApplianceRequest::StopProgram
        }
    }
}

/// Appliance power switch
#[derive(Debug, Clone)]
pub struct PowerSwitch {
    /// Power state the appliance is put into when switched off (Off or Standby)
    pub power_off_state: &'static str,
    pub state: SwitchState,
}

impl PowerSwitch {
    pub fn new(power_off_state: &'static str) -> Self {
        Self {
            power_off_state,
            state: SwitchState::default(),
        }
    }

    /// Power state first, falling back to the operation state. `None` means unavailable.
    pub fn evaluate(power_off_state: &str, status: &StatusMap) -> Option<bool> {
        match status.str_value(keys::POWER_STATE) {
            Some(keys::POWER_ON) => return Some(true),
            Some(state) if state == power_off_state => return Some(false),
            _ => {}
        }

        match status.str_value(keys::OPERATION_STATE) {
            Some(state) if keys::OPERATION_STATES_ON.contains(&state) => Some(true),
            Some(keys::OPERATION_INACTIVE) => Some(false),
            _ => None,
        }
    }

    /// Every status entry, key and value reduced to snake_case of their last segment
    pub fn attributes(status: &StatusMap) -> BTreeMap<String, String> {
        status
            .iter()
            .map(|(key, entry)| {
                let value = match &entry.value {
                    Some(Value::String(s)) => keys::snake_case(keys::last_segment(s)),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                (keys::snake_case(keys::last_segment(key)), value)
            })
            .collect()
    }

    pub fn update_state(&mut self, status: &StatusMap) -> bool {
        let next = SwitchState {
            on: Self::evaluate(self.power_off_state, status),
            attributes: Self::attributes(status),
        };
        if next == self.state {
            return false;
        }
        self.state = next;
        true
    }

    pub fn command(&self, on: bool) -> ApplianceRequest {
        let value = if on { keys::POWER_ON } else { self.power_off_state };
        ApplianceRequest::SetSetting {
            key: keys::POWER_STATE.to_string(),
            value: json!(value),
        }
    }

    /// Record a rejected command: the appliance stays in the opposite state
    pub fn command_failed(&mut self, on: bool) -> bool {
        let next = Some(!on);
        if self.state.on == next {
            return false;
        }
        self.state.on = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(entries: &[(&str, &str)]) -> StatusMap {
        let mut status = StatusMap::new();
        for (key, value) in entries {
            status.set(*key, json!(value));
        }
        status
    }

    #[test]
    fn test_program_switch_follows_active_program() {
        let program = "Dishcare.Dishwasher.Program.Eco50";
        let mut switch = ProgramSwitch::new(program);

        assert!(switch.update_state(&StatusMap::new()));
        assert_eq!(switch.state.on, Some(false));

        let running = status(&[(keys::ACTIVE_PROGRAM, program)]);
        assert!(switch.update_state(&running));
        assert_eq!(switch.state.on, Some(true));

        let other = status(&[(keys::ACTIVE_PROGRAM, "Dishcare.Dishwasher.Program.Auto2")]);
        assert!(switch.update_state(&other));
        assert_eq!(switch.state.on, Some(false));
    }

    #[test]
    fn test_program_switch_commands() {
        let switch = ProgramSwitch::new("Cooking.Hob.Program.PowerLevelMode");
        assert_eq!(
            switch.command(true),
            ApplianceRequest::StartProgram {
                program: "Cooking.Hob.Program.PowerLevelMode".to_string()
            }
        );
        assert_eq!(switch.command(false), ApplianceRequest::StopProgram);
    }

    #[test]
    fn test_power_state_takes_precedence() {
        let on = status(&[
            (keys::POWER_STATE, keys::POWER_ON),
            (keys::OPERATION_STATE, keys::OPERATION_INACTIVE),
        ]);
        assert_eq!(PowerSwitch::evaluate(keys::POWER_OFF, &on), Some(true));

        let standby = status(&[(keys::POWER_STATE, keys::POWER_STANDBY)]);
        assert_eq!(PowerSwitch::evaluate(keys::POWER_STANDBY, &standby), Some(false));
    }

    #[test]
    fn test_power_falls_back_to_operation_state() {
        // Standby is not the off state of this appliance, so the operation state decides.
        let running = status(&[
            (keys::POWER_STATE, keys::POWER_STANDBY),
            (keys::OPERATION_STATE, keys::OPERATION_RUN),
        ]);
        assert_eq!(PowerSwitch::evaluate(keys::POWER_OFF, &running), Some(true));

        let inactive = status(&[(keys::OPERATION_STATE, keys::OPERATION_INACTIVE)]);
        assert_eq!(PowerSwitch::evaluate(keys::POWER_OFF, &inactive), Some(false));

        let unknown = status(&[(
            keys::OPERATION_STATE,
            "BSH.Common.EnumType.OperationState.Error",
        )]);
        assert_eq!(PowerSwitch::evaluate(keys::POWER_OFF, &unknown), None);
        assert_eq!(PowerSwitch::evaluate(keys::POWER_OFF, &StatusMap::new()), None);
    }

    #[test]
    fn test_power_commands_use_power_off_state() {
        let switch = PowerSwitch::new(keys::POWER_STANDBY);
        assert_eq!(
            switch.command(false),
            ApplianceRequest::SetSetting {
                key: keys::POWER_STATE.to_string(),
                value: json!(keys::POWER_STANDBY),
            }
        );
        assert_eq!(
            switch.command(true),
            ApplianceRequest::SetSetting {
                key: keys::POWER_STATE.to_string(),
                value: json!(keys::POWER_ON),
            }
        );
    }

    #[test]
    fn test_command_failed_reports_opposite() {
        let mut switch = PowerSwitch::new(keys::POWER_OFF);
        assert!(switch.command_failed(true));
        assert_eq!(switch.state.on, Some(false));
        assert!(!switch.command_failed(true));
    }

    #[test]
    fn test_attributes() {
        let mut status = status(&[
            (keys::DOOR_STATE, keys::DOOR_CLOSED),
            (keys::OPERATION_STATE, keys::OPERATION_DELAYED_START),
        ]);
        status.set("BSH.Common.Status.RemoteControlActive", json!(true));

        let attributes = PowerSwitch::attributes(&status);
        assert_eq!(attributes["door_state"], "closed");
        assert_eq!(attributes["operation_state"], "delayed_start");
        assert_eq!(attributes["remote_control_active"], "true");
    }
}
