//! Home Connect key vocabulary.
//!
//! Keys and enum values are namespaced strings defined by the vendor API, see
//! <https://api-docs.home-connect.com/>.

pub const POWER_STATE: &str = "BSH.Common.Setting.PowerState";
pub const POWER_ON: &str = "BSH.Common.EnumType.PowerState.On";
pub const POWER_OFF: &str = "BSH.Common.EnumType.PowerState.Off";
pub const POWER_STANDBY: &str = "BSH.Common.EnumType.PowerState.Standby";

/// Synthetic status entry holding the key of the running program
pub const ACTIVE_PROGRAM: &str = "BSH.Common.Root.ActiveProgram";

pub const OPERATION_STATE: &str = "BSH.Common.Status.OperationState";
pub const OPERATION_READY: &str = "BSH.Common.EnumType.OperationState.Ready";
pub const OPERATION_DELAYED_START: &str = "BSH.Common.EnumType.OperationState.DelayedStart";
pub const OPERATION_RUN: &str = "BSH.Common.EnumType.OperationState.Run";
pub const OPERATION_PAUSE: &str = "BSH.Common.EnumType.OperationState.Pause";
pub const OPERATION_ACTION_REQUIRED: &str = "BSH.Common.EnumType.OperationState.ActionRequired";
pub const OPERATION_ABORTING: &str = "BSH.Common.EnumType.OperationState.Aborting";
pub const OPERATION_FINISHED: &str = "BSH.Common.EnumType.OperationState.Finished";
pub const OPERATION_INACTIVE: &str = "BSH.Common.EnumType.OperationState.Inactive";

/// Operation states during which the appliance counts as powered on
pub const OPERATION_STATES_ON: &[&str] = &[
    OPERATION_READY,
    OPERATION_DELAYED_START,
    OPERATION_RUN,
    OPERATION_PAUSE,
    OPERATION_ACTION_REQUIRED,
    OPERATION_ABORTING,
    OPERATION_FINISHED,
];

pub const DOOR_STATE: &str = "BSH.Common.Status.DoorState";
pub const DOOR_OPEN: &str = "BSH.Common.EnumType.DoorState.Open";
pub const DOOR_CLOSED: &str = "BSH.Common.EnumType.DoorState.Closed";
pub const DOOR_LOCKED: &str = "BSH.Common.EnumType.DoorState.Locked";

pub const COOKING_LIGHTING: &str = "Cooking.Common.Setting.Lighting";
pub const COOKING_LIGHTING_BRIGHTNESS: &str = "Cooking.Common.Setting.LightingBrightness";

pub const AMBIENT_LIGHT_ENABLED: &str = "BSH.Common.Setting.AmbientLightEnabled";
pub const AMBIENT_LIGHT_BRIGHTNESS: &str = "BSH.Common.Setting.AmbientLightBrightness";
pub const AMBIENT_LIGHT_COLOR: &str = "BSH.Common.Setting.AmbientLightColor";
pub const AMBIENT_LIGHT_CUSTOM_COLOR: &str = "BSH.Common.Setting.AmbientLightCustomColor";
pub const AMBIENT_LIGHT_COLOR_CUSTOM: &str = "BSH.Common.EnumType.AmbientLightColor.CustomColor";

pub const COMMAND_PAUSE_PROGRAM: &str = "BSH.Common.Command.PauseProgram";
pub const COMMAND_RESUME_PROGRAM: &str = "BSH.Common.Command.ResumeProgram";

pub const OPTION_REMAINING_PROGRAM_TIME: &str = "BSH.Common.Option.RemainingProgramTime";
pub const OPTION_ELAPSED_PROGRAM_TIME: &str = "BSH.Common.Option.ElapsedProgramTime";
pub const OPTION_DURATION: &str = "BSH.Common.Option.Duration";
pub const OPTION_PROGRAM_PROGRESS: &str = "BSH.Common.Option.ProgramProgress";

/// Last dotted segment of a key or enum value (`...OperationState.Run` -> `Run`)
pub fn last_segment(key: &str) -> &str {
    key.rsplit('.').next().unwrap_or(key)
}

/// Convert a CamelCase identifier to snake_case (`DoorState` -> `door_state`)
pub fn snake_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    let chars: Vec<char> = ident.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower =
                i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if prev_lower || (prev_upper && next_lower) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment(OPERATION_RUN), "Run");
        assert_eq!(last_segment("Cooking.Hob.Program.PowerLevelMode"), "PowerLevelMode");
        assert_eq!(last_segment("plain"), "plain");
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("DoorState"), "door_state");
        assert_eq!(snake_case("RemoteControlStartAllowed"), "remote_control_start_allowed");
        assert_eq!(snake_case("Run"), "run");
        assert_eq!(snake_case("Super40"), "super40");
        assert_eq!(snake_case("HTTPServer"), "http_server");
    }
}
