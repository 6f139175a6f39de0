use serde_json::json;

use super::appliance::StatusMap;
use super::client::ApplianceRequest;
use super::keys;
use crate::engine::LightState;

/// Lowest brightness the appliances accept, in percent
const MIN_BRIGHTNESS_PERCENT: u8 = 10;

/// Which set of settings a light is driven by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    /// Hood work light (`Cooking.Common.Setting.Lighting*`)
    Functional,
    /// Ambient light with optional custom color (`BSH.Common.Setting.AmbientLight*`)
    Ambient,
}

impl LightKind {
    pub fn description(&self) -> &'static str {
        match self {
            LightKind::Functional => "Light",
            LightKind::Ambient => "AmbientLight",
        }
    }

    fn enabled_key(&self) -> &'static str {
        match self {
            LightKind::Functional => keys::COOKING_LIGHTING,
            LightKind::Ambient => keys::AMBIENT_LIGHT_ENABLED,
        }
    }

    fn brightness_key(&self) -> &'static str {
        match self {
            LightKind::Functional => keys::COOKING_LIGHTING_BRIGHTNESS,
            LightKind::Ambient => keys::AMBIENT_LIGHT_BRIGHTNESS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Light {
    pub kind: LightKind,
    pub state: LightState,
}

/// Host brightness (0-255) to vendor percent (10-100)
pub fn brightness_to_percent(brightness: u8) -> u8 {
    let percent = (f64::from(brightness) * 100.0 / 255.0).round() as u8;
    percent.max(MIN_BRIGHTNESS_PERCENT)
}

/// Vendor percent to host brightness (0-255)
pub fn percent_to_brightness(percent: f64) -> u8 {
    (percent.clamp(0.0, 100.0) * 255.0 / 100.0).round() as u8
}

/// Parse `#rrggbb`
pub fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

pub fn format_hex_color(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

impl Light {
    pub fn new(kind: LightKind) -> Self {
        Self {
            kind,
            state: LightState::default(),
        }
    }

    /// Compute the next state. A non-boolean on/off setting keeps the previous value.
    pub fn evaluate(kind: LightKind, status: &StatusMap, previous: &LightState) -> LightState {
        let on = status
            .value(kind.enabled_key())
            .and_then(|v| v.as_bool())
            .or(previous.on);

        let brightness = status
            .value(kind.brightness_key())
            .and_then(|v| v.as_f64())
            .map(percent_to_brightness);

        let rgb = match kind {
            LightKind::Functional => None,
            LightKind::Ambient => {
                if status.str_value(keys::AMBIENT_LIGHT_COLOR)
                    == Some(keys::AMBIENT_LIGHT_COLOR_CUSTOM)
                {
                    status
                        .str_value(keys::AMBIENT_LIGHT_CUSTOM_COLOR)
                        .and_then(parse_hex_color)
                } else {
                    None
                }
            }
        };

        LightState { on, brightness, rgb }
    }

    pub fn update_state(&mut self, status: &StatusMap) -> bool {
        let next = Self::evaluate(self.kind, status, &self.state);
        if next == self.state {
            return false;
        }
        self.state = next;
        true
    }

    /// Settings to write for a light command, in order
    pub fn commands(
        &self,
        on: bool,
        brightness: Option<u8>,
        rgb: Option<[u8; 3]>,
    ) -> Vec<ApplianceRequest> {
        let mut requests = vec![ApplianceRequest::SetSetting {
            key: self.kind.enabled_key().to_string(),
            value: json!(on),
        }];
        if !on {
            return requests;
        }

        if let Some(brightness) = brightness {
            requests.push(ApplianceRequest::SetSetting {
                key: self.kind.brightness_key().to_string(),
                value: json!(brightness_to_percent(brightness)),
            });
        }

        if let (LightKind::Ambient, Some(rgb)) = (self.kind, rgb) {
            requests.push(ApplianceRequest::SetSetting {
                key: keys::AMBIENT_LIGHT_COLOR.to_string(),
                value: json!(keys::AMBIENT_LIGHT_COLOR_CUSTOM),
            });
            requests.push(ApplianceRequest::SetSetting {
                key: keys::AMBIENT_LIGHT_CUSTOM_COLOR.to_string(),
                value: json!(format_hex_color(rgb)),
            });
        }

        requests
    }

    /// Record a rejected command: the light stays in the opposite state
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

    #[test]
    fn test_light_state_default() {
        let light = Light::new(LightKind::Functional);
        assert_eq!(light.state.on, None);
        assert_eq!(light.state.brightness, None);
    }

    #[test]
    fn test_functional_light_update_state() {
        let mut status = StatusMap::new();
        status.set(keys::COOKING_LIGHTING, json!(true));
        status.set(keys::COOKING_LIGHTING_BRIGHTNESS, json!(50));

        let mut light = Light::new(LightKind::Functional);
        assert!(light.update_state(&status));
        assert_eq!(light.state.on, Some(true));
        assert_eq!(light.state.brightness, Some(128));
        assert_eq!(light.state.rgb, None);
    }

    #[test]
    fn test_non_boolean_keeps_previous_state() {
        let mut light = Light::new(LightKind::Functional);
        light.state.on = Some(true);

        let mut status = StatusMap::new();
        status.set(keys::COOKING_LIGHTING, json!("maybe"));
        assert!(!light.update_state(&status));
        assert_eq!(light.state.on, Some(true));
    }

    #[test]
    fn test_ambient_custom_color() {
        let mut status = StatusMap::new();
        status.set(keys::AMBIENT_LIGHT_ENABLED, json!(true));
        status.set(keys::AMBIENT_LIGHT_COLOR, json!(keys::AMBIENT_LIGHT_COLOR_CUSTOM));
        status.set(keys::AMBIENT_LIGHT_CUSTOM_COLOR, json!("#ff8000"));

        let state = Light::evaluate(LightKind::Ambient, &status, &LightState::default());
        assert_eq!(state.on, Some(true));
        assert_eq!(state.rgb, Some([255, 128, 0]));

        status.set(
            keys::AMBIENT_LIGHT_COLOR,
            json!("BSH.Common.EnumType.AmbientLightColor.Color43"),
        );
        let state = Light::evaluate(LightKind::Ambient, &status, &LightState::default());
        assert_eq!(state.rgb, None);
    }

    #[test]
    fn test_turn_off_only_writes_enabled() {
        let light = Light::new(LightKind::Ambient);
        assert_eq!(
            light.commands(false, Some(200), Some([1, 2, 3])),
            vec![ApplianceRequest::SetSetting {
                key: keys::AMBIENT_LIGHT_ENABLED.to_string(),
                value: json!(false),
            }]
        );
    }

    #[test]
    fn test_turn_on_with_color_selects_custom_color_first() {
        let light = Light::new(LightKind::Ambient);
        let requests = light.commands(true, Some(0), Some([0x12, 0x34, 0x56]));
        assert_eq!(
            requests,
            vec![
                ApplianceRequest::SetSetting {
                    key: keys::AMBIENT_LIGHT_ENABLED.to_string(),
                    value: json!(true),
                },
                ApplianceRequest::SetSetting {
                    key: keys::AMBIENT_LIGHT_BRIGHTNESS.to_string(),
                    value: json!(10),
                },
                ApplianceRequest::SetSetting {
                    key: keys::AMBIENT_LIGHT_COLOR.to_string(),
                    value: json!(keys::AMBIENT_LIGHT_COLOR_CUSTOM),
                },
                ApplianceRequest::SetSetting {
                    key: keys::AMBIENT_LIGHT_CUSTOM_COLOR.to_string(),
                    value: json!("#123456"),
                },
            ]
        );
    }

    #[test]
    fn test_functional_light_ignores_color() {
        let light = Light::new(LightKind::Functional);
        let requests = light.commands(true, None, Some([1, 2, 3]));
        assert_eq!(requests.len(), 1);
    }

    #[test]
    fn test_brightness_conversion() {
        assert_eq!(brightness_to_percent(255), 100);
        assert_eq!(brightness_to_percent(128), 50);
        assert_eq!(brightness_to_percent(1), 10);
        assert_eq!(percent_to_brightness(100.0), 255);
        assert_eq!(percent_to_brightness(10.0), 26);
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#00ff7f"), Some([0, 255, 127]));
        assert_eq!(parse_hex_color("00ff7f"), None);
        assert_eq!(parse_hex_color("#00ff7"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
        assert_eq!(parse_hex_color("#+f+f+f"), None);
        assert_eq!(format_hex_color([0, 255, 127]), "#00ff7f");
    }

    #[test]
    fn test_command_failed_reports_opposite() {
        let mut light = Light::new(LightKind::Functional);
        assert!(light.command_failed(false));
        assert_eq!(light.state.on, Some(true));
    }
}
