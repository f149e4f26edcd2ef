use serde::{Deserialize, Serialize};

/// Movement and gimbal tunables. A partial JSON config file overrides only
/// the fields it names; everything else keeps the built-in default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Upper bound for the drive speed sent to the vehicle.
    pub max_speed: u16,
    /// Speed multiplier applied to sideways and rotation commands.
    pub turning_speed_factor: f32,
    /// Degrees of gimbal travel per qualifying joystick sample.
    pub angle_step: i16,
    pub joystick: JoystickConfig,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            max_speed: 30,
            turning_speed_factor: 0.7,
            angle_step: 5,
            joystick: JoystickConfig::default(),
        }
    }
}

impl ControlConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoystickConfig {
    /// Knob travel radius in device pixels.
    pub max_distance: f32,
    /// Per-axis threshold below which a normalized component reads as zero.
    pub dead_zone: f32,
    /// Snap the knob back to center on release.
    pub auto_return: bool,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            max_distance: 40.0,
            dead_zone: 0.2,
            auto_return: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let config = ControlConfig::from_json(r#"{"max_speed": 50}"#).unwrap();
        assert_eq!(config.max_speed, 50);
        assert_eq!(config.turning_speed_factor, 0.7);
        assert_eq!(config.angle_step, 5);
        assert_eq!(config.joystick.max_distance, 40.0);
    }

    #[test]
    fn nested_joystick_overrides_apply() {
        let config =
            ControlConfig::from_json(r#"{"joystick": {"dead_zone": 0.1, "auto_return": false}}"#)
                .unwrap();
        assert_eq!(config.joystick.dead_zone, 0.1);
        assert!(!config.joystick.auto_return);
        assert_eq!(config.joystick.max_distance, 40.0);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(ControlConfig::from_json("{max_speed}").is_err());
    }
}
