use crate::config::ControlConfig;
use crate::drive::DRIVE_DEAD_ZONE;
use crate::geometry::Point;

/// Incremental gimbal movement in degrees, each component bounded by
/// the configured angle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GimbalDelta {
    pub horizontal: i16,
    pub vertical: i16,
}

/// Convert a normalized joystick vector into an angle delta. Returns `None`
/// inside the dead zone. The vertical axis is inverted so pushing up raises
/// the camera. Deltas are incremental, so there is no dedup against the
/// previous sample.
pub fn map_gimbal(input: Point, config: &ControlConfig) -> Option<GimbalDelta> {
    if input.x.abs() < DRIVE_DEAD_ZONE && input.y.abs() < DRIVE_DEAD_ZONE {
        return None;
    }

    let step = f32::from(config.angle_step);
    Some(GimbalDelta {
        horizontal: (input.x * step).round() as i16,
        vertical: (-input.y * step).round() as i16,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ControlConfig {
        ControlConfig::default()
    }

    #[test]
    fn dead_zone_produces_no_delta() {
        assert_eq!(map_gimbal(Point::new(0.19, -0.19), &config()), None);
        assert_eq!(map_gimbal(Point::ZERO, &config()), None);
    }

    #[test]
    fn vertical_axis_is_inverted() {
        // Push up (negative y in widget space) raises the camera.
        let delta = map_gimbal(Point::new(0.0, -1.0), &config()).unwrap();
        assert_eq!(delta.horizontal, 0);
        assert_eq!(delta.vertical, 5);
    }

    #[test]
    fn delta_is_bounded_by_angle_step() {
        let delta = map_gimbal(Point::new(1.0, 1.0), &config()).unwrap();
        assert_eq!(delta.horizontal, 5);
        assert_eq!(delta.vertical, -5);
    }

    #[test]
    fn partial_deflection_rounds_to_nearest_degree() {
        let delta = map_gimbal(Point::new(0.5, -0.3), &config()).unwrap();
        assert_eq!(delta.horizontal, 3);
        assert_eq!(delta.vertical, 2);
    }
}
