use crate::config::ControlConfig;
use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete drive commands understood by the vehicle. Serialized names are
/// the wire strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Stop,
    Forward,
    Backward,
    Left,
    Right,
    ForwardLeft,
    ForwardRight,
    BackwardLeft,
    BackwardRight,
    TurnLeft,
    TurnRight,
}

impl Direction {
    /// Human-readable form for the status readout.
    pub fn label(self) -> &'static str {
        match self {
            Direction::Stop => "Stopped",
            Direction::Forward => "Forward",
            Direction::Backward => "Backward",
            Direction::Left => "Left",
            Direction::Right => "Right",
            Direction::ForwardLeft => "Forward Left",
            Direction::ForwardRight => "Forward Right",
            Direction::BackwardLeft => "Backward Left",
            Direction::BackwardRight => "Backward Right",
            Direction::TurnLeft => "Turn Left",
            Direction::TurnRight => "Turn Right",
        }
    }

    fn is_turning(self) -> bool {
        matches!(
            self,
            Direction::Left | Direction::Right | Direction::TurnLeft | Direction::TurnRight
        )
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveCommand {
    pub direction: Direction,
    pub speed: u16,
}

impl DriveCommand {
    pub fn stop() -> Self {
        Self {
            direction: Direction::Stop,
            speed: 0,
        }
    }
}

/// Combined dead zone for the drive mapper, fixed at the integration layer
/// independently of the tracker's own dead zone.
pub const DRIVE_DEAD_ZONE: f32 = 0.2;

/// Thresholds for the pure-rotation override: a nearly horizontal vector is
/// treated as rotation in place regardless of its angle sector.
pub const TURN_OVERRIDE_MIN_X: f32 = 0.7;
pub const TURN_OVERRIDE_MAX_Y: f32 = 0.3;

/// Classify a normalized joystick vector into a discrete drive command.
pub fn map_drive(input: Point, config: &ControlConfig) -> DriveCommand {
    if input.x.abs() < DRIVE_DEAD_ZONE && input.y.abs() < DRIVE_DEAD_ZONE {
        return DriveCommand::stop();
    }

    let max_speed = f32::from(config.max_speed);
    let mut speed = (input.magnitude() * max_speed).min(max_speed).round() as u16;

    let angle = input.y.atan2(input.x).to_degrees();
    let mut direction = direction_for_angle(angle);

    if direction.is_turning() {
        speed = (f32::from(speed) * config.turning_speed_factor).round() as u16;
    }

    // Nearly pure horizontal deflection reads as rotation in place. Takes
    // precedence over the sector classification above.
    if input.x.abs() > TURN_OVERRIDE_MIN_X && input.y.abs() < TURN_OVERRIDE_MAX_Y {
        direction = if input.x > 0.0 {
            Direction::TurnRight
        } else {
            Direction::TurnLeft
        };
        speed = (input.x.abs() * max_speed * config.turning_speed_factor).round() as u16;
    }

    DriveCommand { direction, speed }
}

/// Fixed 8-sector lookup over (-180, 180], 45 degrees per sector, half-open
/// boundaries at odd multiples of 22.5. The wrap-around sector at the +/-180
/// seam maps to `Left`.
fn direction_for_angle(angle: f32) -> Direction {
    if angle > -22.5 && angle <= 22.5 {
        Direction::Right
    } else if angle > 22.5 && angle <= 67.5 {
        Direction::ForwardRight
    } else if angle > 67.5 && angle <= 112.5 {
        Direction::Forward
    } else if angle > 112.5 && angle <= 157.5 {
        Direction::ForwardLeft
    } else if angle > 157.5 || angle <= -157.5 {
        Direction::Left
    } else if angle <= -112.5 {
        Direction::BackwardLeft
    } else if angle <= -67.5 {
        Direction::Backward
    } else {
        Direction::BackwardRight
    }
}
