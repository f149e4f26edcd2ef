pub mod config;
pub mod drive;
pub mod geometry;
pub mod gimbal;
pub mod joystick;
pub mod protocol;
pub mod session;

pub use config::{ControlConfig, JoystickConfig};
pub use drive::{Direction, DriveCommand, map_drive};
pub use geometry::{Point, WidgetRect};
pub use gimbal::{GimbalDelta, map_gimbal};
pub use joystick::{JoystickListener, JoystickTracker, PointerId};
pub use protocol::{ConnState, GeoPoint, InboundEvent, OutboundEvent, ProtocolError};
pub use session::{
    CommandSink, DriveInput, GimbalInput, MapSurface, SessionCoordinator, VehicleDisplayState,
};
