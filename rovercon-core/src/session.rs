use crate::drive::{Direction, DriveCommand};
use crate::geometry::Point;
use crate::gimbal::GimbalDelta;
use crate::joystick::JoystickListener;
use crate::protocol::{GeoPoint, InboundEvent, OutboundEvent};
use crate::{ControlConfig, map_drive, map_gimbal};
use tracing::{debug, info, warn};

/// Duration hint attached to every drive command. Short, so a command that
/// stops arriving (connection loss, operator release) halts the vehicle.
pub const COMMAND_DURATION_SECS: f64 = 0.1;

/// Servo home position of the camera gimbal.
pub const INITIAL_HORIZONTAL_ANGLE: i16 = 80;
pub const INITIAL_VERTICAL_ANGLE: i16 = 40;

/// Radius assumed for obstacles the server reports without one, in meters.
pub const DEFAULT_OBSTACLE_RADIUS: f32 = 0.5;

/// Outbound half of the transport. Implementations must not block; a send
/// is best-effort and is superseded by the next dispatch, never retried.
pub trait CommandSink {
    fn send(&mut self, event: OutboundEvent);
}

/// Drawing surface for robot position and sensed obstacles. The coordinator
/// only pushes updates; rendering is the collaborator's business.
pub trait MapSurface {
    fn update_position(&mut self, position: GeoPoint, heading: f32);
    fn add_obstacle(&mut self, position: GeoPoint, radius: f32);
    fn clear_obstacles(&mut self);
    fn clear_path(&mut self);
}

/// Last-known vehicle state, the single source of truth for the readouts.
/// Mutated optimistically by local dispatch and authoritatively by inbound
/// server events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleDisplayState {
    pub direction: Direction,
    pub speed: u16,
    pub horizontal_angle: i16,
    pub vertical_angle: i16,
    pub robot_connected: bool,
    pub camera_connected: bool,
}

impl Default for VehicleDisplayState {
    fn default() -> Self {
        Self {
            direction: Direction::Stop,
            speed: 0,
            horizontal_angle: INITIAL_HORIZONTAL_ANGLE,
            vertical_angle: INITIAL_VERTICAL_ANGLE,
            robot_connected: false,
            camera_connected: false,
        }
    }
}

/// Owns the vehicle display state and the outbound dedup gate. All state is
/// mutated from the single console loop, so no synchronization is needed.
#[derive(Debug, Default)]
pub struct SessionCoordinator {
    state: VehicleDisplayState,
    last_sent: Option<DriveCommand>,
}

impl SessionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &VehicleDisplayState {
        &self.state
    }

    /// Send a drive command unless it matches the last one dispatched. The
    /// joystick samples continuously, so without this gate every frame would
    /// repeat the same command onto the wire.
    pub fn dispatch_drive(&mut self, command: DriveCommand, sink: &mut dyn CommandSink) {
        if self.last_sent == Some(command) {
            return;
        }

        self.last_sent = Some(command);
        if self.state.robot_connected {
            // Optimistic: the display follows the dispatch, the server
            // overwrites it when its own status arrives.
            self.state.direction = command.direction;
            self.state.speed = command.speed;
        }

        debug!(direction = %command.direction, speed = command.speed, "drive dispatch");
        sink.send(OutboundEvent::CarControl {
            direction: command.direction,
            speed: command.speed,
            duration: COMMAND_DURATION_SECS,
        });
    }

    /// Release path of the drive joystick: always dispatch a stop, even when
    /// the dedup gate believes the vehicle is already stopped. Guarantees a
    /// halt regardless of what the last sampled position was.
    pub fn release_drive(&mut self, sink: &mut dyn CommandSink) {
        let stop = DriveCommand::stop();
        self.last_sent = Some(stop);
        if self.state.robot_connected {
            self.state.direction = stop.direction;
            self.state.speed = stop.speed;
        }

        sink.send(OutboundEvent::CarControl {
            direction: stop.direction,
            speed: stop.speed,
            duration: COMMAND_DURATION_SECS,
        });
    }

    /// Gimbal deltas are incremental, so every qualifying sample goes out.
    /// Local angle state is not touched; authoritative angles arrive only
    /// via inbound events.
    pub fn dispatch_gimbal(&mut self, delta: GimbalDelta, sink: &mut dyn CommandSink) {
        sink.send(OutboundEvent::GimbalNudge {
            horizontal: delta.horizontal,
            vertical: delta.vertical,
        });
    }

    pub fn reset_gimbal(&mut self, sink: &mut dyn CommandSink) {
        sink.send(OutboundEvent::GimbalReset);
    }

    /// Apply a server-pushed event. Inbound state overwrites the display
    /// unconditionally; missing optional fields keep the previous values.
    pub fn handle_event(&mut self, event: InboundEvent, map: &mut dyn MapSurface) {
        match event {
            InboundEvent::Status(report) => {
                self.state.robot_connected = report.robot_status.is_connected();
                self.state.camera_connected = report.camera_status.is_connected();
                if let Some(angle) = report.horizontal_angle {
                    self.state.horizontal_angle = angle;
                }
                if let Some(angle) = report.vertical_angle {
                    self.state.vertical_angle = angle;
                }
            }
            InboundEvent::CarStatus(status) => {
                self.state.direction = status.direction;
                self.state.speed = status.speed;
            }
            InboundEvent::GimbalStatus(status) => {
                self.state.horizontal_angle = status.horizontal_angle;
                self.state.vertical_angle = status.vertical_angle;
            }
            InboundEvent::Slam(slam) => {
                if let Some(position) = slam.position {
                    map.update_position(position, slam.heading.unwrap_or(0.0));
                }
                if let Some(obstacles) = slam.obstacles {
                    map.clear_obstacles();
                    for obstacle in obstacles {
                        map.add_obstacle(
                            obstacle.position,
                            obstacle.radius.unwrap_or(DEFAULT_OBSTACLE_RADIUS),
                        );
                    }
                }
            }
            InboundEvent::Error(report) => {
                // Diagnostic only; there is no user-facing recovery flow.
                warn!(message = %report.message, "server error");
            }
            InboundEvent::Connected => {
                info!("transport connected");
            }
            InboundEvent::Disconnected => {
                info!("transport disconnected");
                self.state.robot_connected = false;
                self.state.camera_connected = false;
            }
        }
    }
}

/// Drive-side joystick adapter: the capability interface wiring tracker
/// callbacks to the coordinator.
pub struct DriveInput<'a> {
    pub session: &'a mut SessionCoordinator,
    pub sink: &'a mut dyn CommandSink,
    pub config: &'a ControlConfig,
}

impl JoystickListener for DriveInput<'_> {
    fn on_move(&mut self, vector: Point) {
        let command = map_drive(vector, self.config);
        self.session.dispatch_drive(command, self.sink);
    }

    fn on_end(&mut self, _vector: Point) {
        self.session.release_drive(self.sink);
    }
}

/// Gimbal-side joystick adapter. The camera stays where it is on release.
pub struct GimbalInput<'a> {
    pub session: &'a mut SessionCoordinator,
    pub sink: &'a mut dyn CommandSink,
    pub config: &'a ControlConfig,
}

impl JoystickListener for GimbalInput<'_> {
    fn on_move(&mut self, vector: Point) {
        if let Some(delta) = map_gimbal(vector, self.config) {
            self.session.dispatch_gimbal(delta, self.sink);
        }
    }

    fn on_end(&mut self, _vector: Point) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{
        CarStatus, ConnState, ErrorReport, GimbalStatus, SlamData, SlamObstacle, StatusReport,
    };

    #[derive(Default)]
    struct RecordingSink {
        sent: Vec<OutboundEvent>,
    }

    impl CommandSink for RecordingSink {
        fn send(&mut self, event: OutboundEvent) {
            self.sent.push(event);
        }
    }

    #[derive(Default)]
    struct RecordingMap {
        positions: Vec<(GeoPoint, f32)>,
        obstacles: Vec<(GeoPoint, f32)>,
        obstacle_clears: usize,
        path_clears: usize,
    }

    impl MapSurface for RecordingMap {
        fn update_position(&mut self, position: GeoPoint, heading: f32) {
            self.positions.push((position, heading));
        }

        fn add_obstacle(&mut self, position: GeoPoint, radius: f32) {
            self.obstacles.push((position, radius));
        }

        fn clear_obstacles(&mut self) {
            self.obstacles.clear();
            self.obstacle_clears += 1;
        }

        fn clear_path(&mut self) {
            self.path_clears += 1;
        }
    }

    fn connected_session() -> (SessionCoordinator, RecordingMap) {
        let mut session = SessionCoordinator::new();
        let mut map = RecordingMap::default();
        session.handle_event(
            InboundEvent::Status(StatusReport {
                robot_status: ConnState::Connected,
                camera_status: ConnState::Connected,
                horizontal_angle: None,
                vertical_angle: None,
            }),
            &mut map,
        );
        (session, map)
    }

    fn forward(speed: u16) -> DriveCommand {
        DriveCommand {
            direction: Direction::Forward,
            speed,
        }
    }

    #[test]
    fn repeated_drive_command_sends_once() {
        let (mut session, _) = connected_session();
        let mut sink = RecordingSink::default();

        session.dispatch_drive(forward(30), &mut sink);
        session.dispatch_drive(forward(30), &mut sink);

        assert_eq!(sink.sent.len(), 1);
    }

    #[test]
    fn changed_speed_passes_the_dedup_gate() {
        let (mut session, _) = connected_session();
        let mut sink = RecordingSink::default();

        session.dispatch_drive(forward(30), &mut sink);
        session.dispatch_drive(forward(25), &mut sink);

        assert_eq!(sink.sent.len(), 2);
        assert_eq!(session.state().speed, 25);
    }

    #[test]
    fn drive_dispatch_carries_duration_hint() {
        let (mut session, _) = connected_session();
        let mut sink = RecordingSink::default();

        session.dispatch_drive(forward(30), &mut sink);

        assert_eq!(
            sink.sent[0],
            OutboundEvent::CarControl {
                direction: Direction::Forward,
                speed: 30,
                duration: COMMAND_DURATION_SECS,
            }
        );
    }

    #[test]
    fn release_bypasses_dedup_gate() {
        let (mut session, _) = connected_session();
        let mut sink = RecordingSink::default();

        session.dispatch_drive(DriveCommand::stop(), &mut sink);
        session.release_drive(&mut sink);

        // Dedup state already said stop; the release still goes out.
        assert_eq!(sink.sent.len(), 2);
        assert_eq!(
            sink.sent[1],
            OutboundEvent::CarControl {
                direction: Direction::Stop,
                speed: 0,
                duration: COMMAND_DURATION_SECS,
            }
        );
    }

    #[test]
    fn gimbal_deltas_are_never_deduplicated() {
        let (mut session, _) = connected_session();
        let mut sink = RecordingSink::default();
        let delta = GimbalDelta {
            horizontal: 3,
            vertical: -2,
        };

        session.dispatch_gimbal(delta, &mut sink);
        session.dispatch_gimbal(delta, &mut sink);

        assert_eq!(sink.sent.len(), 2);
    }

    #[test]
    fn gimbal_dispatch_leaves_angles_untouched() {
        let (mut session, _) = connected_session();
        let mut sink = RecordingSink::default();

        session.dispatch_gimbal(
            GimbalDelta {
                horizontal: 5,
                vertical: 5,
            },
            &mut sink,
        );

        assert_eq!(session.state().horizontal_angle, INITIAL_HORIZONTAL_ANGLE);
        assert_eq!(session.state().vertical_angle, INITIAL_VERTICAL_ANGLE);
    }

    #[test]
    fn disconnect_flips_both_status_fields() {
        let (mut session, mut map) = connected_session();
        let mut sink = RecordingSink::default();
        session.dispatch_drive(forward(30), &mut sink);

        session.handle_event(InboundEvent::Disconnected, &mut map);

        assert!(!session.state().robot_connected);
        assert!(!session.state().camera_connected);
    }

    #[test]
    fn no_optimistic_updates_while_disconnected() {
        let mut session = SessionCoordinator::new();
        let mut sink = RecordingSink::default();

        session.dispatch_drive(forward(30), &mut sink);

        // The command still goes out, but the display stays authoritative.
        assert_eq!(sink.sent.len(), 1);
        assert_eq!(session.state().direction, Direction::Stop);
        assert_eq!(session.state().speed, 0);
    }

    #[test]
    fn car_status_overwrites_display() {
        let (mut session, mut map) = connected_session();

        session.handle_event(
            InboundEvent::CarStatus(CarStatus {
                direction: Direction::BackwardRight,
                speed: 12,
            }),
            &mut map,
        );

        assert_eq!(session.state().direction, Direction::BackwardRight);
        assert_eq!(session.state().speed, 12);
    }

    #[test]
    fn gimbal_status_overwrites_angles() {
        let (mut session, mut map) = connected_session();

        session.handle_event(
            InboundEvent::GimbalStatus(GimbalStatus {
                horizontal_angle: 95,
                vertical_angle: 20,
            }),
            &mut map,
        );

        assert_eq!(session.state().horizontal_angle, 95);
        assert_eq!(session.state().vertical_angle, 20);
    }

    #[test]
    fn status_without_angles_keeps_previous_values() {
        let (mut session, mut map) = connected_session();
        session.handle_event(
            InboundEvent::GimbalStatus(GimbalStatus {
                horizontal_angle: 100,
                vertical_angle: 10,
            }),
            &mut map,
        );

        session.handle_event(
            InboundEvent::Status(StatusReport {
                robot_status: ConnState::Connected,
                camera_status: ConnState::Connected,
                horizontal_angle: None,
                vertical_angle: None,
            }),
            &mut map,
        );

        assert_eq!(session.state().horizontal_angle, 100);
        assert_eq!(session.state().vertical_angle, 10);
    }

    #[test]
    fn slam_position_reaches_the_map_with_default_heading() {
        let (mut session, mut map) = connected_session();

        session.handle_event(
            InboundEvent::Slam(SlamData {
                position: Some(GeoPoint::new(1.5, 2.5)),
                heading: None,
                obstacles: None,
            }),
            &mut map,
        );

        assert_eq!(map.positions, vec![(GeoPoint::new(1.5, 2.5), 0.0)]);
    }

    #[test]
    fn slam_obstacles_replace_previous_set() {
        let (mut session, mut map) = connected_session();
        map.obstacles.push((GeoPoint::new(0.0, 0.0), 2.0));

        session.handle_event(
            InboundEvent::Slam(SlamData {
                position: None,
                heading: None,
                obstacles: Some(vec![SlamObstacle {
                    position: GeoPoint::new(3.0, 4.0),
                    radius: None,
                }]),
            }),
            &mut map,
        );

        assert_eq!(map.obstacle_clears, 1);
        assert_eq!(
            map.obstacles,
            vec![(GeoPoint::new(3.0, 4.0), DEFAULT_OBSTACLE_RADIUS)]
        );
    }

    #[test]
    fn error_events_do_not_change_state() {
        let (mut session, mut map) = connected_session();
        let before = *session.state();

        session.handle_event(
            InboundEvent::Error(ErrorReport {
                message: "servo fault".to_string(),
            }),
            &mut map,
        );

        assert_eq!(*session.state(), before);
    }

    #[test]
    fn drive_input_maps_and_dispatches() {
        let (mut session, _) = connected_session();
        let mut sink = RecordingSink::default();
        let config = ControlConfig::default();
        let mut input = DriveInput {
            session: &mut session,
            sink: &mut sink,
            config: &config,
        };

        input.on_move(Point::new(0.0, 1.0));
        input.on_end(Point::ZERO);

        assert_eq!(sink.sent.len(), 2);
        assert!(matches!(
            sink.sent[0],
            OutboundEvent::CarControl {
                direction: Direction::Forward,
                speed: 30,
                ..
            }
        ));
        assert!(matches!(
            sink.sent[1],
            OutboundEvent::CarControl {
                direction: Direction::Stop,
                speed: 0,
                ..
            }
        ));
    }

    #[test]
    fn gimbal_input_stays_quiet_in_dead_zone_and_on_release() {
        let mut session = SessionCoordinator::new();
        let mut sink = RecordingSink::default();
        let config = ControlConfig::default();
        let mut input = GimbalInput {
            session: &mut session,
            sink: &mut sink,
            config: &config,
        };

        input.on_move(Point::new(0.1, 0.1));
        input.on_end(Point::ZERO);
        assert!(sink.sent.is_empty());

        let mut input = GimbalInput {
            session: &mut session,
            sink: &mut sink,
            config: &config,
        };
        input.on_move(Point::new(1.0, 0.0));
        assert_eq!(
            sink.sent,
            vec![OutboundEvent::GimbalNudge {
                horizontal: 5,
                vertical: 0,
            }]
        );
    }
}
