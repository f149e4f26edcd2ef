use crate::drive::Direction;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::error::Error;
use std::fmt;

/// Connectivity state as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnState {
    Connected,
    Disconnected,
}

impl ConnState {
    pub fn is_connected(self) -> bool {
        matches!(self, ConnState::Connected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Events sent to the vehicle. Fire-and-forget, no acknowledgement; the
/// envelope is `{ "event": name, "data": payload }`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutboundEvent {
    CarControl {
        direction: Direction,
        speed: u16,
        duration: f64,
    },
    GimbalNudge {
        horizontal: i16,
        vertical: i16,
    },
    GimbalReset,
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::CarControl { .. } => "car_control",
            OutboundEvent::GimbalNudge { .. } | OutboundEvent::GimbalReset => "gimbal_control",
        }
    }

    pub fn payload(&self) -> Value {
        match *self {
            OutboundEvent::CarControl {
                direction,
                speed,
                duration,
            } => json!({
                "direction": direction,
                "speed": speed,
                "duration": duration,
            }),
            OutboundEvent::GimbalNudge {
                horizontal,
                vertical,
            } => json!({
                "horizontal": horizontal,
                "vertical": vertical,
            }),
            OutboundEvent::GimbalReset => json!({ "action": "reset" }),
        }
    }
}

/// `status` payload. Angles are optional; absent fields leave the display
/// at its previous value.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct StatusReport {
    pub robot_status: ConnState,
    pub camera_status: ConnState,
    #[serde(default)]
    pub horizontal_angle: Option<i16>,
    #[serde(default)]
    pub vertical_angle: Option<i16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CarStatus {
    pub direction: Direction,
    pub speed: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GimbalStatus {
    pub horizontal_angle: i16,
    pub vertical_angle: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SlamObstacle {
    pub position: GeoPoint,
    #[serde(default)]
    pub radius: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct SlamData {
    #[serde(default)]
    pub position: Option<GeoPoint>,
    #[serde(default)]
    pub heading: Option<f32>,
    #[serde(default)]
    pub obstacles: Option<Vec<SlamObstacle>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorReport {
    pub message: String,
}

/// Events consumed by the session coordinator. `Connected`/`Disconnected`
/// are lifecycle signals injected by the transport, not wire messages.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Status(StatusReport),
    CarStatus(CarStatus),
    GimbalStatus(GimbalStatus),
    Slam(SlamData),
    Error(ErrorReport),
    Connected,
    Disconnected,
}

impl InboundEvent {
    /// Decode a server event by name. Unknown names and malformed payloads
    /// are reported, not panicked on; the caller drops the event so display
    /// state keeps its previous values.
    pub fn parse(event: &str, data: Value) -> Result<InboundEvent, ProtocolError> {
        let decoded = match event {
            "status" => InboundEvent::Status(decode(event, data)?),
            "car_status" => InboundEvent::CarStatus(decode(event, data)?),
            "gimbal_status" => InboundEvent::GimbalStatus(decode(event, data)?),
            "slam_data" => InboundEvent::Slam(decode(event, data)?),
            "error" => InboundEvent::Error(decode(event, data)?),
            other => return Err(ProtocolError::UnknownEvent(other.to_string())),
        };
        Ok(decoded)
    }
}

fn decode<T: serde::de::DeserializeOwned>(event: &str, data: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|source| ProtocolError::Payload {
        event: event.to_string(),
        source,
    })
}

#[derive(Debug)]
pub enum ProtocolError {
    UnknownEvent(String),
    Payload {
        event: String,
        source: serde_json::Error,
    },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::UnknownEvent(name) => write!(f, "unknown server event {name:?}"),
            ProtocolError::Payload { event, source } => {
                write!(f, "bad payload for {event:?}: {source}")
            }
        }
    }
}

impl Error for ProtocolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ProtocolError::UnknownEvent(_) => None,
            ProtocolError::Payload { source, .. } => Some(source),
        }
    }
}
