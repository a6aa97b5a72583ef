use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// One emitted telemetry sample: orientation, position and the instant it
/// was generated.
///
/// Frames are plain values.  Once built by a signal model they are moved into
/// the encoder and never touched again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub imu: Orientation,
    pub gnss: GnssFix,
}

impl Frame {
    /// Compare two frames field-for-field, ignoring `timestamp`.
    pub fn same_reading(&self, other: &Frame) -> bool {
        self.imu == other.imu && self.gnss == other.gnss
    }
}

/// Attitude in degrees.  `pitch` and `yaw` are only produced by profiles
/// that model them; `roll` is always present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    pub roll: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,
}

/// GNSS position fix.  Latitude/longitude in decimal degrees, altitude in
/// metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GnssFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// State of a signal model's motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionPhase {
    Moving,
    /// At rest, waiting for a [`ControlCommand::Set`].
    Paused,
}

/// In-process control message delivered to a running emission loop between
/// ticks.
///
/// No wire format maps onto these yet; the server owns the sending half of
/// the channel and never constructs one from inbound traffic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    /// Reseed the roll angle and resume motion toward rest.
    Set { roll: f64 },
}

/// Error type shared by the simulator crates.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("WebSocket handshake failed: {0}")]
    Handshake(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Non-finite value in frame field `{field}`")]
    NonFiniteField { field: &'static str },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported control command: {0}")]
    UnsupportedCommand(String),
}

/// ISO-8601 UTC with microsecond precision and a `Z` suffix.
fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}
