//! Signal model parameters.
//!
//! Every field has a default so a partial `[signal]` table in the config file
//! only overrides what it names.

use imusim_types::{GnssFix, SimError};
use serde::{Deserialize, Serialize};

/// Which [`SignalModel`][crate::SignalModel] implementation a connection gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Full orientation with sinusoidal motion and random GNSS drift.
    #[default]
    Oscillatory,
    /// Roll-only ramp to rest with deterministic GNSS drift.
    Ramp,
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Profile::Oscillatory => write!(f, "oscillatory"),
            Profile::Ramp => write!(f, "ramp"),
        }
    }
}

impl std::str::FromStr for Profile {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oscillatory" => Ok(Profile::Oscillatory),
            "ramp" => Ok(Profile::Ramp),
            other => Err(SimError::InvalidConfig(format!("unknown profile `{other}`"))),
        }
    }
}

/// Parameters shared by both profiles plus a table for each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    #[serde(default)]
    pub profile: Profile,

    /// Baseline position every new session starts from.
    #[serde(default = "default_start")]
    pub start: GnssFix,

    #[serde(default)]
    pub oscillatory: OscillatoryConfig,

    #[serde(default)]
    pub ramp: RampConfig,
}

/// Parameters of the oscillatory profile.  Angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscillatoryConfig {
    /// Phase advance per tick.  Independent of the tick rate.
    #[serde(default = "default_t_step")]
    pub t_step: f64,
    #[serde(default = "default_amplitude_pitch")]
    pub amplitude_pitch: f64,
    #[serde(default = "default_amplitude_roll")]
    pub amplitude_roll: f64,
    #[serde(default = "default_amplitude_yaw")]
    pub amplitude_yaw: f64,
    /// Half-width of the uniform noise added to each angle.
    #[serde(default = "default_noise")]
    pub noise: f64,
    /// Half-width of the uniform per-tick latitude/longitude delta.
    #[serde(default = "default_gnss_drift")]
    pub gnss_drift: f64,
    /// Half-width of the uniform per-tick altitude delta, metres.
    #[serde(default = "default_altitude_drift")]
    pub altitude_drift: f64,
}

/// Parameters of the ramp-to-rest profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RampConfig {
    #[serde(default = "default_start_roll")]
    pub start_roll: f64,
    /// Roll change per tick, degrees.
    #[serde(default = "default_ramp_step")]
    pub step: f64,
    /// Roll magnitude at or below which the ramp snaps to zero and pauses.
    #[serde(default = "default_pause_threshold")]
    pub pause_threshold: f64,
    /// Latitude/longitude change per moving tick, scaled by direction.
    #[serde(default = "default_ramp_gnss_step")]
    pub gnss_step: f64,
    /// Altitude change per moving tick, scaled by direction.
    #[serde(default = "default_ramp_altitude_step")]
    pub altitude_step: f64,
}

fn default_start() -> GnssFix {
    GnssFix {
        latitude: 28.6139,
        longitude: 77.2090,
        altitude: 250.0,
    }
}
fn default_t_step() -> f64 {
    0.05
}
fn default_amplitude_pitch() -> f64 {
    20.0
}
fn default_amplitude_roll() -> f64 {
    25.0
}
fn default_amplitude_yaw() -> f64 {
    180.0
}
fn default_noise() -> f64 {
    2.0
}
fn default_gnss_drift() -> f64 {
    0.00002
}
fn default_altitude_drift() -> f64 {
    0.1
}
fn default_start_roll() -> f64 {
    3.0
}
fn default_ramp_step() -> f64 {
    0.05
}
fn default_pause_threshold() -> f64 {
    0.05
}
fn default_ramp_gnss_step() -> f64 {
    0.00001
}
fn default_ramp_altitude_step() -> f64 {
    0.05
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            start: default_start(),
            oscillatory: OscillatoryConfig::default(),
            ramp: RampConfig::default(),
        }
    }
}

impl Default for OscillatoryConfig {
    fn default() -> Self {
        Self {
            t_step: default_t_step(),
            amplitude_pitch: default_amplitude_pitch(),
            amplitude_roll: default_amplitude_roll(),
            amplitude_yaw: default_amplitude_yaw(),
            noise: default_noise(),
            gnss_drift: default_gnss_drift(),
            altitude_drift: default_altitude_drift(),
        }
    }
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            start_roll: default_start_roll(),
            step: default_ramp_step(),
            pause_threshold: default_pause_threshold(),
            gnss_step: default_ramp_gnss_step(),
            altitude_step: default_ramp_altitude_step(),
        }
    }
}

impl SignalConfig {
    /// Reject values that would make a model emit non-finite or
    /// non-advancing output.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), SimError> {
        let finite = [
            ("start.latitude", self.start.latitude),
            ("start.longitude", self.start.longitude),
            ("start.altitude", self.start.altitude),
            ("ramp.start_roll", self.ramp.start_roll),
            ("oscillatory.amplitude_pitch", self.oscillatory.amplitude_pitch),
            ("oscillatory.amplitude_roll", self.oscillatory.amplitude_roll),
            ("oscillatory.amplitude_yaw", self.oscillatory.amplitude_yaw),
            ("ramp.gnss_step", self.ramp.gnss_step),
            ("ramp.altitude_step", self.ramp.altitude_step),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(SimError::InvalidConfig(format!("{name} must be finite")));
            }
        }

        let positive = [
            ("oscillatory.t_step", self.oscillatory.t_step),
            ("ramp.step", self.ramp.step),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidConfig(format!("{name} must be > 0, got {value}")));
            }
        }

        let bounds = [
            ("oscillatory.noise", self.oscillatory.noise),
            ("oscillatory.gnss_drift", self.oscillatory.gnss_drift),
            ("oscillatory.altitude_drift", self.oscillatory.altitude_drift),
            ("ramp.pause_threshold", self.ramp.pause_threshold),
        ];
        for (name, value) in bounds {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimError::InvalidConfig(format!("{name} must be >= 0, got {value}")));
            }
        }

        Ok(())
    }
}
