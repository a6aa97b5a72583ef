//! Ramp-to-rest motion: roll only, plus deterministic GNSS drift.
//!
//! ```text
//!            |value| <= threshold
//!   MOVING ──────────────────────▶ PAUSED
//!      ▲                              │
//!      └──── ControlCommand::Set ─────┘
//! ```
//!
//! While moving, roll steps toward zero by a fixed amount each tick and the
//! position shifts by fixed deltas scaled by the current direction.  Once the
//! roll is within the threshold, or a step carries it across zero, it snaps
//! to exactly `0.0` and the model pauses: every later frame repeats the same reading until a `Set` command
//! reseeds the roll.

use chrono::Utc;
use imusim_types::{ControlCommand, Frame, GnssFix, MotionPhase, Orientation, SimError};
use tracing::info;

use crate::config::{Profile, RampConfig};
use crate::model::SignalModel;
use crate::precision;

/// Ramp profile state for one session.
pub struct RampModel {
    config: RampConfig,
    value: f64,
    /// `-1.0` or `+1.0`.
    direction: f64,
    phase: MotionPhase,
    position: GnssFix,
}

impl RampModel {
    /// Start moving from `config.start_roll` toward zero.
    pub fn new(config: RampConfig, start: GnssFix) -> Self {
        let value = config.start_roll;
        let mut model = Self {
            direction: direction_toward_zero(value),
            value,
            phase: MotionPhase::Moving,
            position: start,
            config,
        };
        model.settle_if_at_rest(false);
        model
    }

    /// Current unrounded roll angle.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn direction(&self) -> f64 {
        self.direction
    }

    /// Unrounded accumulated position.
    pub fn position(&self) -> GnssFix {
        self.position
    }

    /// Snap to rest when within the threshold or after a step that crossed
    /// zero.  Returns `true` on the MOVING → PAUSED edge.
    fn settle_if_at_rest(&mut self, crossed_zero: bool) -> bool {
        let at_rest = crossed_zero || self.value.abs() <= self.config.pause_threshold;
        if self.phase == MotionPhase::Moving && at_rest {
            self.value = 0.0;
            self.phase = MotionPhase::Paused;
            return true;
        }
        false
    }

    fn frame(&self) -> Frame {
        Frame {
            timestamp: Utc::now(),
            imu: Orientation {
                pitch: None,
                roll: precision::angle(self.value),
                yaw: None,
            },
            gnss: precision::position(&self.position),
        }
    }
}

impl SignalModel for RampModel {
    fn profile(&self) -> Profile {
        Profile::Ramp
    }

    fn advance(&mut self) -> Frame {
        if self.phase == MotionPhase::Moving {
            let previous = self.value;
            self.value += self.config.step * self.direction;
            // A step wider than the rest band can jump straight over it.
            let crossed_zero = self.value * previous <= 0.0;
            self.position.latitude += self.config.gnss_step * self.direction;
            self.position.longitude += self.config.gnss_step * self.direction;
            self.position.altitude += self.config.altitude_step * self.direction;

            if self.settle_if_at_rest(crossed_zero) {
                info!(
                    latitude = self.position.latitude,
                    longitude = self.position.longitude,
                    "ramp at rest, waiting for SET command"
                );
            }
        }
        self.frame()
    }

    fn phase(&self) -> MotionPhase {
        self.phase
    }

    /// `Set { roll }` reseeds the angle and resumes moving toward zero.  A
    /// roll already within the threshold leaves the model paused at `0.0`.
    fn apply(&mut self, cmd: ControlCommand) -> Result<(), SimError> {
        match cmd {
            ControlCommand::Set { roll } => {
                if !roll.is_finite() {
                    return Err(SimError::InvalidConfig(format!(
                        "SET roll must be finite, got {roll}"
                    )));
                }
                self.value = roll;
                self.direction = direction_toward_zero(roll);
                self.phase = MotionPhase::Moving;
                if !self.settle_if_at_rest(false) {
                    info!(roll, "ramp resumed");
                }
                Ok(())
            }
        }
    }
}

fn direction_toward_zero(value: f64) -> f64 {
    if value > 0.0 { -1.0 } else { 1.0 }
}
