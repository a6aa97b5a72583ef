//! `imusim-signal` – Signal models for the synthetic IMU/GNSS source.
//!
//! A signal model is a small state machine that produces exactly one
//! [`Frame`] per call to [`SignalModel::advance`].  Models perform no I/O and
//! know nothing about timing or connections; the emission loop in
//! `imusim-server` drives them.
//!
//! # Profiles
//!
//! - [`oscillatory`] – continuous sinusoidal pitch/roll/yaw with uniform
//!   noise and random-walk GNSS drift.
//! - [`ramp`] – roll ramps linearly toward zero, then pauses and holds its
//!   position until a [`ControlCommand::Set`] arrives.
//!
//! # Example
//!
//! ```rust
//! use imusim_signal::{build_model, Profile, SignalConfig};
//!
//! let config = SignalConfig {
//!     profile: Profile::Ramp,
//!     ..SignalConfig::default()
//! };
//! let mut model = build_model(&config, Some(7));
//! let frame = model.advance();
//! assert!(frame.imu.pitch.is_none());
//! ```
//!
//! [`Frame`]: imusim_types::Frame
//! [`ControlCommand::Set`]: imusim_types::ControlCommand::Set

pub mod config;
pub mod model;
pub mod oscillatory;
pub mod precision;
pub mod ramp;

pub use config::{OscillatoryConfig, Profile, RampConfig, SignalConfig};
pub use model::{SignalModel, build_model};
pub use oscillatory::OscillatoryModel;
pub use ramp::RampModel;
