//! Continuous oscillatory motion with full orientation and GNSS drift.
//!
//! ```text
//! pitch(t) = A_pitch · sin(t)                        + noise
//! roll(t)  = A_roll  · sin(t / 1.3)                  + noise
//! yaw(t)   = (A_yaw + 180 · sin(t / 2)) mod 360      + noise   ∈ [0, 360)
//! ```
//!
//! Latitude, longitude and altitude each take an independent uniform step per
//! tick, so the position random-walks away from the session baseline.

use chrono::Utc;
use imusim_types::{Frame, GnssFix, Orientation};
use rand::Rng;
use rand::rngs::StdRng;

use crate::config::{OscillatoryConfig, Profile};
use crate::model::SignalModel;
use crate::precision;

/// Oscillatory profile state for one session.
pub struct OscillatoryModel {
    config: OscillatoryConfig,
    /// Phase fed to the sinusoids; advances by `t_step` per tick.
    t: f64,
    /// Unrounded accumulated position.
    position: GnssFix,
    rng: StdRng,
}

impl OscillatoryModel {
    pub fn new(config: OscillatoryConfig, start: GnssFix, rng: StdRng) -> Self {
        Self {
            config,
            t: 0.0,
            position: start,
            rng,
        }
    }

    /// Phase that the next call to [`advance`][SignalModel::advance] will use.
    #[cfg(test)]
    fn t(&self) -> f64 {
        self.t
    }

    /// Unrounded accumulated position.
    pub fn position(&self) -> GnssFix {
        self.position
    }

    fn uniform(&mut self, bound: f64) -> f64 {
        if bound > 0.0 {
            self.rng.gen_range(-bound..=bound)
        } else {
            0.0
        }
    }
}

impl SignalModel for OscillatoryModel {
    fn profile(&self) -> Profile {
        Profile::Oscillatory
    }

    fn advance(&mut self) -> Frame {
        let t = self.t;
        let noise = self.config.noise;

        let pitch = self.config.amplitude_pitch * t.sin() + self.uniform(noise);
        let roll = self.config.amplitude_roll * (t / 1.3).sin() + self.uniform(noise);
        let yaw = precision::wrap_degrees(self.config.amplitude_yaw + 180.0 * (t / 2.0).sin())
            + self.uniform(noise);

        let drift = self.config.gnss_drift;
        let altitude_drift = self.config.altitude_drift;
        self.position.latitude += self.uniform(drift);
        self.position.longitude += self.uniform(drift);
        self.position.altitude += self.uniform(altitude_drift);

        self.t += self.config.t_step;

        Frame {
            timestamp: Utc::now(),
            imu: Orientation {
                pitch: Some(precision::angle(pitch)),
                roll: precision::angle(roll),
                yaw: Some(precision::heading(yaw)),
            },
            gnss: precision::position(&self.position),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn model(config: OscillatoryConfig, seed: u64) -> OscillatoryModel {
        OscillatoryModel::new(
            config,
            GnssFix {
                latitude: 28.6139,
                longitude: 77.2090,
                altitude: 250.0,
            },
            StdRng::seed_from_u64(seed),
        )
    }

    fn fractional_digits(value: f64) -> usize {
        let text = value.to_string();
        text.split_once('.').map_or(0, |(_, frac)| frac.len())
    }

    #[test]
    fn yaw_stays_in_range_over_many_ticks() {
        let mut m = model(OscillatoryConfig::default(), 3);
        for _ in 0..20_000 {
            let yaw = m.advance().imu.yaw.expect("yaw present");
            assert!((0.0..360.0).contains(&yaw), "yaw out of range: {yaw}");
        }
    }

    #[test]
    fn yaw_stays_in_range_with_large_noise() {
        let config = OscillatoryConfig {
            noise: 45.0,
            ..OscillatoryConfig::default()
        };
        let mut m = model(config, 11);
        for _ in 0..5_000 {
            let yaw = m.advance().imu.yaw.unwrap();
            assert!((0.0..360.0).contains(&yaw), "yaw out of range: {yaw}");
        }
    }

    #[test]
    fn emitted_fields_are_finite_and_rounded() {
        let mut m = model(OscillatoryConfig::default(), 5);
        for _ in 0..2_000 {
            let f = m.advance();
            let angles = [f.imu.pitch.unwrap(), f.imu.roll, f.imu.yaw.unwrap()];
            for a in angles {
                assert!(a.is_finite());
                assert!(fractional_digits(a) <= 2, "angle {a}");
            }
            assert!(fractional_digits(f.gnss.latitude) <= 6, "lat {}", f.gnss.latitude);
            assert!(fractional_digits(f.gnss.longitude) <= 6, "lon {}", f.gnss.longitude);
            assert!(fractional_digits(f.gnss.altitude) <= 1, "alt {}", f.gnss.altitude);
        }
    }

    #[test]
    fn noiseless_signal_follows_the_sinusoids() {
        let config = OscillatoryConfig {
            noise: 0.0,
            gnss_drift: 0.0,
            altitude_drift: 0.0,
            ..OscillatoryConfig::default()
        };
        let mut m = model(config, 0);

        let first = m.advance();
        assert_eq!(first.imu.pitch, Some(0.0));
        assert_eq!(first.imu.roll, 0.0);
        assert_eq!(first.imu.yaw, Some(180.0));

        for _ in 1..20 {
            m.advance();
        }
        // 21st frame is generated at t = 20 · 0.05 = 1.0
        let f = m.advance();
        assert_eq!(f.imu.pitch, Some(precision::angle(20.0 * 1.0f64.sin())));
        assert_eq!(f.imu.roll, precision::angle(25.0 * (1.0f64 / 1.3).sin()));
        assert_eq!(f.imu.yaw, Some(precision::heading(180.0 + 180.0 * 0.5f64.sin())));
    }

    #[test]
    fn phase_advances_by_fixed_step() {
        let mut m = model(OscillatoryConfig::default(), 0);
        assert_eq!(m.t(), 0.0);
        m.advance();
        m.advance();
        assert!((m.t() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn position_drift_is_bounded_per_tick() {
        let mut m = model(OscillatoryConfig::default(), 9);
        let mut prev = m.position();
        for _ in 0..500 {
            m.advance();
            let now = m.position();
            assert!((now.latitude - prev.latitude).abs() <= 0.00002);
            assert!((now.longitude - prev.longitude).abs() <= 0.00002);
            assert!((now.altitude - prev.altitude).abs() <= 0.1);
            prev = now;
        }
    }

    #[test]
    fn position_accumulates_rather_than_resetting() {
        let mut m = model(OscillatoryConfig::default(), 21);
        let start = m.position();
        for _ in 0..1_000 {
            m.advance();
        }
        assert_ne!(m.position(), start);
    }
}
