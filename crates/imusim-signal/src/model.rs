//! The [`SignalModel`] trait and the profile factory.

use imusim_types::{ControlCommand, Frame, MotionPhase, SimError};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::{Profile, SignalConfig};
use crate::oscillatory::OscillatoryModel;
use crate::ramp::RampModel;

/// Every motion profile implements this trait.
///
/// # Contract
///
/// * `advance` – produce the next frame.  Called exactly once per tick.  The
///   result depends only on the model's own state and its random source.
///
/// * `apply` – accept an in-process [`ControlCommand`] between ticks.  Models
///   that have nothing to resume reject every command.
pub trait SignalModel: Send {
    /// Which profile this model implements.
    fn profile(&self) -> Profile;

    /// Advance one tick and return the resulting frame.
    fn advance(&mut self) -> Frame;

    /// Current motion phase.
    fn phase(&self) -> MotionPhase {
        MotionPhase::Moving
    }

    /// Apply a control command.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnsupportedCommand`] by default.
    fn apply(&mut self, cmd: ControlCommand) -> Result<(), SimError> {
        Err(SimError::UnsupportedCommand(format!(
            "{cmd:?} is not accepted by the {} profile",
            self.profile()
        )))
    }
}

/// Build a fresh model for one session.
///
/// `seed` makes the oscillatory profile's noise reproducible; `None` seeds
/// from OS entropy.  The ramp profile is deterministic and ignores it.
pub fn build_model(config: &SignalConfig, seed: Option<u64>) -> Box<dyn SignalModel> {
    match config.profile {
        Profile::Oscillatory => {
            let rng = match seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_entropy(),
            };
            Box::new(OscillatoryModel::new(
                config.oscillatory.clone(),
                config.start,
                rng,
            ))
        }
        Profile::Ramp => Box::new(RampModel::new(config.ramp.clone(), config.start)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_honours_profile_selection() {
        let mut cfg = SignalConfig::default();
        assert_eq!(build_model(&cfg, Some(1)).profile(), Profile::Oscillatory);
        cfg.profile = Profile::Ramp;
        assert_eq!(build_model(&cfg, Some(1)).profile(), Profile::Ramp);
    }

    #[test]
    fn oscillatory_rejects_control_commands() {
        let mut model = build_model(&SignalConfig::default(), Some(1));
        let err = model.apply(ControlCommand::Set { roll: 2.0 }).unwrap_err();
        assert!(matches!(err, SimError::UnsupportedCommand(_)));
        assert!(err.to_string().contains("oscillatory"));
    }

    #[test]
    fn same_seed_gives_same_stream() {
        let cfg = SignalConfig::default();
        let mut a = build_model(&cfg, Some(42));
        let mut b = build_model(&cfg, Some(42));
        for _ in 0..50 {
            assert!(a.advance().same_reading(&b.advance()));
        }
    }
}
