//! Frame → wire JSON.
//!
//! `serde_json` writes NaN and ±∞ as `null`, which would silently break the
//! consumer's schema, so every numeric field is checked before encoding.  A
//! frame is always encoded in full before anything is handed to the
//! transport.

use imusim_types::{Frame, SimError};

/// Encode `frame` as one JSON text message.
///
/// # Errors
///
/// * [`SimError::NonFiniteField`] naming the first NaN/∞ field.
/// * [`SimError::Serialization`] if `serde_json` fails.
pub fn encode(frame: &Frame) -> Result<String, SimError> {
    check_finite(frame)?;
    serde_json::to_string(frame).map_err(|e| SimError::Serialization(e.to_string()))
}

fn check_finite(frame: &Frame) -> Result<(), SimError> {
    let fields = [
        ("imu.pitch", frame.imu.pitch),
        ("imu.roll", Some(frame.imu.roll)),
        ("imu.yaw", frame.imu.yaw),
        ("gnss.latitude", Some(frame.gnss.latitude)),
        ("gnss.longitude", Some(frame.gnss.longitude)),
        ("gnss.altitude", Some(frame.gnss.altitude)),
    ];
    for (field, value) in fields {
        if let Some(v) = value
            && !v.is_finite()
        {
            return Err(SimError::NonFiniteField { field });
        }
    }
    Ok(())
}
