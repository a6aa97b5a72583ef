//! Output rounding.  The decimal precision of each field is part of the wire
//! contract, so every model rounds through these helpers before building a
//! [`Frame`][imusim_types::Frame].

use imusim_types::GnssFix;

/// Decimals kept for pitch, roll and yaw.
pub const ANGLE_DECIMALS: i32 = 2;
/// Decimals kept for latitude and longitude.
pub const COORDINATE_DECIMALS: i32 = 6;
/// Decimals kept for altitude.
pub const ALTITUDE_DECIMALS: i32 = 1;

/// Round half away from zero to `decimals` fractional digits.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Map any angle into `[0, 360)`.
pub fn wrap_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Round an angle to wire precision.
pub fn angle(deg: f64) -> f64 {
    round_to(deg, ANGLE_DECIMALS)
}

/// Round a heading to wire precision while keeping it in `[0, 360)`.
pub fn heading(deg: f64) -> f64 {
    wrap_degrees(round_to(wrap_degrees(deg), ANGLE_DECIMALS))
}

/// Round an unrounded accumulated position to wire precision.
pub fn position(fix: &GnssFix) -> GnssFix {
    GnssFix {
        latitude: round_to(fix.latitude, COORDINATE_DECIMALS),
        longitude: round_to(fix.longitude, COORDINATE_DECIMALS),
        altitude: round_to(fix.altitude, ALTITUDE_DECIMALS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_requested_decimals() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(-1.235001, 2), -1.24);
        assert_eq!(round_to(28.61390049, 6), 28.6139);
        assert_eq!(round_to(250.04, 1), 250.0);
    }

    #[test]
    fn wrap_handles_negative_and_overflowing_angles() {
        assert_eq!(wrap_degrees(-10.0), 350.0);
        assert_eq!(wrap_degrees(370.0), 10.0);
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert_eq!(wrap_degrees(-1e-18), 0.0);
    }

    #[test]
    fn heading_never_rounds_up_to_360() {
        assert_eq!(heading(359.996), 0.0);
        assert_eq!(heading(-0.001), 0.0);
        assert_eq!(heading(359.99), 359.99);
    }
}
