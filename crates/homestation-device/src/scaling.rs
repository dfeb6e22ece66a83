//! Raw-to-engineering-unit conversions.

use homestation_core::constants::*;

/// Re-map `value` from one range to another with integer arithmetic.
///
/// The result is `(value - in_min) * (out_max - out_min) / (in_max - in_min)
/// + out_min`, truncated toward zero. Inputs outside the source range are not
/// clamped; they extrapolate along the same line. Either range may be
/// reversed to invert the mapping. A degenerate source range maps everything
/// to `out_min`.
///
/// # Examples
///
/// ```
/// use homestation_device::map_range;
///
/// assert_eq!(map_range(2047, 0, 4095, 0, 1000), 499);
/// assert_eq!(map_range(0, 4095, 0, 0, 100), 100);
/// ```
pub fn map_range(value: i64, in_min: i64, in_max: i64, out_min: i64, out_max: i64) -> i64 {
    if in_min == in_max {
        return out_min;
    }
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Gas level `0..=1000` from a raw conversion `0..=4095`.
pub fn gas_level(raw: u16) -> i32 {
    map_range(i64::from(raw), ADC_MIN, ADC_MAX, 0, GAS_LEVEL_MAX) as i32
}

/// Water level percent from a raw conversion; a dry probe reads 4095.
pub fn water_level(raw: u16) -> i32 {
    map_range(i64::from(raw), ADC_MAX, ADC_MIN, 0, WATER_LEVEL_MAX) as i32
}

/// Servo angle for a two-position mechanism.
///
/// `true` (door open, tender extended) is 90°, `false` is 0°.
pub fn servo_angle(engaged: bool) -> u8 {
    if engaged {
        SERVO_OPEN_ANGLE
    } else {
        SERVO_REST_ANGLE
    }
}
