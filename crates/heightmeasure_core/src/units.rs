//! Display-unit conversion for measured distances.
//!
//! # Responsibility
//! - Turn a canonical meter value into centimeter and feet/inch strings.
//! - Own the rounding policy for every displayed number.
//!
//! # Invariants
//! - Conversions are pure and stateless.
//! - Rounding is half-away-from-zero, independent of the formatter.
//! - Whole feet are truncated; rounded inches never display as `12.0`.

use crate::model::point::{Distance, GeometryError};

pub const CENTIMETERS_PER_METER: f64 = 100.0;
pub const FEET_PER_METER: f64 = 3.28084;
pub const INCHES_PER_FOOT: f64 = 12.0;

/// Whole feet plus the remaining inches, rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeetInches {
    pub feet: u64,
    pub inches: f64,
}

/// Formats `meters` as whole centimeters, e.g. `"180 cm"`.
///
/// # Errors
/// - Returns `GeometryError` for negative or non-finite input.
pub fn to_centimeters(meters: f64) -> Result<String, GeometryError> {
    Distance::from_meters(meters).map(format_centimeters)
}

/// Formats `meters` as feet and inches, e.g. `5' 10.9"`.
///
/// # Errors
/// - Returns `GeometryError` for negative or non-finite input.
pub fn to_feet_inches(meters: f64) -> Result<String, GeometryError> {
    Distance::from_meters(meters).map(format_feet_inches)
}

pub fn format_centimeters(distance: Distance) -> String {
    let centimeters = round_half_away(distance.meters() * CENTIMETERS_PER_METER, 0);
    format!("{centimeters:.0} cm")
}

pub fn format_feet_inches(distance: Distance) -> String {
    let FeetInches { feet, inches } = split_feet_inches(distance);
    format!("{feet}' {inches:.1}\"")
}

/// Centimeter value rounded to one decimal, used by numeric export columns.
pub fn centimeters_value(distance: Distance) -> f64 {
    round_half_away(distance.meters() * CENTIMETERS_PER_METER, 1)
}

/// Splits a distance into truncated feet and one-decimal inches.
pub fn split_feet_inches(distance: Distance) -> FeetInches {
    let total_feet = distance.meters() * FEET_PER_METER;
    let whole_feet = total_feet.floor();
    let inches = round_half_away((total_feet - whole_feet) * INCHES_PER_FOOT, 1);
    // `as` saturates; realistic measurements stay far below u64::MAX feet.
    let feet = whole_feet as u64;

    if inches >= INCHES_PER_FOOT {
        FeetInches {
            feet: feet + 1,
            inches: 0.0,
        }
    } else {
        FeetInches { feet, inches }
    }
}

fn round_half_away(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    // f64::round rounds half-way cases away from zero.
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::{
        centimeters_value, format_feet_inches, round_half_away, split_feet_inches,
        to_centimeters, to_feet_inches,
    };
    use crate::model::point::{Distance, GeometryError};

    #[test]
    fn zero_distance_formats_as_zero() {
        assert_eq!(to_centimeters(0.0).unwrap(), "0 cm");
        assert_eq!(to_feet_inches(0.0).unwrap(), "0' 0.0\"");
    }

    #[test]
    fn typical_height_formats_both_units() {
        assert_eq!(to_centimeters(1.8).unwrap(), "180 cm");
        assert_eq!(to_feet_inches(1.8).unwrap(), "5' 10.9\"");
    }

    #[test]
    fn one_meter_is_one_hundred_centimeters() {
        assert_eq!(to_centimeters(1.0).unwrap(), "100 cm");
        assert_eq!(to_feet_inches(1.0).unwrap(), "3' 3.4\"");
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_half_away(0.5, 0), 1.0);
        assert_eq!(round_half_away(2.5, 0), 3.0);
        assert_eq!(to_centimeters(0.125).unwrap(), "13 cm");
    }

    #[test]
    fn inches_carry_into_feet_instead_of_showing_twelve() {
        // 1.8285 m = 5.99902 ft -> 11.988 in, which rounds to 12.0.
        let distance = Distance::from_meters(1.8285).unwrap();
        let split = split_feet_inches(distance);
        assert_eq!(split.feet, 6);
        assert_eq!(split.inches, 0.0);
        assert_eq!(format_feet_inches(distance), "6' 0.0\"");
    }

    #[test]
    fn centimeters_value_keeps_one_decimal() {
        let distance = Distance::from_meters(1.23456).unwrap();
        assert!((centimeters_value(distance) - 123.5).abs() < 1e-9);
    }

    #[test]
    fn negative_input_is_rejected() {
        assert_eq!(
            to_centimeters(-1.0).unwrap_err(),
            GeometryError::Negative(-1.0)
        );
        assert!(to_feet_inches(f64::NAN).is_err());
    }
}
