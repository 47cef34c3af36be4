//! Decimal precision helpers for prices and quantities
//!
//! Uses rust_decimal for deterministic arithmetic. Rounding to an
//! instrument's tick or lot precision keeps banker's rounding
//! (`MidpointNearestEven`), the rust_decimal default for `round_dp`.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::errors::FixtureError;

/// Number of decimal places carried by a step such as `0.0001` (4) or `1` (0).
pub fn decimal_places(step: Decimal) -> u32 {
    step.normalize().scale()
}

/// Round `value` to the precision of `step`.
pub fn round_to_step(value: Decimal, step: Decimal) -> Decimal {
    value.round_dp(decimal_places(step)).normalize()
}

/// Convert a random draw into a Decimal, rejecting NaN and infinities.
pub fn decimal_from_f64(value: f64) -> Result<Decimal, FixtureError> {
    Decimal::from_f64(value).ok_or_else(|| FixtureError::Numeric {
        message: format!("{value} is not representable as a decimal"),
    })
}

/// Lossy conversion used when feeding a decimal into a random model.
pub fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_decimal_places() {
        assert_eq!(decimal_places(d("0.0001")), 4);
        assert_eq!(decimal_places(d("0.10")), 1);
        assert_eq!(decimal_places(d("1")), 0);
        assert_eq!(decimal_places(d("10")), 0);
    }

    #[test]
    fn test_round_to_step() {
        assert_eq!(round_to_step(d("27123.456"), d("0.1")), d("27123.5"));
        assert_eq!(round_to_step(d("0.000374"), d("0.0001")), d("0.0004"));
        assert_eq!(round_to_step(d("12.5"), d("1")), d("12"));
    }

    #[test]
    fn test_decimal_from_f64_rejects_nan() {
        assert!(decimal_from_f64(f64::NAN).is_err());
        assert!(decimal_from_f64(f64::INFINITY).is_err());
        assert_eq!(decimal_from_f64(2.5).unwrap(), d("2.5"));
    }
}
