//! Safe numeric conversions between sample counts, durations and scores

use crate::{Error, Result};

/// Convert a finite, non-negative f64 to usize, rounding to nearest
///
/// # Errors
///
/// Returns an error if the value is not finite, negative, or too large
#[allow(clippy::cast_possible_truncation)] // Truncation after bounds check is safe
#[allow(clippy::cast_sign_loss)] // Sign checked above
#[allow(clippy::cast_precision_loss)] // MAX bound comparison is approximate
pub fn f64_to_usize(value: f64) -> Result<usize> {
    let rounded = value.round();
    if rounded.is_finite() && rounded >= 0.0 && rounded <= usize::MAX as f64 {
        Ok(rounded as usize)
    } else {
        Err(Error::InvalidInput(format!(
            "Value {value} cannot be safely converted to usize"
        )))
    }
}

/// Number of samples covering `seconds` at `fps`, rounded to nearest
///
/// Non-finite or negative products clamp to 0.
#[must_use]
pub fn seconds_to_samples(seconds: f64, fps: f64) -> usize {
    f64_to_usize(seconds * fps).unwrap_or(0)
}

/// Clamp a score to 0-100 and round it to an integer
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
#[allow(clippy::cast_sign_loss)] // Clamped to non-negative
pub fn score_to_u8(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.clamp(0.0, 100.0).round() as u8
}

/// Convert a sample count to f64 for averaging
#[must_use]
#[allow(clippy::cast_precision_loss)] // Sample counts stay far below 2^52
pub fn count_to_f64(count: usize) -> f64 {
    count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_f64_to_usize() {
        assert_eq!(f64_to_usize(42.0).unwrap(), 42);
        assert_eq!(f64_to_usize(41.6).unwrap(), 42);
        assert_eq!(f64_to_usize(0.0).unwrap(), 0);

        assert!(f64_to_usize(-1.0).is_err());
        assert!(f64_to_usize(f64::INFINITY).is_err());
        assert!(f64_to_usize(f64::NAN).is_err());
    }

    #[test]
    fn test_seconds_to_samples() {
        assert_eq!(seconds_to_samples(5.0, 30.0), 150);
        assert_eq!(seconds_to_samples(5.0, 30.000_000_1), 150);
        assert_eq!(seconds_to_samples(1.0, 29.6), 30);
        assert_eq!(seconds_to_samples(-1.0, 30.0), 0);
        assert_eq!(seconds_to_samples(1.0, f64::NAN), 0);
    }

    #[test]
    fn test_score_to_u8() {
        assert_eq!(score_to_u8(50.4), 50);
        assert_eq!(score_to_u8(-10.0), 0);
        assert_eq!(score_to_u8(150.0), 100);
        assert_eq!(score_to_u8(f64::NAN), 0);
    }

    proptest! {
        #[test]
        fn prop_score_always_in_range(value in proptest::num::f64::ANY) {
            prop_assert!(score_to_u8(value) <= 100);
        }

        #[test]
        fn prop_f64_to_usize_round_trip(value in 0usize..1_000_000) {
            prop_assert_eq!(f64_to_usize(count_to_f64(value)).unwrap(), value);
        }
    }
}
