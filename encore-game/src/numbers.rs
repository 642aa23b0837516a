//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Round a f64 half away from zero and clamp it to the i64 range, returning 0 for NaN.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i64>(clamped).unwrap_or(0)
}

/// Floor a f64 and clamp it to the i64 range, returning 0 for NaN.
#[must_use]
pub fn floor_f64_to_i64(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).floor();
    cast::<f64, i64>(clamped).unwrap_or(0)
}

/// Round a non-negative f64 into a u64, saturating at zero for negatives and NaN.
#[must_use]
pub fn round_f64_to_u64(value: f64) -> u64 {
    u64::try_from(round_f64_to_i64(value)).unwrap_or(0)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Convert a count into f64 for averaging.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounders_cover_ranges() {
        assert_eq!(round_f64_to_i64(1.6), 2);
        assert_eq!(round_f64_to_i64(-2.5), -3);
        assert_eq!(round_f64_to_i64(f64::NAN), 0);
    }

    #[test]
    fn floor_handles_negatives_and_nan() {
        assert_eq!(floor_f64_to_i64(12.5), 12);
        assert_eq!(floor_f64_to_i64(-0.5), -1);
        assert_eq!(floor_f64_to_i64(f64::NAN), 0);
    }

    #[test]
    fn unsigned_rounding_saturates_at_zero() {
        assert_eq!(round_f64_to_u64(-4.0), 0);
        assert_eq!(round_f64_to_u64(41.5), 42);
    }
}
