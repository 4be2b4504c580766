//! Decimal rounding

/// Round `value` to `decimals` digits after the point.
///
/// Ties go to the even neighbour, so `round_to(0.000125, 5)` and the
/// output of `numpy.round` agree. Non-finite input is returned as-is.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_five_places() {
        assert_eq!(round_to(1.234567, 5), 1.23457);
        assert_eq!(round_to(-0.000004, 5), -0.0);
        assert_eq!(round_to(2.0, 5), 2.0);
    }

    #[test]
    fn test_round_ties_to_even() {
        assert_eq!(round_to(0.5, 0), 0.0);
        assert_eq!(round_to(1.5, 0), 2.0);
        assert_eq!(round_to(2.5, 0), 2.0);
    }

    #[test]
    fn test_round_is_idempotent() {
        let values = [
            0.1234567, -3.999995, 1.0 / 3.0, 12345.678901, -0.000015, 7.0e-6, 42.0,
        ];
        for &v in &values {
            let once = round_to(v, 5);
            assert_eq!(round_to(once, 5), once, "value {}", v);
        }
    }

    #[test]
    fn test_non_finite_passthrough() {
        assert!(round_to(f64::NAN, 5).is_nan());
        assert_eq!(round_to(f64::INFINITY, 5), f64::INFINITY);
    }
}
