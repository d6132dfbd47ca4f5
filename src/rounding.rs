/// Rounds half away from zero: `sign(x) * floor(|x| + 0.5)`.
pub fn round_half_away(value: f64) -> f64 {
    if value < 0.0 {
        (value - 0.5).ceil()
    } else {
        (value + 0.5).floor()
    }
}

/// Rounds `value` to `precision` digits after the decimal point.
///
/// Scales by `10^precision`, rounds half away from zero, then rescales, so
/// `fixed_round(2.5, 0) == 3.0` and `fixed_round(-2.5, 0) == -3.0`.
pub fn fixed_round(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    round_half_away(value * scale) / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_round_away_from_zero() {
        assert_eq!(fixed_round(2.5, 0), 3.0);
        assert_eq!(fixed_round(-2.5, 0), -3.0);
        assert_eq!(fixed_round(0.125, 2), 0.13);
        assert_eq!(fixed_round(-0.125, 2), -0.13);
    }

    #[test]
    fn non_ties_round_to_nearest() {
        assert_eq!(fixed_round(1.2344, 3), 1.234);
        assert_eq!(fixed_round(1.2346, 3), 1.235);
        assert_eq!(fixed_round(-7.49, 0), -7.0);
        assert_eq!(fixed_round(70.0, 3), 70.0);
    }

    #[test]
    fn rounding_is_idempotent() {
        let samples = [
            0.0, 0.125, 1.0 / 3.0, 2.0 / 3.0, 12.3456, -12.3456, 99.9995, 45.678_9, -0.005,
            1234.5678,
        ];
        for value in samples {
            for precision in 0..=4 {
                let once = fixed_round(value, precision);
                assert_eq!(fixed_round(once, precision), once, "{value} @ {precision}");
            }
        }
    }
}
