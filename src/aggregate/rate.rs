//! Change-rate computation.
//!
//! Two deliberately distinct division-by-zero policies exist, matching two
//! distinct dashboard surfaces:
//!
//! * [`change_rate`] returns the [`NO_BASELINE`] sentinel when the previous
//!   period is zero. Consumers render it as "new, no baseline". Used for
//!   all per-entity change rates.
//! * [`simple_rate`] returns 0 when the previous period is zero. Used for
//!   the health-summary aggregate rates.
//!
//! The two are kept separate on purpose; folding them together would
//! silently change observable dashboard output.

/// Sentinel meaning "no previous-period baseline, rate undefined".
pub const NO_BASELINE: f64 = f64::MAX;

/// Percentage change with the sentinel policy for a zero baseline.
///
/// Equal values compare to 0 first, so a zero-to-zero comparison is 0
/// rather than the sentinel.
pub fn change_rate(previous: f64, current: f64) -> f64 {
    if previous == current {
        return 0.0;
    }
    if previous == 0.0 {
        return NO_BASELINE;
    }
    (current - previous) * 100.0 / previous
}

/// Percentage change that degrades to 0 for a zero baseline.
pub fn simple_rate(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) * 100.0 / previous
}

/// Round a rate to two decimals, as the final step before it is surfaced.
///
/// The sentinel passes through unchanged (scaling `f64::MAX` would
/// overflow to infinity), which also keeps rounding idempotent.
pub fn round_rate(rate: f64) -> f64 {
    if rate == NO_BASELINE {
        return rate;
    }
    (rate * 100.0).round() / 100.0
}

/// `part` as a percentage of `total`, 0 when `total` is 0.
pub fn percent_of(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_on_zero_baseline() {
        assert_eq!(change_rate(0.0, 10.0), NO_BASELINE);
        assert_eq!(change_rate(0.0, 0.5), NO_BASELINE);
    }

    #[test]
    fn test_equal_values_are_zero() {
        assert_eq!(change_rate(0.0, 0.0), 0.0);
        assert_eq!(change_rate(7.0, 7.0), 0.0);
        assert_eq!(change_rate(-3.0, -3.0), 0.0);
    }

    #[test]
    fn test_change_rate_formula() {
        assert_eq!(change_rate(50.0, 25.0), -50.0);
        assert_eq!(change_rate(4.0, 6.0), 50.0);
    }

    #[test]
    fn test_simple_rate_zero_policy() {
        assert_eq!(simple_rate(0.0, 10.0), 0.0);
        assert_eq!(simple_rate(0.0, 0.0), 0.0);
        assert_eq!(simple_rate(50.0, 25.0), -50.0);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_rate(33.333333), 33.33);
        assert_eq!(round_rate(-66.666666), -66.67);
        assert_eq!(round_rate(change_rate(50.0, 25.0)), -50.0);
    }

    #[test]
    fn test_rounding_idempotent() {
        for x in [1.005, 33.333333, -0.004, 99.999, NO_BASELINE] {
            assert_eq!(round_rate(round_rate(x)), round_rate(x));
        }
    }

    #[test]
    fn test_sentinel_survives_rounding() {
        assert_eq!(round_rate(NO_BASELINE), NO_BASELINE);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(1, 4), 25.0);
        assert_eq!(percent_of(0, 0), 0.0);
        assert_eq!(percent_of(3, 0), 0.0);
    }
}
