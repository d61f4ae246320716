use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Ease-in-out sine: slow at both ends, fastest at the midpoint.
pub fn ease_in_out_sine(t: f64) -> f64 {
    -((PI * t).cos() - 1.0) / 2.0
}

/// Linear progress through a phase, clamped to `0.0..=1.0`.
///
/// A zero-length phase is already complete.
pub fn linear_fraction(elapsed_ms: u64, duration_ms: u64) -> f64 {
    if duration_ms == 0 {
        return 1.0;
    }
    (elapsed_ms as f64 / duration_ms as f64).min(1.0)
}

/// How an eased fraction maps onto the 0..100 progress ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ring fills up.
    Increasing,
    /// Ring drains.
    Decreasing,
    /// Ring drains while the phase represents an inhale (deep inhale).
    Reverse,
}

impl Direction {
    pub fn progress_percent(self, eased: f64) -> f64 {
        let percent = match self {
            Direction::Increasing => eased * 100.0,
            Direction::Decreasing | Direction::Reverse => (1.0 - eased) * 100.0,
        };
        percent.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sine_easing_fixed_points() {
        assert_eq!(ease_in_out_sine(0.0), 0.0);
        assert!((ease_in_out_sine(0.5) - 0.5).abs() < 1e-12);
        assert_eq!(ease_in_out_sine(1.0), 1.0);
    }

    #[test]
    fn direction_endpoints() {
        assert_eq!(Direction::Increasing.progress_percent(ease_in_out_sine(0.0)), 0.0);
        assert_eq!(Direction::Increasing.progress_percent(ease_in_out_sine(1.0)), 100.0);
        assert_eq!(Direction::Decreasing.progress_percent(ease_in_out_sine(0.0)), 100.0);
        assert_eq!(Direction::Decreasing.progress_percent(ease_in_out_sine(1.0)), 0.0);
        assert_eq!(Direction::Reverse.progress_percent(ease_in_out_sine(1.0)), 0.0);
    }

    #[test]
    fn zero_duration_is_complete() {
        assert_eq!(linear_fraction(0, 0), 1.0);
        assert_eq!(linear_fraction(10, 0), 1.0);
    }

    #[test]
    fn linear_fraction_clamps() {
        assert_eq!(linear_fraction(500, 1_000), 0.5);
        assert_eq!(linear_fraction(3_000, 1_000), 1.0);
    }

    proptest! {
        #[test]
        fn progress_stays_in_range(elapsed in 0u64..100_000, duration in 0u64..50_000) {
            let eased = ease_in_out_sine(linear_fraction(elapsed, duration));
            for direction in [Direction::Increasing, Direction::Decreasing, Direction::Reverse] {
                let p = direction.progress_percent(eased);
                prop_assert!((0.0..=100.0).contains(&p));
            }
        }

        #[test]
        fn easing_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(ease_in_out_sine(lo) <= ease_in_out_sine(hi) + 1e-12);
        }
    }
}
