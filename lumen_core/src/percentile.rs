//! Percentile estimate over small integer samples.
//!
//! Uses the `(n + 1)` rank convention: `pos = p/100 * (n + 1)`. Below rank 1
//! the minimum is returned, at or beyond rank `n` the maximum, otherwise the
//! value is interpolated linearly between the two neighbouring order
//! statistics and rounded to the nearest integer (ties away from zero).
//! Rounding rather than truncating is what makes the 85th percentile of
//! 1..=100 come out as 86 (the raw score is 85.85).

use crate::error::CoreError;

/// p-th percentile of `values`, `p` in (0, 100).
///
/// The input does not need to be sorted.
pub fn percentile(values: &[i64], p: f64) -> Result<i64, CoreError> {
    if values.is_empty() {
        return Err(CoreError::InvalidInput("percentile of an empty sample"));
    }
    if !(p > 0.0 && p < 100.0) {
        return Err(CoreError::InvalidInput("percentile must be in (0, 100)"));
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    let first = sorted[0] as f64;
    let last = sorted[n - 1] as f64;

    let pos = p / 100.0 * (n as f64 + 1.0);
    let score = if pos < 1.0 {
        first
    } else if pos >= n as f64 {
        last
    } else {
        // 1 <= rank <= n - 1, so both neighbours exist
        let rank = pos.floor();
        let k = rank as usize;
        let lower = sorted[k - 1] as f64;
        let upper = sorted[k] as f64;
        lower + (pos - rank) * (upper - lower)
    };
    Ok(score.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn one_to_hundred_at_85_interpolates() {
        let v: Vec<i64> = (1..=100).collect();
        assert_eq!(percentile(&v, 85.0).unwrap(), 86);
    }

    #[test]
    fn fractional_scores_round_instead_of_truncating() {
        // pos = 0.85 * 101 = 85.85 -> 85 + 0.85 * (86 - 85)
        let v: Vec<i64> = (1..=100).collect();
        assert_ne!(percentile(&v, 85.0).unwrap(), 85);
        // pos = 0.5 * 3 = 1.5 -> 1.5, tie goes away from zero
        assert_eq!(percentile(&[1, 2], 50.0).unwrap(), 2);
        // pos = 0.4 * 6 = 2.4 -> 20 + 0.4 * (30 - 20)
        assert_eq!(percentile(&[10, 20, 30, 40, 50], 40.0).unwrap(), 24);
    }

    #[test]
    fn order_of_input_does_not_matter() {
        let v: Vec<i64> = (1..=100).rev().collect();
        assert_eq!(percentile(&v, 85.0).unwrap(), 86);
    }

    #[rstest]
    #[case(0.5)]
    #[case(50.0)]
    #[case(85.0)]
    #[case(99.9)]
    fn single_element_is_itself(#[case] p: f64) {
        assert_eq!(percentile(&[173], p).unwrap(), 173);
    }

    #[rstest]
    #[case(1.0)]
    #[case(85.0)]
    fn all_equal_values(#[case] p: f64) {
        assert_eq!(percentile(&[42; 9], p).unwrap(), 42);
    }

    #[test]
    fn low_rank_clamps_to_min_high_rank_to_max() {
        let v = [10, 20, 30];
        // pos = 0.1 * 4 = 0.4
        assert_eq!(percentile(&v, 10.0).unwrap(), 10);
        // pos = 0.9 * 4 = 3.6 >= n
        assert_eq!(percentile(&v, 90.0).unwrap(), 30);
        // pos = 0.5 * 4 = 2.0 -> exactly the second order statistic
        assert_eq!(percentile(&v, 50.0).unwrap(), 20);
    }

    #[test]
    fn duplicates_interpolate_between_neighbours() {
        // sorted: 100 100 200 255, pos = 0.85 * 5 = 4.25 >= 4 -> max
        assert_eq!(percentile(&[200, 100, 255, 100], 85.0).unwrap(), 255);
        // pos = 0.5 * 5 = 2.5 -> 100 + 0.5 * (200 - 100) = 150
        assert_eq!(percentile(&[200, 100, 255, 100], 50.0).unwrap(), 150);
    }

    #[test]
    fn empty_sample_is_invalid_input() {
        match percentile(&[], 85.0) {
            Err(CoreError::InvalidInput(msg)) => assert!(msg.contains("empty")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[rstest]
    #[case(0.0)]
    #[case(100.0)]
    #[case(-3.0)]
    #[case(f64::NAN)]
    fn percentile_outside_open_interval_is_invalid(#[case] p: f64) {
        assert!(matches!(
            percentile(&[1, 2, 3], p),
            Err(CoreError::InvalidInput(_))
        ));
    }
}
