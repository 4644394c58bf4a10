#![forbid(unsafe_code)]

//! Trimmed days-to-hire aggregate over one group's raw durations.
//!
//! Pure and deterministic: the bounds are the 10th/90th percentiles of the
//! full input (linear interpolation between the two closest ranks), the
//! average and count cover only values inside the inclusive band.

const LOWER_QUANTILE: f64 = 0.10;
const UPPER_QUANTILE: f64 = 0.90;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrimmedStats {
    pub lower_bound: f64,
    pub average: f64,
    pub upper_bound: f64,
    pub count: usize,
}

/// Returns `None` for an empty input ("no data", never zero-valued stats).
///
/// Also returns `None` when the trim band captures no values, which can
/// happen for tiny, widely-spread inputs (two values far apart put both
/// outside the interpolated band). Every produced result therefore has
/// `count >= 1` and a finite average.
pub fn trimmed_stats(durations: &[i64]) -> Option<TrimmedStats> {
    if durations.is_empty() {
        return None;
    }

    let mut sorted = durations.to_vec();
    sorted.sort_unstable();

    let lower_bound = percentile(&sorted, LOWER_QUANTILE);
    let upper_bound = percentile(&sorted, UPPER_QUANTILE);

    let mut sum = 0.0_f64;
    let mut count = 0_usize;
    for &v in &sorted {
        let v = v as f64;
        if v >= lower_bound && v <= upper_bound {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }

    Some(TrimmedStats {
        lower_bound,
        average: sum / count as f64,
        upper_bound,
        count,
    })
}

/// Linear-interpolation percentile over an already-sorted slice: rank
/// `q * (n - 1)`, interpolated between the neighboring order statistics.
/// The result need not be a value present in the input.
fn percentile(sorted: &[i64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    debug_assert!((0.0..=1.0).contains(&q));

    let n = sorted.len();
    if n == 1 {
        return sorted[0] as f64;
    }
    let rank = q * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let lo_v = sorted[lo] as f64;
    if lo == hi {
        return lo_v;
    }
    let hi_v = sorted[hi] as f64;
    lo_v + (rank - lo as f64) * (hi_v - lo_v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn one_through_ten_matches_interpolated_band() {
        let stats = trimmed_stats(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]).expect("stats");
        assert!(close(stats.lower_bound, 1.9));
        assert!(close(stats.upper_bound, 9.1));
        // 2..=9 survive the trim.
        assert_eq!(stats.count, 8);
        assert!(close(stats.average, 5.5));
    }

    #[test]
    fn identical_values_collapse_to_that_value() {
        let stats = trimmed_stats(&[7, 7, 7]).expect("stats");
        assert!(close(stats.lower_bound, 7.0));
        assert!(close(stats.upper_bound, 7.0));
        assert!(close(stats.average, 7.0));
        assert_eq!(stats.count, 3);
    }

    #[test]
    fn empty_input_yields_no_result() {
        assert_eq!(trimmed_stats(&[]), None);
    }

    #[test]
    fn single_value_is_its_own_band() {
        let stats = trimmed_stats(&[42]).expect("stats");
        assert!(close(stats.lower_bound, 42.0));
        assert!(close(stats.upper_bound, 42.0));
        assert!(close(stats.average, 42.0));
        assert_eq!(stats.count, 1);
    }

    #[test]
    fn two_far_apart_values_leave_nothing_in_band() {
        // p10 = 10.9, p90 = 90.1: neither 1 nor 100 qualifies.
        assert_eq!(trimmed_stats(&[1, 100]), None);
    }

    #[test]
    fn input_order_is_irrelevant() {
        let a = trimmed_stats(&[9, 1, 5, 3, 7, 2, 10, 4, 8, 6]).expect("stats");
        let b = trimmed_stats(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]).expect("stats");
        assert_eq!(a, b);
    }

    #[test]
    fn bounds_order_and_count_hold_across_inputs() {
        let samples: [&[i64]; 6] = [
            &[3],
            &[5, 5],
            &[0, 1, 2, 3, 4, 100],
            &[10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110],
            &[1, 1, 1, 1, 2],
            &[7, 7, 7, 7, 7, 7, 7],
        ];
        for s in samples {
            let Some(stats) = trimmed_stats(s) else {
                continue;
            };
            assert!(stats.lower_bound <= stats.average, "input {s:?}");
            assert!(stats.average <= stats.upper_bound, "input {s:?}");
            assert!(stats.count >= 1, "input {s:?}");
            assert!(stats.count <= s.len(), "input {s:?}");
        }
    }

    #[test]
    fn percentile_interpolates_between_ranks() {
        let sorted = [1, 2, 3, 4];
        assert!(close(percentile(&sorted, 0.0), 1.0));
        assert!(close(percentile(&sorted, 0.5), 2.5));
        assert!(close(percentile(&sorted, 1.0), 4.0));
    }
}
