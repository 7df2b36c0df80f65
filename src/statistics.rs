//! Summary statistics over per-trial measurements.
//!
//! Samples arrive in trial order and keep that order; percentiles are
//! computed on a sorted copy, but outliers are always reported by their
//! original 1-based trial position so an anomalous summary line can be traced
//! back to the trial that produced it.
//!
//! The percentile estimator is the linear-interpolation rank
//! `r = (p/100) * (n - 1)`, and the standard deviation is the population form
//! (divide by `n`). Both are pinned by test vectors below; swapping in a
//! different quantile definition silently shifts every reported median.

use serde::Serialize;

/// Summary of one metric across all measured trials.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// 50th percentile.
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// 25th percentile.
    pub q1: f64,
    /// 75th percentile.
    pub q3: f64,
    /// 1-based positions, in arrival order, of samples outside
    /// `[q1 - 1.5*IQR, q3 + 1.5*IQR]`.
    pub outliers: Vec<usize>,
}

/// Linear-interpolation percentile over an ascending-sorted slice.
///
/// # Panics
///
/// Panics if `sorted` is empty or `p` is outside `[0, 100]`.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    assert!(!sorted.is_empty(), "percentile of empty sample set");
    assert!((0.0..=100.0).contains(&p), "percentile must be in [0, 100]");

    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let w = rank - lo as f64;
    sorted[lo] * (1.0 - w) + sorted[hi] * w
}

/// Summarize samples in arrival order. Returns `None` for an empty slice;
/// callers report "no data" instead of propagating NaN.
pub fn summarize(samples: &[f64]) -> Option<Summary> {
    if samples.is_empty() {
        return None;
    }

    let n = samples.len();
    let mut sorted = samples.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));

    let mean = samples.iter().sum::<f64>() / n as f64;
    let variance = samples
        .iter()
        .map(|v| {
            let d = v - mean;
            d * d
        })
        .sum::<f64>()
        / n as f64;

    let q1 = percentile(&sorted, 25.0);
    let q3 = percentile(&sorted, 75.0);
    let iqr = q3 - q1;
    let lo = q1 - 1.5 * iqr;
    let hi = q3 + 1.5 * iqr;
    let outliers = samples
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v < lo || v > hi)
        .map(|(i, _)| i + 1)
        .collect();

    Some(Summary {
        min: sorted[0],
        max: sorted[n - 1],
        mean,
        median: percentile(&sorted, 50.0),
        std_dev: variance.sqrt(),
        q1,
        q3,
        outliers,
    })
}

/// Ordered sequence of per-trial measurements for one metric.
///
/// Thin wrapper over a `Vec<f64>` that keeps arrival order (which the outlier
/// indices depend on) and funnels everything through [`summarize`].
#[derive(Clone, Debug, Default)]
pub struct SampleSet {
    values: Vec<f64>,
}

impl SampleSet {
    /// Empty sample set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one trial's measurement.
    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    /// Samples in arrival order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of samples collected so far.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no trial has reported yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Summary of the collected samples, or `None` when empty.
    pub fn summarize(&self) -> Option<Summary> {
        summarize(&self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_between_ranks() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 50.0), 2.5);
        assert_eq!(percentile(&sorted, 25.0), 1.75);
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 100.0), 4.0);
    }

    #[test]
    fn percentile_of_singleton_is_the_sample() {
        assert_eq!(percentile(&[5.0], 50.0), 5.0);
    }

    #[test]
    #[should_panic(expected = "percentile of empty sample set")]
    fn percentile_rejects_empty_input() {
        percentile(&[], 50.0);
    }

    #[test]
    fn stddev_of_constant_sequence_is_zero() {
        let s = summarize(&[3.0, 3.0, 3.0, 3.0]).unwrap();
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.mean, 3.0);
        assert_eq!(s.median, 3.0);
        assert!(s.outliers.is_empty());
    }

    #[test]
    fn stddev_is_population_form() {
        // mean 2, squared deviations 1+0+1, divided by n=3 (not n-1)
        let s = summarize(&[1.0, 2.0, 3.0]).unwrap();
        let expected = (2.0f64 / 3.0).sqrt();
        assert!((s.std_dev - expected).abs() < 1e-12);
    }

    #[test]
    fn outlier_reported_by_original_position() {
        let s = summarize(&[1.0, 1.0, 1.0, 1.0, 1.0, 100.0]).unwrap();
        assert_eq!(s.outliers, vec![6]);
    }

    #[test]
    fn outlier_position_survives_reordering() {
        // Same data, spike first: the reported index must follow the spike.
        let s = summarize(&[100.0, 1.0, 1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(s.outliers, vec![1]);
    }

    #[test]
    fn empty_sample_set_has_no_summary() {
        assert_eq!(summarize(&[]), None);
        assert_eq!(SampleSet::new().summarize(), None);
    }

    #[test]
    fn sample_set_preserves_arrival_order() {
        let mut set = SampleSet::new();
        set.push(3.0);
        set.push(1.0);
        set.push(2.0);
        assert_eq!(set.values(), &[3.0, 1.0, 2.0]);
        assert_eq!(set.len(), 3);
        let s = set.summarize().unwrap();
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 3.0);
        assert_eq!(s.median, 2.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn samples_strategy() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(-1.0e6..1.0e6f64, 1..200)
    }

    proptest! {
        #[test]
        fn summary_stats_stay_within_range(samples in samples_strategy()) {
            let s = summarize(&samples).unwrap();
            let tol = 1e-6 * (1.0 + s.max.abs() + s.min.abs());
            prop_assert!(s.min <= s.median && s.median <= s.max);
            prop_assert!(s.min <= s.q1 && s.q1 <= s.q3 && s.q3 <= s.max);
            prop_assert!(s.min - tol <= s.mean && s.mean <= s.max + tol);
            prop_assert!(s.std_dev >= 0.0);
        }

        #[test]
        fn percentile_is_monotone_in_p(samples in samples_strategy()) {
            let mut sorted = samples;
            sorted.sort_unstable_by(|a, b| a.total_cmp(b));
            let mut last = percentile(&sorted, 0.0);
            for p in [10.0, 25.0, 50.0, 75.0, 90.0, 100.0] {
                let v = percentile(&sorted, p);
                let tol = 1e-9 * (1.0 + last.abs());
                prop_assert!(v >= last - tol);
                last = v;
            }
        }

        #[test]
        fn outlier_indices_are_valid_positions(samples in samples_strategy()) {
            let s = summarize(&samples).unwrap();
            for &idx in &s.outliers {
                prop_assert!(idx >= 1 && idx <= samples.len());
            }
            // 1-based indices are unique and ascending by construction
            for w in s.outliers.windows(2) {
                prop_assert!(w[0] < w[1]);
            }
        }

        #[test]
        fn constant_sequences_never_flag_outliers(v in -1.0e6..1.0e6f64, n in 1usize..64) {
            let samples = vec![v; n];
            let s = summarize(&samples).unwrap();
            prop_assert!(s.outliers.is_empty());
            prop_assert_eq!(s.std_dev, 0.0);
        }
    }
}
