//! Descriptive statistics over spread and depth samples
//!
//! - Percentiles use the nearest-rank method on a stable ascending sort:
//!   `index = floor(n * q)` clamped to `[0, n - 1]`, no interpolation
//! - Standard deviation is the population form (divide by `n`)
//! - An empty sample yields all-zero stats with `count == 0`, which callers
//!   must read as "no baseline"

use serde::Serialize;
use std::fmt;

/// Summary of one partition's samples
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub median: f64,
    pub p75: f64,
    pub p90: f64,
    pub min: f64,
    pub max: f64,
}

impl DescriptiveStats {
    /// Compute stats from a sample; non-finite values are dropped
    pub fn compute(samples: &[f64]) -> Self {
        let mut sorted: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let (min, max) = (sorted[0], sorted[n - 1]);

        // running mean; stays finite for any finite input
        let mut mean = 0.0;
        for (i, v) in sorted.iter().enumerate() {
            let k = (i + 1) as f64;
            mean += v / k - mean / k;
        }
        let mean = mean.clamp(min, max);

        // deviations scaled by the largest magnitude so squares cannot overflow
        let scale = min.abs().max(max.abs());
        let std = if scale > 0.0 {
            let sum_sq: f64 = sorted.iter().map(|v| (v / scale - mean / scale).powi(2)).sum();
            scale * (sum_sq / n as f64).sqrt()
        } else {
            0.0
        };

        Self {
            count: n,
            mean,
            std,
            median: nearest_rank(&sorted, 0.5),
            p75: nearest_rank(&sorted, 0.75),
            p90: nearest_rank(&sorted, 0.90),
            min,
            max,
        }
    }

    pub fn has_baseline(&self) -> bool {
        self.count > 0
    }

    /// z-score of `value` against this baseline
    pub fn z_score(&self, value: f64) -> f64 {
        z_score(value, self.mean, self.std)
    }
}

impl fmt::Display for DescriptiveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} mean={:.4} std={:.4} median={:.4} p75={:.4} p90={:.4} range=[{:.4}, {:.4}]",
            self.count, self.mean, self.std, self.median, self.p75, self.p90, self.min, self.max
        )
    }
}

/// Nearest-rank value of an ascending-sorted slice
fn nearest_rank(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    let idx = ((n as f64 * q).floor() as usize).min(n - 1);
    sorted[idx]
}

/// Nearest-rank percentile of an unsorted sample, 0 when empty
pub fn percentile(samples: &[f64], q: f64) -> f64 {
    let mut sorted: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    nearest_rank(&sorted, q.clamp(0.0, 1.0))
}

/// Standardized distance from the mean; a flat baseline (std == 0) gives 0
pub fn z_score(value: f64, mean: f64, std: f64) -> f64 {
    if std == 0.0 || !std.is_finite() {
        return 0.0;
    }
    (value - mean) / std
}

/// Map a z-score to a [0, 100] percentile through the normal CDF.
///
/// This is an ordinal signal for ranking, not a calibrated probability: it
/// assumes normality and uses a closed-form erf surrogate.
pub fn percentile_from_zscore(z: f64) -> f64 {
    (normal_cdf(z) * 100.0).clamp(0.0, 100.0)
}

/// Standard normal CDF
pub fn normal_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Abramowitz and Stegun 7.1.26 (|error| < 1.5e-7)
fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sample_is_all_zero() {
        let stats = DescriptiveStats::compute(&[]);
        assert_eq!(stats, DescriptiveStats::default());
        assert_eq!(stats.count, 0);
        assert!(!stats.has_baseline());
        assert!(!stats.mean.is_nan());
    }

    #[test]
    fn test_basic_stats() {
        let stats = DescriptiveStats::compute(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(stats.count, 4);
        assert!((stats.mean - 2.5).abs() < 1e-12);
        // population variance of 1..=4 is 1.25
        assert!((stats.std - 1.25f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        // floor(4 * 0.5) = 2 -> third smallest
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.p75, 4.0);
        assert_eq!(stats.p90, 4.0);
    }

    #[test]
    fn test_nearest_rank_no_interpolation() {
        let samples: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        assert_eq!(percentile(&samples, 0.0), 1.0);
        assert_eq!(percentile(&samples, 0.25), 3.0);
        assert_eq!(percentile(&samples, 0.9), 10.0);
        assert_eq!(percentile(&samples, 1.0), 10.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }

    #[test]
    fn test_single_sample() {
        let stats = DescriptiveStats::compute(&[7.5]);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.median, 7.5);
        assert_eq!(stats.p90, 7.5);
    }

    #[test]
    fn test_ordering_invariants_hold() {
        let samples_sets: Vec<Vec<f64>> = vec![
            vec![5.0, 5.0, 5.0],
            vec![-3.0, 10.0, 0.5, 0.5, 100.0, -50.0, 7.0],
            (0..97).map(|i| ((i * 37) % 11) as f64 * 0.3).collect(),
            vec![1e-9, 1e9],
        ];
        for samples in samples_sets {
            let s = DescriptiveStats::compute(&samples);
            assert!(s.min <= s.median && s.median <= s.max, "{}", s);
            assert!(s.min <= s.p75 && s.p75 <= s.p90 && s.p90 <= s.max, "{}", s);
        }
    }

    #[test]
    fn test_extreme_finite_samples_stay_finite() {
        let stats = DescriptiveStats::compute(&[f64::MAX, f64::MAX]);
        assert_eq!(stats.mean, f64::MAX);
        assert_eq!(stats.std, 0.0);
        assert!(stats.mean <= stats.max);

        let stats = DescriptiveStats::compute(&[f64::MAX, -f64::MAX]);
        assert!(stats.mean.is_finite() && stats.std.is_finite());
        assert!(stats.mean.abs() < 1e300);
        assert!(stats.min <= stats.mean && stats.mean <= stats.max);
        assert!((stats.std / f64::MAX - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_samples_ignored() {
        let stats = DescriptiveStats::compute(&[1.0, f64::NAN, 3.0, f64::INFINITY]);
        assert_eq!(stats.count, 2);
        assert!((stats.mean - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_z_score_flat_baseline_is_zero() {
        assert_eq!(z_score(10.0, 5.0, 0.0), 0.0);
        assert_eq!(z_score(5.0, 5.0, 2.0), 0.0);
        assert!((z_score(9.0, 5.0, 2.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_normal_cdf_reference_points() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-6);
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-3);
        assert!((normal_cdf(1.5) + normal_cdf(-1.5) - 1.0).abs() < 1e-6);
        assert_eq!(normal_cdf(-9.0), 0.0);
        assert_eq!(normal_cdf(9.0), 1.0);
    }

    #[test]
    fn test_percentile_from_zscore_is_monotone() {
        let zs = [-4.0, -2.5, -1.0, 0.0, 0.5, 1.5, 2.5, 4.0];
        let pcts: Vec<f64> = zs.iter().map(|z| percentile_from_zscore(*z)).collect();
        assert!(pcts.windows(2).all(|w| w[0] <= w[1]));
        assert!((percentile_from_zscore(0.0) - 50.0).abs() < 1e-4);
        assert!(pcts.iter().all(|p| (0.0..=100.0).contains(p)));
    }
}
