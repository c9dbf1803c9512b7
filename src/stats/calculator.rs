//! Statistics Calculator Module
//! Descriptive statistics and bias tests for chart series.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Significance threshold for the zero-mean t-test
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Statistics for one chart series.
#[derive(Debug, Clone)]
pub struct SeriesStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p05: f64,
    pub p95: f64,
    /// 95% confidence interval of the mean
    pub mean_ci95: Option<(f64, f64)>,
    /// Two-tailed p-value of "mean is zero"
    pub p_value_zero_mean: Option<f64>,
}

impl Default for SeriesStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            p05: f64::NAN,
            p95: f64::NAN,
            mean_ci95: None,
            p_value_zero_mean: None,
        }
    }
}

impl SeriesStats {
    /// Mean is significantly away from zero.
    pub fn is_biased(&self) -> bool {
        self.p_value_zero_mean
            .map(|p| p <= SIGNIFICANCE_THRESHOLD)
            .unwrap_or(false)
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_series_stats(values: &[f64]) -> SeriesStats {
        let n = values.len();
        if n == 0 {
            return SeriesStats::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mean = values.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std = variance.sqrt();

        SeriesStats {
            count: n,
            mean,
            median,
            std,
            min: sorted[0],
            max: sorted[n - 1],
            p05: Self::percentile(&sorted, 5.0),
            p95: Self::percentile(&sorted, 95.0),
            mean_ci95: Self::mean_confidence_interval(values, 0.95),
            p_value_zero_mean: Self::one_sample_ttest(values, 0.0),
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    fn mean_and_sem(values: &[f64]) -> Option<(f64, f64, f64)> {
        let n = values.len() as f64;
        if n < 2.0 {
            return None;
        }
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some((mean, (var / n).sqrt(), n - 1.0))
    }

    /// Two-tailed one-sample Student t-test of `mean == mu`.
    ///
    /// `None` for fewer than two values. Without variance the answer is exact:
    /// p = 1 when the mean equals `mu`, otherwise p = 0.
    pub fn one_sample_ttest(values: &[f64], mu: f64) -> Option<f64> {
        let (mean, se, df) = Self::mean_and_sem(values)?;
        if se == 0.0 {
            return Some(if mean == mu { 1.0 } else { 0.0 });
        }

        let t = (mean - mu) / se;
        StudentsT::new(0.0, 1.0, df)
            .ok()
            .map(|dist| 2.0 * (1.0 - dist.cdf(t.abs())))
    }

    /// Confidence interval of the mean from the Student t quantile.
    pub fn mean_confidence_interval(values: &[f64], level: f64) -> Option<(f64, f64)> {
        let (mean, se, df) = Self::mean_and_sem(values)?;
        let dist = StudentsT::new(0.0, 1.0, df).ok()?;
        let half = dist.inverse_cdf(0.5 + level / 2.0) * se;
        Some((mean - half, mean + half))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptive_stats() {
        let stats = StatsCalculator::compute_series_stats(&[4.0, 1.0, 3.0, 2.0, 5.0]);
        assert_eq!(stats.count, 5);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert!((stats.std - 2.5f64.sqrt()).abs() < 1e-12);
        assert!((stats.p95 - 4.8).abs() < 1e-12);
        assert!((stats.p05 - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_empty_series_has_nan_stats() {
        let stats = StatsCalculator::compute_series_stats(&[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
        assert!(stats.p_value_zero_mean.is_none());
        assert!(!stats.is_biased());
    }

    #[test]
    fn test_ttest_detects_offset() {
        let shifted: Vec<f64> = (0..50).map(|i| 1.0 + (i % 5) as f64 * 0.01).collect();
        let p = StatsCalculator::one_sample_ttest(&shifted, 0.0).unwrap();
        assert!(p < 1e-6);

        let centered = [-0.2, 0.1, 0.2, -0.1, 0.05, -0.05];
        let p = StatsCalculator::one_sample_ttest(&centered, 0.0).unwrap();
        assert!(p > 0.5);
    }

    #[test]
    fn test_ttest_without_variance() {
        assert_eq!(StatsCalculator::one_sample_ttest(&[0.0, 0.0], 0.0), Some(1.0));
        assert_eq!(StatsCalculator::one_sample_ttest(&[2.0, 2.0], 0.0), Some(0.0));
        assert_eq!(StatsCalculator::one_sample_ttest(&[2.0], 0.0), None);
    }

    #[test]
    fn test_confidence_interval_contains_mean() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let (lo, hi) = StatsCalculator::mean_confidence_interval(&values, 0.95).unwrap();
        assert!(lo < 2.5 && 2.5 < hi);
        assert!(((lo + hi) / 2.0 - 2.5).abs() < 1e-9);
        // t(0.975, 3) = 3.182, sem = 0.6455
        assert!((hi - 2.5 - 3.182 * 0.6455).abs() < 0.01);
    }
}
