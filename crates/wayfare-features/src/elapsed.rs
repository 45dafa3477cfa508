//! Distribution statistics of a user's elapsed seconds.
//!
//! Ten fixed statistics are computed over the non-missing `secs_elapsed`
//! values of a user. Undefined statistics are `None`, never zero:
//!
//! - no values: every statistic is missing;
//! - one value: `std` and `var` (sample, ddof = 1) are missing;
//! - fewer than three values: `skew` (bias-corrected) is missing.

use crate::error::Result;
use crate::profile::checked_elapsed;
use wayfare_data::SessionTable;

/// Output columns, in table order.
pub const STATISTIC_COLUMNS: [&str; 10] = [
    "secs_elapsed_sum",
    "secs_elapsed_mean",
    "secs_elapsed_min",
    "secs_elapsed_max",
    "secs_elapsed_quantile_1",
    "secs_elapsed_quantile_3",
    "secs_elapsed_median",
    "secs_elapsed_std",
    "secs_elapsed_var",
    "secs_elapsed_skew",
];

/// Distribution statistics of one set of elapsed times.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElapsedStats {
    /// Sum
    pub sum: Option<f64>,
    /// Arithmetic mean
    pub mean: Option<f64>,
    /// Minimum
    pub min: Option<f64>,
    /// Maximum
    pub max: Option<f64>,
    /// 25th percentile
    pub quantile_1: Option<f64>,
    /// 75th percentile
    pub quantile_3: Option<f64>,
    /// Median
    pub median: Option<f64>,
    /// Sample standard deviation
    pub std: Option<f64>,
    /// Sample variance
    pub var: Option<f64>,
    /// Adjusted Fisher-Pearson skewness
    pub skew: Option<f64>,
}

impl ElapsedStats {
    /// Compute all statistics over `values`.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len() as f64;
        let sum: f64 = sorted.iter().sum();
        let mean = sum / n;
        let var = sample_variance(&sorted, mean);

        Self {
            sum: Some(sum),
            mean: Some(mean),
            min: sorted.first().copied(),
            max: sorted.last().copied(),
            quantile_1: quantile(&sorted, 0.25),
            quantile_3: quantile(&sorted, 0.75),
            median: quantile(&sorted, 0.5),
            std: var.map(f64::sqrt),
            var,
            skew: skewness(&sorted, mean),
        }
    }

    /// Statistics in [`STATISTIC_COLUMNS`] order.
    pub const fn values(&self) -> [Option<f64>; 10] {
        [
            self.sum,
            self.mean,
            self.min,
            self.max,
            self.quantile_1,
            self.quantile_3,
            self.median,
            self.std,
            self.var,
            self.skew,
        ]
    }
}

/// Statistics of one user.
#[derive(Debug, Clone, PartialEq)]
pub struct ElapsedSummary {
    /// User identifier
    pub user_id: String,
    /// Statistics over the user's elapsed times
    pub stats: ElapsedStats,
}

/// Reduce one user's elapsed times to an [`ElapsedSummary`].
pub fn summarize_user(user_id: &str, sessions: &SessionTable) -> Result<ElapsedSummary> {
    let mut values = Vec::new();
    for event in sessions.user_events(user_id) {
        if let Some(secs) = checked_elapsed(user_id, event)? {
            values.push(secs);
        }
    }

    Ok(ElapsedSummary {
        user_id: user_id.to_string(),
        stats: ElapsedStats::from_values(&values),
    })
}

/// Quantile of sorted values with linear interpolation between ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

fn sample_variance(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some(squares / (values.len() - 1) as f64)
}

fn skewness(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 3 {
        return None;
    }
    let n = values.len() as f64;
    let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;
    if m2 == 0.0 {
        return Some(0.0);
    }
    Some((n * (n - 1.0)).sqrt() / (n - 2.0) * m3 / m2.powf(1.5))
}
