//! Summary statistics over aggregated series
//!
//! A series is a list of values, each tagged with the file it came from.
//! Extremes are tracked in a single pass in series order with strict
//! comparisons, so on a tie the first file seen keeps the extremum. Mean,
//! population standard deviation and the normal fit are computed over an
//! ascending-sorted copy.

use crate::error::{AnalysisError, Result};
use crate::store::FileId;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Arithmetic mean; `NaN` for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by N, not N-1)
///
/// Returns 0.0 for an empty slice.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mu = mean(values);
    let variance = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Gaussian probability density at `x`
///
/// `exp(-(x-mu)^2 / (2 sigma^2)) / (sigma * sqrt(2 pi))`. A non-positive
/// `sigma` has no density and yields `NaN`.
pub fn normal_pdf(x: f64, mu: f64, sigma: f64) -> f64 {
    if sigma <= 0.0 || !sigma.is_finite() {
        return f64::NAN;
    }
    let z = x - mu;
    (-(z * z) / (2.0 * sigma * sigma)).exp() / (sigma * (2.0 * PI).sqrt())
}

/// Sort a copy of `values` ascending
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut copy = values.to_vec();
    copy.sort_by(f64::total_cmp);
    copy
}

/// Statistics over one named series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStatistics {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub min_file_id: FileId,
    pub max: f64,
    pub max_file_id: FileId,
    pub sorted_series: Vec<f64>,
    /// Normal density at each point of `sorted_series`
    pub normal_fit: Vec<f64>,
}

impl SeriesStatistics {
    /// Compute statistics over `series`, visited in the given order
    pub fn compute(name: &str, series: &[(FileId, f64)]) -> Result<Self> {
        let Some((first_id, first_value)) = series.first() else {
            return Err(AnalysisError::EmptySeries {
                series: name.to_string(),
            });
        };

        let mut min = (*first_value, first_id);
        let mut max = (*first_value, first_id);
        for (id, value) in &series[1..] {
            if *value < min.0 {
                min = (*value, id);
            }
            if *value > max.0 {
                max = (*value, id);
            }
        }

        let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
        let sorted_series = sorted(&values);
        let mu = mean(&sorted_series);
        let sigma = population_std_dev(&sorted_series);
        let normal_fit = sorted_series
            .iter()
            .map(|&x| normal_pdf(x, mu, sigma))
            .collect();

        Ok(Self {
            name: name.to_string(),
            count: series.len(),
            mean: mu,
            stddev: sigma,
            min: min.0,
            min_file_id: min.1.clone(),
            max: max.0,
            max_file_id: max.1.clone(),
            sorted_series,
            normal_fit,
        })
    }

    /// Spread between the extremes
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}
