//! Summary statistics over historical price series
//!
//! - Range and mean (clamp band and model inputs)
//! - Trend coefficient (least-squares slope per observation)

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Crop-level summary a price model may take as input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    #[serde(default)]
    pub trend: Option<f64>,
}

/// Summarize a price series ordered oldest first.
///
/// # Returns
/// * `None` - If the series is empty
pub fn summarize(prices: &[f64]) -> Option<CropStatistics> {
    if prices.is_empty() {
        return None;
    }

    Some(CropStatistics {
        min: Statistics::min(prices.iter()),
        max: Statistics::max(prices.iter()),
        mean: Statistics::mean(prices.iter()),
        trend: trend_coefficient(prices),
    })
}

/// Slope of price against observation index.
///
/// A single observation has a flat trend.
pub fn trend_coefficient(prices: &[f64]) -> Option<f64> {
    match prices.len() {
        0 => None,
        1 => Some(0.0),
        n => {
            let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
            linear_regression_slope(&x, prices)
        }
    }
}

/// Simple linear regression to get slope
fn linear_regression_slope(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.is_empty() {
        return None;
    }

    let n = x.len() as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y.iter()).map(|(xi, yi)| xi * yi).sum();
    let sum_x2: f64 = x.iter().map(|xi| xi * xi).sum();

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator.abs() < 1e-10 {
        return None;
    }

    Some((n * sum_xy - sum_x * sum_y) / denominator)
}
