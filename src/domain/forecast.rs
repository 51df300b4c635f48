use crate::domain::errors::ConfigError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Tolerance band applied to forecasts, as multipliers of the historical range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClampBand {
    pub lower: f64,
    pub upper: f64,
}

impl Default for ClampBand {
    fn default() -> Self {
        Self {
            lower: 0.9,
            upper: 1.1,
        }
    }
}

impl ClampBand {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ok = self.lower.is_finite()
            && self.upper.is_finite()
            && self.lower > 0.0
            && self.lower <= 1.0
            && self.upper >= 1.0;
        if ok {
            Ok(())
        } else {
            Err(ConfigError::InvalidProfile {
                reason: format!(
                    "clamp band must satisfy 0 < lower <= 1 <= upper, got {} / {}",
                    self.lower, self.upper
                ),
            })
        }
    }

    /// Bounds for a series whose observed range is `[min, max]`.
    pub fn bounds(&self, min: f64, max: f64) -> (f64, f64) {
        (min * self.lower, max * self.upper)
    }
}

/// Mutable state carried between horizon steps of one forecast run.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastState {
    pub current_price: f64,
    pub current_moving_average: f64,
    pub step_index: usize,
    window: VecDeque<f64>,
    window_size: usize,
}

impl ForecastState {
    /// Seeds the state from the tail of the historical series (oldest first).
    pub fn from_history(prices: &[f64], window_size: usize) -> Option<Self> {
        let last = *prices.last()?;
        let window_size = window_size.max(1);
        let start = prices.len().saturating_sub(window_size);
        let window: VecDeque<f64> = prices[start..].iter().copied().collect();
        let current_moving_average = mean(&window);
        Some(Self {
            current_price: last,
            current_moving_average,
            step_index: 0,
            window,
            window_size,
        })
    }

    /// Feeds a new prediction forward as the next step's lagged price.
    pub fn advance(&mut self, predicted: f64) {
        if self.window.len() >= self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(predicted);
        self.current_price = predicted;
        self.current_moving_average = mean(&self.window);
        self.step_index += 1;
    }
}

fn mean(values: &VecDeque<f64>) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Result of one forecast run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub crop: String,
    pub city: String,
    /// Clamped predictions, one per horizon step.
    pub points: Vec<ForecastPoint>,
    /// Raw model output before clamping, for diagnostics.
    pub unclamped: Vec<f64>,
    /// The historical series the forecast continues.
    pub history: Vec<ForecastPoint>,
}
