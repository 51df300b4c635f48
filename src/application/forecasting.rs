//! Iterative multi-step price forecasting.
//!
//! Each step feeds the previous step's prediction back in as the lagged
//! price, so errors compound across the horizon. Final values are clamped
//! into a band around the observed historical range.

use crate::application::ml::predictor::PricePredictor;
use crate::application::price_statistics::{self, CropStatistics};
use crate::domain::encoding::{CategoricalEncoder, Category};
use crate::domain::errors::{
    AdvisoryResult, ConfigError, ForecastError, PredictionError, ValidationError,
};
use crate::domain::forecast::{ClampBand, Forecast, ForecastPoint, ForecastState};
use crate::domain::history::{Field, Filter, HistoricalStore, PriceRecord};
use crate::domain::ml::feature_registry::{Feature, FeatureContext, FeatureSchema};
use crate::domain::seasonality::SeasonalTable;
use chrono::{Datelike, NaiveDate, TimeDelta};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ForecastSettings {
    pub schema: FeatureSchema,
    pub clamp: ClampBand,
    pub period_days: i64,
    pub moving_average_window: usize,
    pub max_horizon: usize,
}

/// One future period, resolved before any model call.
#[derive(Debug, Clone, Copy)]
struct Period {
    date: NaiveDate,
    month: u32,
    seasonal_index: f64,
}

/// Calendar month as a point on the unit circle, so December and January are neighbours.
pub fn month_encoding(month: u32) -> (f64, f64) {
    let angle = 2.0 * PI * month as f64 / 12.0;
    (angle.sin(), angle.cos())
}

pub struct IterativeForecaster<'a> {
    pub predictor: &'a dyn PricePredictor,
    pub history: &'a HistoricalStore<PriceRecord>,
    pub encoder: &'a CategoricalEncoder,
    pub seasonal: &'a SeasonalTable,
    /// Artifact statistics keyed by lower-cased crop name.
    pub crop_stats: &'a BTreeMap<String, CropStatistics>,
    pub settings: &'a ForecastSettings,
}

impl IterativeForecaster<'_> {
    pub fn forecast(&self, crop: &str, city: &str, horizon: usize) -> AdvisoryResult<Forecast> {
        if horizon == 0 || horizon > self.settings.max_horizon {
            return Err(ValidationError::InvalidHorizon {
                horizon,
                max: self.settings.max_horizon,
            }
            .into());
        }

        let crop = self.encoder.canonicalize(Category::Crop, crop)?;

        let mut series = self
            .history
            .query(&[Filter::eq(Field::Crop, crop), Filter::eq(Field::City, city)]);
        series.sort_by_key(|r| r.date);

        let Some(last) = series.last() else {
            return Err(ForecastError::NoHistoricalData {
                crop: crop.to_string(),
                city: city.to_string(),
            }
            .into());
        };
        // Dataset spelling is canonical from here on
        let crop = last.crop.as_str();
        let prices: Vec<f64> = series.iter().map(|r| r.modal_price).collect();

        let periods = self.schedule(crop, last.date, horizon)?;
        let stats = self.crop_statistics(crop)?;

        let mut state = ForecastState::from_history(&prices, self.settings.moving_average_window)
            .ok_or_else(|| ForecastError::NoHistoricalData {
                crop: crop.to_string(),
                city: city.to_string(),
            })?;

        let mut unclamped = Vec::with_capacity(horizon);
        for period in &periods {
            let (month_sin, month_cos) = month_encoding(period.month);
            let ctx = FeatureContext {
                crop: Some(crop),
                month_sin: Some(month_sin),
                month_cos: Some(month_cos),
                seasonal_index: Some(period.seasonal_index),
                lagged_price: Some(state.current_price),
                moving_average: Some(state.current_moving_average),
                crop_min: stats.map(|s| s.min),
                crop_max: stats.map(|s| s.max),
                crop_mean: stats.map(|s| s.mean),
                crop_trend: stats.and_then(|s| s.trend),
                ..Default::default()
            };
            let features = self.settings.schema.assemble(&ctx, self.encoder)?;

            let predicted = self.predictor.predict(&features)?;
            if !predicted.is_finite() {
                return Err(PredictionError::NonFinite {
                    model: self.predictor.name().to_string(),
                    step: state.step_index + 1,
                }
                .into());
            }

            debug!(
                "{} {} step {} (month {}): lagged {:.2}, ma {:.2} -> {:.2}",
                crop,
                city,
                state.step_index + 1,
                period.month,
                state.current_price,
                state.current_moving_average,
                predicted
            );
            unclamped.push(predicted);
            state.advance(predicted);
        }

        let history_min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let history_max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (low, high) = self.settings.clamp.bounds(history_min, history_max);

        let points: Vec<ForecastPoint> = periods
            .iter()
            .zip(&unclamped)
            .map(|(period, &price)| ForecastPoint {
                date: period.date,
                price: price.max(low).min(high),
            })
            .collect();

        info!(
            "Forecast {} in {}: {} steps from {} (band {:.2}..{:.2})",
            crop,
            city,
            points.len(),
            last.date,
            low,
            high
        );

        Ok(Forecast {
            crop: crop.to_string(),
            city: last.city.clone(),
            points,
            unclamped,
            history: series
                .iter()
                .map(|r| ForecastPoint {
                    date: r.date,
                    price: r.modal_price,
                })
                .collect(),
        })
    }

    /// Future dates and seasonal multipliers, failing before any prediction
    /// if the crop's seasonal profile does not cover the horizon.
    fn schedule(&self, crop: &str, last_date: NaiveDate, horizon: usize) -> AdvisoryResult<Vec<Period>> {
        let last_month = last_date.month();
        (1..=horizon)
            .map(|i| -> AdvisoryResult<Period> {
                let month = (last_month + i as u32 - 1) % 12 + 1;
                let seasonal_index = self.seasonal.lookup(crop, month)?;
                let date = self
                    .settings
                    .period_days
                    .checked_mul(i as i64)
                    .and_then(TimeDelta::try_days)
                    .and_then(|offset| last_date.checked_add_signed(offset))
                    .ok_or_else(|| ConfigError::InvalidProfile {
                        reason: format!(
                            "period of {} days puts step {} beyond the supported calendar",
                            self.settings.period_days, i
                        ),
                    })?;
                Ok(Period {
                    date,
                    month,
                    seasonal_index,
                })
            })
            .collect()
    }

    /// Crop-level statistics, only resolved when the schema uses them.
    fn crop_statistics(&self, crop: &str) -> AdvisoryResult<Option<CropStatistics>> {
        let schema = &self.settings.schema;
        let needs_summary = [Feature::CropMin, Feature::CropMax, Feature::CropMean]
            .iter()
            .any(|&f| schema.requires(f));
        let needs_trend = schema.requires(Feature::CropTrend);
        if !needs_summary && !needs_trend {
            return Ok(None);
        }

        let crop_prices = || -> Vec<f64> {
            let mut rows = self.history.query(&[Filter::eq(Field::Crop, crop)]);
            rows.sort_by_key(|r| r.date);
            rows.iter().map(|r| r.modal_price).collect()
        };

        let mut stats = match self.crop_stats.get(&crop.to_lowercase()) {
            Some(stats) => *stats,
            None => price_statistics::summarize(&crop_prices()).ok_or_else(|| {
                ForecastError::MissingCropStatistic {
                    crop: crop.to_string(),
                    statistic: "summary".to_string(),
                }
            })?,
        };

        if needs_trend && stats.trend.is_none() {
            stats.trend = price_statistics::trend_coefficient(&crop_prices());
            if stats.trend.is_none() {
                return Err(ForecastError::MissingCropStatistic {
                    crop: crop.to_string(),
                    statistic: "trend".to_string(),
                }
                .into());
            }
        }

        Ok(Some(stats))
    }
}
