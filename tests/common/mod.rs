//! Shared fixtures for the advisory integration tests.
#![allow(dead_code)]

use agripredict::application::advisory::{AdvisoryContext, AdvisoryParts};
use agripredict::application::forecasting::ForecastSettings;
use agripredict::application::ml::predictor::{CropClassifier, PricePredictor};
use agripredict::application::recommendation::RecommendationSettings;
use agripredict::domain::encoding::{CategoricalEncoder, Category};
use agripredict::domain::errors::PredictionError;
use agripredict::domain::forecast::ClampBand;
use agripredict::domain::history::{HistoricalStore, PriceRecord, SuitabilityRecord};
use agripredict::domain::ml::feature_registry::{
    DEFAULT_CROP_FEATURES, DEFAULT_PRICE_FEATURES, FeatureSchema, FeatureVector,
};
use agripredict::domain::seasonality::SeasonalTable;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const CROPS: &[&str] = &["Chili", "Corn", "Cotton", "Onion", "Sugarcane", "Tomato"];
pub const REGIONS: &[&str] = &[
    "Central Karnataka",
    "Coastal Karnataka",
    "North Karnataka",
    "South Karnataka",
];
pub const SOILS: &[&str] = &["Clay", "Loamy", "Peaty", "Sandy", "Silty"];

pub fn crop_index(crop: &str) -> usize {
    CROPS.iter().position(|c| *c == crop).unwrap()
}

/// Multiplies the lagged price (last column of the default layout) by `factor`.
pub struct LaggedPricePredictor {
    pub factor: f64,
    pub calls: AtomicUsize,
}

impl LaggedPricePredictor {
    pub fn new(factor: f64) -> Self {
        Self {
            factor,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PricePredictor for LaggedPricePredictor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(features.as_slice().last().copied().unwrap_or(0.0) * self.factor)
    }

    fn name(&self) -> &str {
        "lagged-price mock"
    }

    fn version(&self) -> &str {
        "test"
    }
}

/// Always returns NaN.
pub struct BrokenPredictor;

impl PricePredictor for BrokenPredictor {
    fn predict(&self, _features: &FeatureVector) -> Result<f64, PredictionError> {
        Ok(f64::NAN)
    }

    fn name(&self) -> &str {
        "broken mock"
    }

    fn version(&self) -> &str {
        "test"
    }
}

/// Classifier with a fixed answer, optionally exposing probabilities.
pub struct FixedClassifier {
    pub class: usize,
    pub probabilities: Option<Vec<f64>>,
}

impl FixedClassifier {
    pub fn single(crop: &str) -> Self {
        Self {
            class: crop_index(crop),
            probabilities: None,
        }
    }

    /// Probability mass concentrated on `ranked`, highest first.
    pub fn ranking(ranked: &[&str]) -> Self {
        let mut probabilities = vec![0.0; CROPS.len()];
        for (i, crop) in ranked.iter().enumerate() {
            probabilities[crop_index(crop)] = 0.5 / (i + 1) as f64;
        }
        Self {
            class: crop_index(ranked[0]),
            probabilities: Some(probabilities),
        }
    }
}

impl CropClassifier for FixedClassifier {
    fn predict_class(&self, _features: &FeatureVector) -> Result<usize, PredictionError> {
        Ok(self.class)
    }

    fn predict_proba(&self, _features: &FeatureVector) -> Option<Result<Vec<f64>, PredictionError>> {
        self.probabilities.clone().map(Ok)
    }

    fn name(&self) -> &str {
        "fixed mock"
    }

    fn version(&self) -> &str {
        "test"
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub fn encoder() -> CategoricalEncoder {
    let mut tables = BTreeMap::new();
    tables.insert(Category::Crop, strings(CROPS));
    tables.insert(Category::Region, strings(REGIONS));
    tables.insert(Category::SoilType, strings(SOILS));
    CategoricalEncoder::new("test-profile", tables).unwrap()
}

/// Tomato and Onion cover every month; Chili only October to February.
pub fn seasonal() -> SeasonalTable {
    let all_year: BTreeMap<u32, f64> = (1..=12).map(|m| (m, 0.7)).collect();
    let winter: BTreeMap<u32, f64> = [(10, 0.6), (11, 0.5), (12, 0.4), (1, 0.3), (2, 0.2)]
        .into_iter()
        .collect();
    SeasonalTable::new(BTreeMap::from([
        ("Tomato".to_string(), all_year.clone()),
        ("Onion".to_string(), all_year),
        ("Chili".to_string(), winter),
    ]))
    .unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn price(d: NaiveDate, crop: &str, city: &str, modal_price: f64) -> PriceRecord {
    PriceRecord {
        date: d,
        crop: crop.to_string(),
        city: city.to_string(),
        modal_price,
    }
}

pub fn price_history() -> HistoricalStore<PriceRecord> {
    HistoricalStore::new(
        "price history",
        vec![
            price(date(2025, 6, 1), "Tomato", "Bangalore", 1000.0),
            price(date(2025, 7, 1), "Tomato", "Bangalore", 1100.0),
            price(date(2025, 8, 1), "Tomato", "Bangalore", 1200.0),
            price(date(2025, 8, 1), "Onion", "Mysore", 800.0),
            price(date(2025, 9, 1), "Onion", "Mysore", 850.0),
            price(date(2025, 9, 1), "Cotton", "Davangere", 6000.0),
            price(date(2025, 11, 1), "Chili", "Hubli", 3000.0),
            price(date(2025, 12, 1), "Chili", "Hubli", 3200.0),
        ],
    )
}

pub fn suitability(region: &str, soil: &str, crop: &str, ret: f64, demand: f64) -> SuitabilityRecord {
    SuitabilityRecord {
        region: region.to_string(),
        soil_type: soil.to_string(),
        crop_type: crop.to_string(),
        irrigation: None,
        season: None,
        land_size: None,
        expected_return_per_acre: ret,
        demand_score: demand,
    }
}

pub fn suitability_history() -> HistoricalStore<SuitabilityRecord> {
    HistoricalStore::new(
        "recommendation history",
        vec![
            suitability("South Karnataka", "Loamy", "Tomato", 450.0, 0.8),
            suitability("South Karnataka", "Loamy", "Tomato", 550.0, 0.8),
            suitability("South Karnataka", "Loamy", "Onion", 400.0, 0.9),
            suitability("South Karnataka", "Loamy", "Chili", 900.0, 0.6),
            suitability("North Karnataka", "Sandy", "Cotton", 700.0, 0.5),
            suitability("North Karnataka", "Clay", "Sugarcane", 1200.0, 0.7),
            suitability("North Karnataka", "Clay", "Corn", 300.0, 0.4),
            suitability("North Karnataka", "Loamy", "Chili", 650.0, 0.9),
            suitability("North Karnataka", "Loamy", "Onion", 650.0, 0.6),
        ],
    )
}

pub fn forecast_settings() -> ForecastSettings {
    ForecastSettings {
        schema: FeatureSchema::new(DEFAULT_PRICE_FEATURES.to_vec()).unwrap(),
        clamp: ClampBand::default(),
        period_days: 30,
        moving_average_window: 3,
        max_horizon: 12,
    }
}

pub fn recommendation_settings() -> RecommendationSettings {
    RecommendationSettings {
        schema: FeatureSchema::new(DEFAULT_CROP_FEATURES.to_vec()).unwrap(),
        max_results: 3,
        min_distinct_crops: 2,
    }
}

pub fn context_with(
    price_model: Arc<dyn PricePredictor>,
    crop_model: Arc<dyn CropClassifier>,
) -> AdvisoryContext {
    AdvisoryContext::new(AdvisoryParts {
        encoder: encoder(),
        seasonal: seasonal(),
        prices: price_history(),
        suitability: suitability_history(),
        price_model,
        crop_model,
        crop_stats: BTreeMap::new(),
        forecast: forecast_settings(),
        recommendation: recommendation_settings(),
        default_horizon: 5,
    })
    .unwrap()
}
