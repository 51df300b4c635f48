//! Loaded advisory state and the two collaborator operations.
//!
//! `AdvisoryContext` is immutable once built and safe to share between
//! threads. `AdvisoryHandle` swaps in a freshly loaded context on reload and
//! keeps the previous one if loading fails.

use crate::application::forecasting::{ForecastSettings, IterativeForecaster};
use crate::application::ml::predictor::{CropClassifier, PricePredictor};
use crate::application::price_statistics::CropStatistics;
use crate::application::recommendation::{RecommendationRanker, RecommendationSettings};
use crate::config::{AdvisoryProfile, Config, ProfileParts};
use crate::domain::encoding::{CategoricalEncoder, Category};
use crate::domain::errors::{AdvisoryResult, ConfigError};
use crate::domain::forecast::Forecast;
use crate::domain::history::{Field, HistoricalStore, PriceRecord, SuitabilityRecord};
use crate::domain::ml::feature_registry::{
    PRICE_PIPELINE_FEATURES, RECOMMENDATION_PIPELINE_FEATURES,
};
use crate::domain::recommendation::{RecommendationCandidate, RecommendationQuery};
use crate::domain::seasonality::SeasonalTable;
use crate::infrastructure::datasets::{load_price_history, load_suitability_history};
use crate::infrastructure::model_artifacts::{CropModelArtifact, PriceModelArtifact};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Everything a context is assembled from.
pub struct AdvisoryParts {
    pub encoder: CategoricalEncoder,
    pub seasonal: SeasonalTable,
    pub prices: HistoricalStore<PriceRecord>,
    pub suitability: HistoricalStore<SuitabilityRecord>,
    pub price_model: Arc<dyn PricePredictor>,
    pub crop_model: Arc<dyn CropClassifier>,
    /// Keyed by lower-cased crop name.
    pub crop_stats: BTreeMap<String, CropStatistics>,
    pub forecast: ForecastSettings,
    pub recommendation: RecommendationSettings,
    pub default_horizon: usize,
}

/// Selectable values present in the loaded datasets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    pub crops: Vec<String>,
    pub cities: Vec<String>,
    pub regions: Vec<String>,
    pub soil_types: Vec<String>,
}

/// Identity of the loaded models and profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub profile_version: String,
    pub price_model: String,
    pub price_model_version: String,
    pub crop_model: String,
    pub crop_model_version: String,
    pub price_rows: usize,
    pub recommendation_rows: usize,
}

pub struct AdvisoryContext {
    encoder: CategoricalEncoder,
    seasonal: SeasonalTable,
    prices: HistoricalStore<PriceRecord>,
    suitability: HistoricalStore<SuitabilityRecord>,
    price_model: Arc<dyn PricePredictor>,
    crop_model: Arc<dyn CropClassifier>,
    crop_stats: BTreeMap<String, CropStatistics>,
    forecast: ForecastSettings,
    recommendation: RecommendationSettings,
    default_horizon: usize,
}

impl AdvisoryContext {
    pub fn new(parts: AdvisoryParts) -> Result<Self, ConfigError> {
        parts
            .forecast
            .schema
            .ensure_supported(PRICE_PIPELINE_FEATURES, "price forecast")?;
        parts
            .recommendation
            .schema
            .ensure_supported(RECOMMENDATION_PIPELINE_FEATURES, "recommendation")?;
        parts.forecast.clamp.validate()?;
        if parts.default_horizon == 0 || parts.default_horizon > parts.forecast.max_horizon {
            return Err(ConfigError::InvalidProfile {
                reason: format!(
                    "default horizon {} must be between 1 and {}",
                    parts.default_horizon, parts.forecast.max_horizon
                ),
            });
        }

        Ok(Self {
            encoder: parts.encoder,
            seasonal: parts.seasonal,
            prices: parts.prices,
            suitability: parts.suitability,
            price_model: parts.price_model,
            crop_model: parts.crop_model,
            crop_stats: parts.crop_stats,
            forecast: parts.forecast,
            recommendation: parts.recommendation,
            default_horizon: parts.default_horizon,
        })
    }

    /// Loads profile, datasets and model artifacts named by `config`.
    pub fn load(config: &Config) -> AdvisoryResult<Self> {
        let profile = AdvisoryProfile::load(&config.profile_path)?;
        let ProfileParts {
            encoder,
            seasonal,
            forecast,
            recommendation,
            default_horizon,
        } = profile.build()?;

        let price_artifact = PriceModelArtifact::load(&config.price_model_path)?;
        price_artifact.validate(&forecast.schema, &encoder)?;
        let (price_model, crop_stats) = price_artifact.into_predictor();

        let crop_artifact = CropModelArtifact::load(&config.crop_model_path)?;
        crop_artifact.validate(&recommendation.schema, &encoder)?;
        let crop_model = crop_artifact.into_classifier();

        let prices = load_price_history(&config.price_data_path)?;
        let suitability = load_suitability_history(&config.recommendation_data_path)?;

        let context = Self::new(AdvisoryParts {
            encoder,
            seasonal,
            prices,
            suitability,
            price_model: Arc::new(price_model),
            crop_model: Arc::new(crop_model),
            crop_stats,
            forecast,
            recommendation,
            default_horizon: config.default_horizon.unwrap_or(default_horizon),
        })?;

        let models = context.model_info();
        info!(
            "Advisory context ready: profile {}, {} v{}, {} v{}",
            models.profile_version,
            models.price_model,
            models.price_model_version,
            models.crop_model,
            models.crop_model_version
        );
        Ok(context)
    }

    pub fn default_horizon(&self) -> usize {
        self.default_horizon
    }

    pub fn encoder(&self) -> &CategoricalEncoder {
        &self.encoder
    }

    /// Price trajectory for `horizon` future periods of `crop` in `city`.
    pub fn forecast_prices(&self, crop: &str, city: &str, horizon: usize) -> AdvisoryResult<Forecast> {
        IterativeForecaster {
            predictor: self.price_model.as_ref(),
            history: &self.prices,
            encoder: &self.encoder,
            seasonal: &self.seasonal,
            crop_stats: &self.crop_stats,
            settings: &self.forecast,
        }
        .forecast(crop, city, horizon)
    }

    /// Up to three crops ranked by expected return for the caller's land.
    pub fn recommend_crops(
        &self,
        query: &RecommendationQuery,
    ) -> AdvisoryResult<Vec<RecommendationCandidate>> {
        RecommendationRanker {
            classifier: self.crop_model.as_ref(),
            history: &self.suitability,
            encoder: &self.encoder,
            settings: &self.recommendation,
        }
        .recommend(query)
    }

    pub fn catalog(&self) -> Catalog {
        let mut soil_types = self.suitability.distinct(Field::SoilType, &[]);
        if soil_types.is_empty() {
            soil_types = self.encoder.vocabulary(Category::SoilType).to_vec();
        }
        Catalog {
            crops: self.prices.distinct(Field::Crop, &[]),
            cities: self.prices.distinct(Field::City, &[]),
            regions: self.suitability.distinct(Field::Region, &[]),
            soil_types,
        }
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            profile_version: self.encoder.version().to_string(),
            price_model: self.price_model.name().to_string(),
            price_model_version: self.price_model.version().to_string(),
            crop_model: self.crop_model.name().to_string(),
            crop_model_version: self.crop_model.version().to_string(),
            price_rows: self.prices.len(),
            recommendation_rows: self.suitability.len(),
        }
    }
}

/// Shared pointer to the current context with load-once/reload semantics.
pub struct AdvisoryHandle {
    current: RwLock<Arc<AdvisoryContext>>,
}

impl AdvisoryHandle {
    pub fn new(context: AdvisoryContext) -> Self {
        Self {
            current: RwLock::new(Arc::new(context)),
        }
    }

    pub fn load(config: &Config) -> AdvisoryResult<Self> {
        Ok(Self::new(AdvisoryContext::load(config)?))
    }

    /// Snapshot of the current context. Callers keep it for the whole request.
    pub fn current(&self) -> Arc<AdvisoryContext> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, context: AdvisoryContext) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(context);
    }

    /// Rebuilds the context from `config`. On failure the previous context stays active.
    pub fn reload(&self, config: &Config) -> AdvisoryResult<()> {
        let context = AdvisoryContext::load(config)?;
        self.replace(context);
        info!("Advisory context reloaded");
        Ok(())
    }
}
