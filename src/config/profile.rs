//! Advisory profile: vocabularies, seasonal tables and pipeline settings.
//!
//! Loaded from TOML at startup so new crops or regions need no code change.
//! The vocabularies here must match those recorded in the model artifacts.

use crate::application::forecasting::ForecastSettings;
use crate::application::recommendation::{MAX_RECOMMENDATIONS, RecommendationSettings};
use crate::domain::encoding::{CategoricalEncoder, Category};
use crate::domain::errors::ConfigError;
use crate::domain::forecast::ClampBand;
use crate::domain::ml::feature_registry::{
    DEFAULT_CROP_FEATURES, DEFAULT_PRICE_FEATURES, Feature, FeatureSchema,
    PRICE_PIPELINE_FEATURES, RECOMMENDATION_PIPELINE_FEATURES,
};
use crate::domain::seasonality::SeasonalTable;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// One forecast period may not exceed a leap year.
const MAX_PERIOD_DAYS: i64 = 366;

#[derive(Debug, Clone, Deserialize)]
pub struct VocabularyConfig {
    pub soil_type: Vec<String>,
    pub region: Vec<String>,
    pub crop: Vec<String>,
    #[serde(default)]
    pub irrigation: Option<Vec<String>>,
    #[serde(default)]
    pub season: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastProfile {
    pub horizon: usize,
    pub max_horizon: usize,
    pub period_days: i64,
    pub moving_average_window: usize,
    pub clamp: ClampBand,
    pub features: Vec<Feature>,
    /// Crop -> month number ("1".."12") -> multiplier
    pub seasonal_index: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Default for ForecastProfile {
    fn default() -> Self {
        Self {
            horizon: 5,
            max_horizon: 12,
            period_days: 30,
            moving_average_window: 3,
            clamp: ClampBand::default(),
            features: DEFAULT_PRICE_FEATURES.to_vec(),
            seasonal_index: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecommendationProfile {
    pub max_results: usize,
    pub min_distinct_crops: usize,
    pub features: Vec<Feature>,
}

impl Default for RecommendationProfile {
    fn default() -> Self {
        Self {
            max_results: MAX_RECOMMENDATIONS,
            min_distinct_crops: 2,
            features: DEFAULT_CROP_FEATURES.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdvisoryProfile {
    pub version: String,
    pub vocabulary: VocabularyConfig,
    #[serde(default)]
    pub forecast: ForecastProfile,
    #[serde(default)]
    pub recommendation: RecommendationProfile,
}

/// Validated runtime pieces built from a profile.
#[derive(Debug, Clone)]
pub struct ProfileParts {
    pub encoder: CategoricalEncoder,
    pub seasonal: SeasonalTable,
    pub forecast: ForecastSettings,
    pub recommendation: RecommendationSettings,
    pub default_horizon: usize,
}

impl AdvisoryProfile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingArtifact {
                resource: "advisory profile".to_string(),
                path: path.display().to_string(),
            });
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::CorruptArtifact {
            resource: "advisory profile".to_string(),
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let profile = Self::from_toml_str(&content)?;
        info!("Loaded advisory profile {} from {:?}", profile.version, path);
        Ok(profile)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidProfile {
            reason: e.to_string(),
        })
    }

    pub fn build(&self) -> Result<ProfileParts, ConfigError> {
        let encoder = CategoricalEncoder::new(&self.version, self.vocabulary_tables())?;
        let seasonal = SeasonalTable::new(self.seasonal_profiles()?)?;

        for crop in encoder.vocabulary(Category::Crop) {
            if !seasonal.has_profile(crop) {
                warn!("Crop {} has no seasonal profile; forecasts for it will fail", crop);
            }
        }

        let fc = &self.forecast;
        fc.clamp.validate()?;
        if fc.max_horizon == 0 || fc.horizon == 0 || fc.horizon > fc.max_horizon {
            return Err(invalid(format!(
                "forecast horizon {} must be between 1 and max_horizon {}",
                fc.horizon, fc.max_horizon
            )));
        }
        if !(1..=MAX_PERIOD_DAYS).contains(&fc.period_days) {
            return Err(invalid(format!(
                "period_days must be between 1 and {}, got {}",
                MAX_PERIOD_DAYS, fc.period_days
            )));
        }
        if fc.moving_average_window == 0 {
            return Err(invalid("moving_average_window must be at least 1".to_string()));
        }
        let price_schema = FeatureSchema::new(fc.features.clone())?;
        price_schema.ensure_supported(PRICE_PIPELINE_FEATURES, "price forecast")?;

        let rc = &self.recommendation;
        if rc.max_results == 0 || rc.max_results > MAX_RECOMMENDATIONS {
            return Err(invalid(format!(
                "recommendation max_results must be between 1 and {}, got {}",
                MAX_RECOMMENDATIONS, rc.max_results
            )));
        }
        let crop_schema = FeatureSchema::new(rc.features.clone())?;
        crop_schema.ensure_supported(RECOMMENDATION_PIPELINE_FEATURES, "recommendation")?;
        for (feature, category) in [(Feature::Irrigation, Category::Irrigation), (Feature::Season, Category::Season)] {
            if crop_schema.requires(feature) && !encoder.has(category) {
                return Err(invalid(format!(
                    "recommendation schema uses {:?} but no {} vocabulary is defined",
                    feature, category
                )));
            }
        }

        Ok(ProfileParts {
            forecast: ForecastSettings {
                schema: price_schema,
                clamp: fc.clamp,
                period_days: fc.period_days,
                moving_average_window: fc.moving_average_window,
                max_horizon: fc.max_horizon,
            },
            recommendation: RecommendationSettings {
                schema: crop_schema,
                max_results: rc.max_results,
                min_distinct_crops: rc.min_distinct_crops,
            },
            default_horizon: fc.horizon,
            encoder,
            seasonal,
        })
    }

    fn vocabulary_tables(&self) -> BTreeMap<Category, Vec<String>> {
        let v = &self.vocabulary;
        let mut tables = BTreeMap::new();
        tables.insert(Category::SoilType, v.soil_type.clone());
        tables.insert(Category::Region, v.region.clone());
        tables.insert(Category::Crop, v.crop.clone());
        if let Some(irrigation) = &v.irrigation {
            tables.insert(Category::Irrigation, irrigation.clone());
        }
        if let Some(season) = &v.season {
            tables.insert(Category::Season, season.clone());
        }
        tables
    }

    fn seasonal_profiles(&self) -> Result<BTreeMap<String, BTreeMap<u32, f64>>, ConfigError> {
        self.forecast
            .seasonal_index
            .iter()
            .map(|(crop, months)| {
                let parsed = months
                    .iter()
                    .map(|(month, &index)| {
                        month
                            .trim()
                            .parse::<u32>()
                            .map(|m| (m, index))
                            .map_err(|_| invalid(format!("seasonal month '{}' for {} is not a number", month, crop)))
                    })
                    .collect::<Result<BTreeMap<u32, f64>, ConfigError>>()?;
                Ok((crop.clone(), parsed))
            })
            .collect()
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::InvalidProfile { reason }
}
