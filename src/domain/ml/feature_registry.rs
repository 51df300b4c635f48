//! Ordered feature schemas shared by the pipelines and the model adapters.
//!
//! The order of a schema MUST match the column order the model was fitted
//! with. Artifacts record their training-time column names and are checked
//! against the configured schema when they are loaded.

use crate::domain::encoding::{CategoricalEncoder, Category};
use crate::domain::errors::{AdvisoryError, ConfigError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    // Price forecasting
    CropOneHot,
    MonthSin,
    MonthCos,
    SeasonalIndex,
    LaggedPrice,
    MovingAverage,
    CropMin,
    CropMax,
    CropMean,
    CropTrend,
    // Crop recommendation
    SoilType,
    Region,
    LandSize,
    Irrigation,
    Season,
}

/// Default price model column layout.
pub const DEFAULT_PRICE_FEATURES: &[Feature] = &[
    Feature::CropOneHot,
    Feature::MonthSin,
    Feature::MonthCos,
    Feature::SeasonalIndex,
    Feature::LaggedPrice,
];

/// Default crop classifier column layout.
pub const DEFAULT_CROP_FEATURES: &[Feature] =
    &[Feature::SoilType, Feature::Region, Feature::LandSize];

pub const PRICE_PIPELINE_FEATURES: &[Feature] = &[
    Feature::CropOneHot,
    Feature::MonthSin,
    Feature::MonthCos,
    Feature::SeasonalIndex,
    Feature::LaggedPrice,
    Feature::MovingAverage,
    Feature::CropMin,
    Feature::CropMax,
    Feature::CropMean,
    Feature::CropTrend,
];

pub const RECOMMENDATION_PIPELINE_FEATURES: &[Feature] = &[
    Feature::SoilType,
    Feature::Region,
    Feature::LandSize,
    Feature::Irrigation,
    Feature::Season,
];

impl Feature {
    /// Training-time column names. One-hot crop expands to one column per crop.
    fn column_names(&self, encoder: &CategoricalEncoder) -> Vec<String> {
        let name = match self {
            Feature::CropOneHot => {
                return encoder
                    .vocabulary(Category::Crop)
                    .iter()
                    .map(|c| format!("Crop_{}", c))
                    .collect();
            }
            Feature::MonthSin => "Month_sin",
            Feature::MonthCos => "Month_cos",
            Feature::SeasonalIndex => "Seasonal_Index",
            Feature::LaggedPrice => "Lagged_Price",
            Feature::MovingAverage => "Moving_Avg",
            Feature::CropMin => "Crop_Min",
            Feature::CropMax => "Crop_Max",
            Feature::CropMean => "Crop_Mean",
            Feature::CropTrend => "Crop_Trend",
            Feature::SoilType => "soil_type",
            Feature::Region => "region",
            Feature::LandSize => "land_size",
            Feature::Irrigation => "irrigation",
            Feature::Season => "season",
        };
        vec![name.to_string()]
    }
}

/// Inputs available to one feature assembly. Unset values are unavailable.
#[derive(Debug, Clone, Default)]
pub struct FeatureContext<'a> {
    pub crop: Option<&'a str>,
    pub month_sin: Option<f64>,
    pub month_cos: Option<f64>,
    pub seasonal_index: Option<f64>,
    pub lagged_price: Option<f64>,
    pub moving_average: Option<f64>,
    pub crop_min: Option<f64>,
    pub crop_max: Option<f64>,
    pub crop_mean: Option<f64>,
    pub crop_trend: Option<f64>,
    pub soil_type: Option<&'a str>,
    pub region: Option<&'a str>,
    pub land_size: Option<f64>,
    pub irrigation: Option<&'a str>,
    pub season: Option<&'a str>,
}

/// Model input row, built fresh for every prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    features: Vec<Feature>,
}

impl FeatureSchema {
    pub fn new(features: Vec<Feature>) -> Result<Self, ConfigError> {
        if features.is_empty() {
            return Err(ConfigError::InvalidProfile {
                reason: "feature schema is empty".to_string(),
            });
        }
        for (i, f) in features.iter().enumerate() {
            if features[..i].contains(f) {
                return Err(ConfigError::InvalidProfile {
                    reason: format!("feature {:?} appears twice in schema", f),
                });
            }
        }
        Ok(Self { features })
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn requires(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    /// Rejects features the pipeline using this schema cannot supply.
    pub fn ensure_supported(&self, supported: &[Feature], pipeline: &str) -> Result<(), ConfigError> {
        match self.features.iter().find(|f| !supported.contains(f)) {
            Some(f) => Err(ConfigError::InvalidProfile {
                reason: format!("feature {:?} is not available to the {} pipeline", f, pipeline),
            }),
            None => Ok(()),
        }
    }

    pub fn column_names(&self, encoder: &CategoricalEncoder) -> Vec<String> {
        self.features
            .iter()
            .flat_map(|f| f.column_names(encoder))
            .collect()
    }

    /// Fails when the artifact's recorded columns differ from this schema.
    pub fn ensure_matches(
        &self,
        encoder: &CategoricalEncoder,
        artifact_columns: &[String],
        model: &str,
    ) -> Result<(), ConfigError> {
        let expected = self.column_names(encoder);
        if expected.as_slice() == artifact_columns {
            Ok(())
        } else {
            Err(ConfigError::SchemaMismatch {
                model: model.to_string(),
                expected,
                found: artifact_columns.to_vec(),
            })
        }
    }

    pub fn assemble(
        &self,
        ctx: &FeatureContext<'_>,
        encoder: &CategoricalEncoder,
    ) -> Result<FeatureVector, AdvisoryError> {
        let mut values = Vec::with_capacity(self.features.len());
        for &feature in &self.features {
            match feature {
                Feature::CropOneHot => {
                    let crop = require_str(ctx.crop, feature)?;
                    values.extend(encoder.one_hot(Category::Crop, crop)?);
                }
                Feature::SoilType => values.push(encode(ctx.soil_type, feature, Category::SoilType, encoder)?),
                Feature::Region => values.push(encode(ctx.region, feature, Category::Region, encoder)?),
                Feature::Irrigation => {
                    values.push(encode(ctx.irrigation, feature, Category::Irrigation, encoder)?)
                }
                Feature::Season => values.push(encode(ctx.season, feature, Category::Season, encoder)?),
                Feature::MonthSin => values.push(require(ctx.month_sin, feature)?),
                Feature::MonthCos => values.push(require(ctx.month_cos, feature)?),
                Feature::SeasonalIndex => values.push(require(ctx.seasonal_index, feature)?),
                Feature::LaggedPrice => values.push(require(ctx.lagged_price, feature)?),
                Feature::MovingAverage => values.push(require(ctx.moving_average, feature)?),
                Feature::CropMin => values.push(require(ctx.crop_min, feature)?),
                Feature::CropMax => values.push(require(ctx.crop_max, feature)?),
                Feature::CropMean => values.push(require(ctx.crop_mean, feature)?),
                Feature::CropTrend => values.push(require(ctx.crop_trend, feature)?),
                Feature::LandSize => values.push(require(ctx.land_size, feature)?),
            }
        }
        Ok(FeatureVector::new(values))
    }
}

fn unavailable(feature: Feature) -> ConfigError {
    ConfigError::InvalidProfile {
        reason: format!("schema requires {:?} but no value was supplied", feature),
    }
}

fn require(value: Option<f64>, feature: Feature) -> Result<f64, ConfigError> {
    value.ok_or_else(|| unavailable(feature))
}

fn require_str(value: Option<&str>, feature: Feature) -> Result<&str, ConfigError> {
    value.ok_or_else(|| unavailable(feature))
}

fn encode(
    value: Option<&str>,
    feature: Feature,
    category: Category,
    encoder: &CategoricalEncoder,
) -> Result<f64, AdvisoryError> {
    let value = require_str(value, feature)?;
    Ok(encoder.encode(category, value)? as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn encoder() -> CategoricalEncoder {
        let mut tables = BTreeMap::new();
        tables.insert(
            Category::Crop,
            vec!["Onion".to_string(), "Tomato".to_string()],
        );
        tables.insert(
            Category::SoilType,
            vec!["Loamy".to_string(), "Sandy".to_string()],
        );
        tables.insert(
            Category::Region,
            vec!["North Karnataka".to_string(), "South Karnataka".to_string()],
        );
        CategoricalEncoder::new("test", tables).unwrap()
    }

    #[test]
    fn test_default_price_columns() {
        let schema = FeatureSchema::new(DEFAULT_PRICE_FEATURES.to_vec()).unwrap();
        assert_eq!(
            schema.column_names(&encoder()),
            vec![
                "Crop_Onion",
                "Crop_Tomato",
                "Month_sin",
                "Month_cos",
                "Seasonal_Index",
                "Lagged_Price"
            ]
        );
    }

    #[test]
    fn test_assemble_price_vector_in_order() {
        let schema = FeatureSchema::new(DEFAULT_PRICE_FEATURES.to_vec()).unwrap();
        let ctx = FeatureContext {
            crop: Some("tomato"),
            month_sin: Some(0.5),
            month_cos: Some(-0.5),
            seasonal_index: Some(0.6),
            lagged_price: Some(1200.0),
            ..Default::default()
        };
        let fv = schema.assemble(&ctx, &encoder()).unwrap();
        assert_eq!(fv.as_slice(), &[0.0, 1.0, 0.5, -0.5, 0.6, 1200.0]);
    }

    #[test]
    fn test_assemble_recommendation_vector() {
        let schema = FeatureSchema::new(DEFAULT_CROP_FEATURES.to_vec()).unwrap();
        let ctx = FeatureContext {
            soil_type: Some("Sandy"),
            region: Some("South Karnataka"),
            land_size: Some(2.5),
            ..Default::default()
        };
        let fv = schema.assemble(&ctx, &encoder()).unwrap();
        assert_eq!(fv.as_slice(), &[1.0, 1.0, 2.5]);
    }

    #[test]
    fn test_missing_value_is_reported() {
        let schema = FeatureSchema::new(vec![Feature::MovingAverage]).unwrap();
        let err = schema
            .assemble(&FeatureContext::default(), &encoder())
            .unwrap_err();
        assert!(err.to_string().contains("MovingAverage"));
    }

    #[test]
    fn test_schema_mismatch_detected() {
        let schema = FeatureSchema::new(DEFAULT_CROP_FEATURES.to_vec()).unwrap();
        let found = vec!["region".to_string(), "soil_type".to_string(), "land_size".to_string()];
        assert!(matches!(
            schema.ensure_matches(&encoder(), &found, "crop model"),
            Err(ConfigError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicates_and_foreign_features() {
        assert!(FeatureSchema::new(vec![Feature::LaggedPrice, Feature::LaggedPrice]).is_err());

        let schema = FeatureSchema::new(vec![Feature::Region, Feature::LaggedPrice]).unwrap();
        assert!(schema.ensure_supported(RECOMMENDATION_PIPELINE_FEATURES, "recommendation").is_err());
    }
}
