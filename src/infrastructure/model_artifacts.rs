//! Loading of fitted model artifacts.
//!
//! An artifact is a JSON document bundling the serialized smartcore model with
//! the column names and vocabularies it was trained on. Both are checked
//! against the advisory profile before the model is handed to a pipeline.

use crate::application::ml::smartcore_predictor::{
    ClassificationModel, RegressionModel, SmartCoreCropClassifier, SmartCorePricePredictor,
};
use crate::application::price_statistics::CropStatistics;
use crate::domain::encoding::{CategoricalEncoder, Category};
use crate::domain::errors::ConfigError;
use crate::domain::ml::feature_registry::FeatureSchema;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

pub const PRICE_MODEL: &str = "price model";
pub const CROP_MODEL: &str = "crop model";

#[derive(Deserialize)]
pub struct PriceModelArtifact {
    pub version: String,
    pub feature_names: Vec<String>,
    pub crop_vocabulary: Vec<String>,
    #[serde(default)]
    pub crop_stats: BTreeMap<String, CropStatistics>,
    pub model: RegressionModel,
}

#[derive(Deserialize)]
pub struct CropModelArtifact {
    pub version: String,
    pub feature_names: Vec<String>,
    /// Class labels in index order.
    pub classes: Vec<String>,
    #[serde(default)]
    pub soil_types: Option<Vec<String>>,
    #[serde(default)]
    pub regions: Option<Vec<String>>,
    pub model: ClassificationModel,
}

impl PriceModelArtifact {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let artifact: Self = read_json(path, PRICE_MODEL)?;
        info!(
            "Loaded {} v{} from {:?} ({} features)",
            PRICE_MODEL,
            artifact.version,
            path,
            artifact.feature_names.len()
        );
        Ok(artifact)
    }

    pub fn validate(&self, schema: &FeatureSchema, encoder: &CategoricalEncoder) -> Result<(), ConfigError> {
        encoder.ensure_matches(Category::Crop, &self.crop_vocabulary, PRICE_MODEL)?;
        schema.ensure_matches(encoder, &self.feature_names, PRICE_MODEL)
    }

    /// Predictor plus crop statistics keyed by lower-cased crop name.
    pub fn into_predictor(self) -> (SmartCorePricePredictor, BTreeMap<String, CropStatistics>) {
        let stats = self
            .crop_stats
            .into_iter()
            .map(|(crop, s)| (crop.trim().to_lowercase(), s))
            .collect();
        (SmartCorePricePredictor::new(self.model, self.version), stats)
    }
}

impl CropModelArtifact {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let artifact: Self = read_json(path, CROP_MODEL)?;
        info!(
            "Loaded {} v{} from {:?} ({} classes)",
            CROP_MODEL,
            artifact.version,
            path,
            artifact.classes.len()
        );
        Ok(artifact)
    }

    pub fn validate(&self, schema: &FeatureSchema, encoder: &CategoricalEncoder) -> Result<(), ConfigError> {
        encoder.ensure_matches(Category::Crop, &self.classes, CROP_MODEL)?;
        if let Some(soil_types) = &self.soil_types {
            encoder.ensure_matches(Category::SoilType, soil_types, CROP_MODEL)?;
        }
        if let Some(regions) = &self.regions {
            encoder.ensure_matches(Category::Region, regions, CROP_MODEL)?;
        }
        schema.ensure_matches(encoder, &self.feature_names, CROP_MODEL)
    }

    pub fn into_classifier(self) -> SmartCoreCropClassifier {
        SmartCoreCropClassifier::new(self.model, self.version)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, resource: &str) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingArtifact {
            resource: resource.to_string(),
            path: path.display().to_string(),
        });
    }

    let corrupt = |reason: String| ConfigError::CorruptArtifact {
        resource: resource.to_string(),
        path: path.display().to_string(),
        reason,
    };

    let file = File::open(path).map_err(|e| corrupt(e.to_string()))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| corrupt(e.to_string()))
}
