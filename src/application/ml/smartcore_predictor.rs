use super::predictor::{CropClassifier, PricePredictor};
use crate::domain::errors::PredictionError;
use crate::domain::ml::feature_registry::FeatureVector;
use serde::Deserialize;
use smartcore::ensemble::random_forest_classifier::RandomForestClassifier;
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::LinearRegression;

/// Serialized smartcore regressors, tagged by `kind`.
#[derive(Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum RegressionModel {
    RandomForest(RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    Linear(LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>),
}

impl RegressionModel {
    fn label(&self) -> &'static str {
        match self {
            RegressionModel::RandomForest(_) => "SmartCore Random Forest Regressor",
            RegressionModel::Linear(_) => "SmartCore Linear Regression",
        }
    }
}

/// Serialized smartcore classifiers, tagged by `kind`.
#[derive(Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum ClassificationModel {
    RandomForest(RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>),
}

fn to_matrix(features: &FeatureVector, model: &str) -> Result<DenseMatrix<f64>, PredictionError> {
    DenseMatrix::from_2d_vec(&vec![features.as_slice().to_vec()]).map_err(|e| {
        PredictionError::Failed {
            model: model.to_string(),
            reason: format!("Matrix creation failed: {}", e),
        }
    })
}

pub struct SmartCorePricePredictor {
    model: RegressionModel,
    version: String,
}

impl SmartCorePricePredictor {
    pub fn new(model: RegressionModel, version: impl Into<String>) -> Self {
        Self {
            model,
            version: version.into(),
        }
    }
}

impl PricePredictor for SmartCorePricePredictor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        let input = to_matrix(features, self.name())?;
        let predictions = match &self.model {
            RegressionModel::RandomForest(m) => m.predict(&input),
            RegressionModel::Linear(m) => m.predict(&input),
        }
        .map_err(|e| PredictionError::Failed {
            model: self.name().to_string(),
            reason: format!("Prediction failed: {}", e),
        })?;

        predictions
            .first()
            .copied()
            .ok_or_else(|| PredictionError::Failed {
                model: self.name().to_string(),
                reason: "No prediction returned".to_string(),
            })
    }

    fn name(&self) -> &str {
        self.model.label()
    }

    fn version(&self) -> &str {
        &self.version
    }
}

pub struct SmartCoreCropClassifier {
    model: ClassificationModel,
    version: String,
}

impl SmartCoreCropClassifier {
    pub fn new(model: ClassificationModel, version: impl Into<String>) -> Self {
        Self {
            model,
            version: version.into(),
        }
    }
}

impl CropClassifier for SmartCoreCropClassifier {
    fn predict_class(&self, features: &FeatureVector) -> Result<usize, PredictionError> {
        let input = to_matrix(features, self.name())?;
        let labels = match &self.model {
            ClassificationModel::RandomForest(m) => m.predict(&input),
        }
        .map_err(|e| PredictionError::Failed {
            model: self.name().to_string(),
            reason: format!("Prediction failed: {}", e),
        })?;

        labels
            .first()
            .map(|&label| label as usize)
            .ok_or_else(|| PredictionError::Failed {
                model: self.name().to_string(),
                reason: "No prediction returned".to_string(),
            })
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest Classifier"
    }

    fn version(&self) -> &str {
        &self.version
    }
}
