use crate::domain::errors::PredictionError;
use crate::domain::ml::feature_registry::FeatureVector;

/// Fitted regression model used by the price forecaster.
pub trait PricePredictor: Send + Sync {
    /// Point prediction for one assembled feature row.
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError>;

    /// Get model name/type
    fn name(&self) -> &str;

    /// Get model version/id
    fn version(&self) -> &str;
}

/// Fitted classifier used by the crop recommender.
///
/// Class indices are positions in the crop vocabulary the model was trained with.
pub trait CropClassifier: Send + Sync {
    /// Single best class.
    fn predict_class(&self, features: &FeatureVector) -> Result<usize, PredictionError>;

    /// Probability per class, indexed like `predict_class`.
    /// `None` when the model cannot rank classes.
    fn predict_proba(&self, _features: &FeatureVector) -> Option<Result<Vec<f64>, PredictionError>> {
        None
    }

    fn name(&self) -> &str;

    fn version(&self) -> &str;
}
