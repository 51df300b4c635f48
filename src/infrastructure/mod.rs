// Historical CSV datasets
pub mod datasets;

// Serialized model artifacts
pub mod model_artifacts;
