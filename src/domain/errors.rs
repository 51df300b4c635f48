use thiserror::Error;

/// Caller-side input problems. Surfaced verbatim, never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid {field} '{value}': expected one of [{}]", .accepted.join(", "))]
    InvalidCategory {
        field: String,
        value: String,
        accepted: Vec<String>,
    },

    #[error("Unknown {field} code {code}")]
    UnknownCode { field: String, code: u32 },

    #[error("Land area must be a positive number, got {land_area}")]
    NonPositiveLandArea { land_area: f64 },

    #[error("Forecast horizon must be between 1 and {max}, got {horizon}")]
    InvalidHorizon { horizon: usize, max: usize },
}

/// Fatal configuration faults: missing or inconsistent artifacts and datasets.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {resource} at {path}")]
    MissingArtifact { resource: String, path: String },

    #[error("Corrupt {resource} at {path}: {reason}")]
    CorruptArtifact {
        resource: String,
        path: String,
        reason: String,
    },

    #[error("Dataset '{dataset}' is missing required column '{column}'")]
    MissingColumn { dataset: String, column: String },

    #[error("Dataset '{dataset}' line {line}: {reason}")]
    MalformedRow {
        dataset: String,
        line: u64,
        reason: String,
    },

    #[error("Feature schema mismatch for {model}: expected {expected:?}, artifact has {found:?}")]
    SchemaMismatch {
        model: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Vocabulary mismatch for {field} in {model}: profile has {profile:?}, artifact has {artifact:?}")]
    VocabularyMismatch {
        model: String,
        field: String,
        profile: Vec<String>,
        artifact: Vec<String>,
    },

    #[error("Invalid advisory profile: {reason}")]
    InvalidProfile { reason: String },
}

/// Forecast-specific outcomes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("No historical price data for {crop} in {city}")]
    NoHistoricalData { crop: String, city: String },

    #[error("No seasonal profile for {crop}{}", .month.map(|m| format!(" in month {m}")).unwrap_or_default())]
    UnknownSeasonalProfile { crop: String, month: Option<u32> },

    #[error("Missing {statistic} statistic for {crop}")]
    MissingCropStatistic { crop: String, statistic: String },
}

/// Failures raised while invoking a fitted model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("{model} failed: {reason}")]
    Failed { model: String, reason: String },

    #[error("{model} returned a non-finite value at step {step}")]
    NonFinite { model: String, step: usize },

    #[error("{model} returned class index {index} outside {classes} known classes")]
    UnknownClass {
        model: String,
        index: usize,
        classes: usize,
    },
}

/// Top-level error for the advisory operations.
#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl AdvisoryError {
    /// True for errors caused by the caller's input rather than the deployment.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, AdvisoryError::Validation(_))
    }
}

pub type AdvisoryResult<T> = Result<T, AdvisoryError>;
