// Categorical vocabularies and encodings
pub mod encoding;

// Domain-specific error types
pub mod errors;

// Forecast state and results
pub mod forecast;

// Historical reference data
pub mod history;

// Feature schemas
pub mod ml;

// Recommendation queries and results
pub mod recommendation;

// Seasonal price multipliers
pub mod seasonality;
