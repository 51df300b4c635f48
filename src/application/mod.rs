// Loaded state shared by both advisory operations
pub mod advisory;

// Price trajectory forecasting
pub mod forecasting;
pub mod price_statistics;

// Crop recommendation ranking
pub mod recommendation;

pub mod ml;
