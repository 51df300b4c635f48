//! Configuration module for AgriPredict.
//!
//! Locations come from environment variables (optionally via `.env`); the
//! advisory profile those locations point at is TOML.

mod paths_config;
pub mod profile;

pub use paths_config::PathsEnvConfig;
pub use profile::{AdvisoryProfile, ProfileParts};

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // Paths (from PathsEnvConfig)
    pub profile_path: PathBuf,
    pub price_data_path: PathBuf,
    pub recommendation_data_path: PathBuf,
    pub price_model_path: PathBuf,
    pub crop_model_path: PathBuf,

    /// Overrides the profile's forecast horizon when set.
    pub default_horizon: Option<usize>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let paths = PathsEnvConfig::from_env();

        let default_horizon = match env::var("AGRI_DEFAULT_HORIZON") {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<usize>()
                    .context(format!("Invalid AGRI_DEFAULT_HORIZON: {}", raw))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            profile_path: paths.profile_path,
            price_data_path: paths.price_data_path,
            recommendation_data_path: paths.recommendation_data_path,
            price_model_path: paths.price_model_path,
            crop_model_path: paths.crop_model_path,
            default_horizon,
        })
    }
}
