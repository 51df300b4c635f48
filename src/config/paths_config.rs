//! Data and artifact locations parsed from environment variables.
//!
//! Every path defaults to a location under `AGRI_HOME` (current directory if unset).

use std::env;
use std::path::PathBuf;

/// Paths environment configuration
#[derive(Debug, Clone)]
pub struct PathsEnvConfig {
    pub profile_path: PathBuf,
    pub price_data_path: PathBuf,
    pub recommendation_data_path: PathBuf,
    pub price_model_path: PathBuf,
    pub crop_model_path: PathBuf,
}

impl PathsEnvConfig {
    pub fn from_env() -> Self {
        let home = env::var("AGRI_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let path = |var: &str, default: &str| {
            env::var(var)
                .map(PathBuf::from)
                .unwrap_or_else(|_| home.join(default))
        };

        Self {
            profile_path: path("AGRI_PROFILE_PATH", "profiles/karnataka.toml"),
            price_data_path: path("AGRI_PRICE_DATA", "data/price_data.csv"),
            recommendation_data_path: path("AGRI_RECOMMENDATION_DATA", "data/recommendation_data.csv"),
            price_model_path: path("AGRI_PRICE_MODEL", "models/price_model.json"),
            crop_model_path: path("AGRI_CROP_MODEL", "models/crop_model.json"),
        }
    }
}
