//! AgriPredict command line
//!
//! Loads the advisory profile, historical datasets and model artifacts once,
//! then answers a single forecast, recommendation or catalog request as JSON.
//!
//! # Usage
//! ```sh
//! agripredict forecast --crop Tomato --city Bangalore --horizon 5
//! agripredict recommend --region "North Karnataka" --soil Loamy --land-area 2.5
//! ```
//!
//! # Environment Variables
//! - `AGRI_HOME` - Base directory for the default data, model and profile paths
//! - `AGRI_DEFAULT_HORIZON` - Forecast horizon used when `--horizon` is omitted
//! - `RUST_LOG` - Log filter (default: info)

use agripredict::application::advisory::AdvisoryContext;
use agripredict::config::Config;
use agripredict::domain::recommendation::RecommendationQuery;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Crop price forecasts and crop recommendations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast future modal prices for a crop in a city
    Forecast {
        /// Crop name (case-insensitive)
        #[arg(short, long)]
        crop: String,

        /// Market city (case-insensitive)
        #[arg(long)]
        city: String,

        /// Number of future periods; defaults to the profile horizon
        #[arg(long)]
        horizon: Option<usize>,
    },
    /// Recommend up to three crops for a region and soil type
    Recommend {
        /// Region, e.g. "North Karnataka"
        #[arg(short, long)]
        region: String,

        /// Soil type, e.g. Loamy
        #[arg(short, long = "soil")]
        soil_type: String,

        /// Land area in acres
        #[arg(short, long)]
        land_area: f64,

        /// Irrigation method, when the crop model uses it
        #[arg(long)]
        irrigation: Option<String>,

        /// Growing season, when the crop model uses it
        #[arg(long)]
        season: Option<String>,
    },
    /// List the crops, cities, regions and soil types in the loaded data
    Catalog,
    /// Load everything and report the model versions in use
    Check,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays valid JSON
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    info!(
        "AgriPredict {}: profile {:?}, price data {:?}",
        env!("CARGO_PKG_VERSION"),
        config.profile_path,
        config.price_data_path
    );

    let context = AdvisoryContext::load(&config).context("Failed to load advisory context")?;

    match cli.command {
        Commands::Forecast {
            crop,
            city,
            horizon,
        } => {
            let horizon = horizon.unwrap_or_else(|| context.default_horizon());
            let forecast = context.forecast_prices(&crop, &city, horizon)?;
            print_json(&forecast)
        }
        Commands::Recommend {
            region,
            soil_type,
            land_area,
            irrigation,
            season,
        } => {
            let mut query = RecommendationQuery::new(region, soil_type, land_area);
            if let Some(irrigation) = irrigation {
                query = query.with_irrigation(irrigation);
            }
            if let Some(season) = season {
                query = query.with_season(season);
            }
            let recommendations = context.recommend_crops(&query)?;
            print_json(&recommendations)
        }
        Commands::Catalog => print_json(&context.catalog()),
        Commands::Check => print_json(&context.model_info()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
