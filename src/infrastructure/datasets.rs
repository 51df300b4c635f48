//! CSV loading for the historical reference datasets.
//!
//! Headers are checked up front so a missing column is reported by name
//! instead of surfacing as a row-level deserialization error.

use crate::domain::errors::ConfigError;
use crate::domain::history::{HistoricalStore, PriceRecord, SuitabilityRecord};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

pub const PRICE_DATASET: &str = "price history";
pub const SUITABILITY_DATASET: &str = "recommendation history";

const PRICE_COLUMNS: &[&str] = &["Date", "Crop", "City", "Modal Price"];
const SUITABILITY_COLUMNS: &[&str] = &[
    "region",
    "soil_type",
    "crop_type",
    "expected_return_per_acre",
    "demand_score",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Crop")]
    crop: String,
    #[serde(rename = "City")]
    city: String,
    #[serde(rename = "Modal Price")]
    modal_price: f64,
}

#[derive(Debug, Deserialize)]
struct SuitabilityRow {
    region: String,
    soil_type: String,
    crop_type: String,
    expected_return_per_acre: f64,
    demand_score: f64,
    #[serde(default)]
    irrigation: Option<String>,
    #[serde(default)]
    season: Option<String>,
    #[serde(default)]
    land_size: Option<f64>,
}

pub fn load_price_history(path: &Path) -> Result<HistoricalStore<PriceRecord>, ConfigError> {
    let store = read_price_history(open(path, PRICE_DATASET)?)?;
    info!("Loaded {} price rows from {:?}", store.len(), path);
    Ok(store)
}

pub fn load_suitability_history(
    path: &Path,
) -> Result<HistoricalStore<SuitabilityRecord>, ConfigError> {
    let store = read_suitability_history(open(path, SUITABILITY_DATASET)?)?;
    info!("Loaded {} recommendation rows from {:?}", store.len(), path);
    Ok(store)
}

pub fn read_price_history<R: Read>(source: R) -> Result<HistoricalStore<PriceRecord>, ConfigError> {
    let rows: Vec<PriceRow> = read_rows(source, PRICE_DATASET, PRICE_COLUMNS)?;
    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        let date = parse_date(&row.date).ok_or_else(|| ConfigError::MalformedRow {
            dataset: PRICE_DATASET.to_string(),
            line: i as u64 + 2,
            reason: format!("unrecognised date '{}'", row.date),
        })?;
        finite(PRICE_DATASET, i, "Modal Price", row.modal_price)?;
        records.push(PriceRecord {
            date,
            crop: row.crop.trim().to_string(),
            city: row.city.trim().to_string(),
            modal_price: row.modal_price,
        });
    }
    Ok(HistoricalStore::new(PRICE_DATASET, records))
}

pub fn read_suitability_history<R: Read>(
    source: R,
) -> Result<HistoricalStore<SuitabilityRecord>, ConfigError> {
    let rows: Vec<SuitabilityRow> = read_rows(source, SUITABILITY_DATASET, SUITABILITY_COLUMNS)?;
    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        finite(SUITABILITY_DATASET, i, "expected_return_per_acre", row.expected_return_per_acre)?;
        finite(SUITABILITY_DATASET, i, "demand_score", row.demand_score)?;
        if let Some(land_size) = row.land_size {
            finite(SUITABILITY_DATASET, i, "land_size", land_size)?;
        }
        records.push(SuitabilityRecord {
            region: row.region.trim().to_string(),
            soil_type: row.soil_type.trim().to_string(),
            crop_type: row.crop_type.trim().to_string(),
            irrigation: non_blank(row.irrigation),
            season: non_blank(row.season),
            land_size: row.land_size,
            expected_return_per_acre: row.expected_return_per_acre,
            demand_score: row.demand_score,
        });
    }
    Ok(HistoricalStore::new(SUITABILITY_DATASET, records))
}

/// NaN and infinities parse as valid floats; `index` is the zero-based data row.
fn finite(dataset: &str, index: usize, column: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(malformed(
            dataset,
            index as u64 + 2,
            format!("{} must be a finite number, got {}", column, value),
        ))
    }
}

fn open(path: &Path, dataset: &str) -> Result<File, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingArtifact {
            resource: dataset.to_string(),
            path: path.display().to_string(),
        });
    }
    File::open(path).map_err(|e| ConfigError::CorruptArtifact {
        resource: dataset.to_string(),
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn read_rows<R, T>(source: R, dataset: &str, required: &[&str]) -> Result<Vec<T>, ConfigError>
where
    R: Read,
    T: for<'de> Deserialize<'de>,
{
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| malformed(dataset, 1, e.to_string()))?
        .clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(ConfigError::MissingColumn {
                dataset: dataset.to_string(),
                column: column.to_string(),
            });
        }
    }

    reader
        .deserialize::<T>()
        .enumerate()
        .map(|(i, row)| row.map_err(|e| malformed(dataset, i as u64 + 2, e.to_string())))
        .collect()
}

fn malformed(dataset: &str, line: u64, reason: String) -> ConfigError {
    ConfigError::MalformedRow {
        dataset: dataset.to_string(),
        line,
        reason,
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // Timestamps such as "2024-01-15 00:00:00" keep only the date part
    let raw = raw.split_whitespace().next().unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
