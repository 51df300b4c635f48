mod common;

use agripredict::application::advisory::{AdvisoryContext, AdvisoryHandle};
use agripredict::config::Config;
use agripredict::domain::errors::{AdvisoryError, ConfigError};
use agripredict::domain::recommendation::RecommendationQuery;
use common::{FixedClassifier, LaggedPricePredictor, context_with};
use serde_json::json;
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{LinearRegression, LinearRegressionParameters};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir() -> PathBuf {
    let unique_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "agripredict_context_test_{}_{}",
        std::process::id(),
        unique_id
    ));
    fs::create_dir_all(&dir).expect("Failed to create test temp dir");
    dir
}

fn config_for(dir: &Path) -> Config {
    Config {
        profile_path: dir.join("profile.toml"),
        price_data_path: dir.join("price_data.csv"),
        recommendation_data_path: dir.join("recommendation_data.csv"),
        price_model_path: dir.join("price_model.json"),
        crop_model_path: dir.join("crop_model.json"),
        default_horizon: None,
    }
}

fn profile() -> String {
    let months: Vec<String> = (1..=12).map(|m| format!("\"{}\" = 0.{}", m, 3 + m % 5)).collect();
    format!(
        r#"version = "test-1"

[vocabulary]
soil_type = ["Clay", "Loamy", "Sandy"]
region = ["North Karnataka", "South Karnataka"]
crop = ["Onion", "Tomato"]

[forecast]
horizon = 3
features = ["seasonal_index", "lagged_price"]

[forecast.seasonal_index.Tomato]
{months}

[forecast.seasonal_index.Onion]
{months}
"#,
        months = months.join("\n")
    )
}

fn price_artifact(feature_names: &[&str]) -> serde_json::Value {
    // price = lagged price
    let x = DenseMatrix::from_2d_vec(&vec![
        vec![0.5, 100.0],
        vec![0.7, 200.0],
        vec![0.9, 250.0],
        vec![0.6, 400.0],
        vec![0.8, 300.0],
    ])
    .unwrap();
    let y = vec![100.0, 200.0, 250.0, 400.0, 300.0];
    let model = LinearRegression::fit(&x, &y, LinearRegressionParameters::default()).unwrap();

    json!({
        "version": "lr-1",
        "feature_names": feature_names,
        "crop_vocabulary": ["Onion", "Tomato"],
        "model": { "kind": "linear", "params": serde_json::to_value(&model).unwrap() },
    })
}

fn crop_artifact() -> serde_json::Value {
    let x = DenseMatrix::from_2d_vec(&vec![
        vec![1.0, 1.0, 2.0],
        vec![1.0, 1.0, 3.0],
        vec![1.0, 1.0, 1.0],
        vec![0.0, 0.0, 2.0],
        vec![0.0, 0.0, 4.0],
        vec![2.0, 0.0, 1.0],
    ])
    .unwrap();
    let y: Vec<u32> = vec![1, 1, 1, 0, 0, 0];
    let model =
        RandomForestClassifier::fit(&x, &y, RandomForestClassifierParameters::default()).unwrap();

    json!({
        "version": "rf-1",
        "feature_names": ["soil_type", "region", "land_size"],
        "classes": ["Onion", "Tomato"],
        "soil_types": ["Clay", "Loamy", "Sandy"],
        "model": { "kind": "random_forest", "params": serde_json::to_value(&model).unwrap() },
    })
}

fn write_fixture(dir: &Path, price_model: serde_json::Value) {
    fs::write(dir.join("profile.toml"), profile()).unwrap();
    fs::write(
        dir.join("price_data.csv"),
        "Date,Crop,City,Modal Price\n\
         2025-07-01,Tomato,Bangalore,1000\n\
         2025-08-01,Tomato,Bangalore,1100\n\
         2025-09-01,Tomato,Bangalore,1200\n\
         01-09-2025,Onion,Mysore,800\n",
    )
    .unwrap();
    fs::write(
        dir.join("recommendation_data.csv"),
        "region,soil_type,crop_type,expected_return_per_acre,demand_score\n\
         South Karnataka,Loamy,Tomato,500,0.8\n\
         South Karnataka,Loamy,Onion,400,0.9\n\
         North Karnataka,Clay,Onion,350,0.7\n",
    )
    .unwrap();
    fs::write(dir.join("price_model.json"), price_model.to_string()).unwrap();
    fs::write(dir.join("crop_model.json"), crop_artifact().to_string()).unwrap();
}

#[test]
fn test_load_from_disk_and_answer_both_operations() {
    let dir = temp_dir();
    write_fixture(&dir, price_artifact(&["Seasonal_Index", "Lagged_Price"]));

    let context = AdvisoryContext::load(&config_for(&dir)).unwrap();

    assert_eq!(context.default_horizon(), 3);
    let forecast = context
        .forecast_prices("Tomato", "Bangalore", context.default_horizon())
        .unwrap();
    assert_eq!(forecast.points.len(), 3);
    for point in &forecast.points {
        assert!((point.price - 1200.0).abs() < 1e-3);
    }

    let ranked = context
        .recommend_crops(&RecommendationQuery::new("South Karnataka", "Loamy", 2.0))
        .unwrap();
    let crops: Vec<&str> = ranked.iter().map(|c| c.crop_type.as_str()).collect();
    assert_eq!(crops, vec!["Tomato", "Onion"]);
    assert!((ranked[0].dynamic_expected_return - 1000.0).abs() < 1e-9);

    let info = context.model_info();
    assert_eq!(info.profile_version, "test-1");
    assert_eq!(info.price_model_version, "lr-1");
    assert_eq!(info.crop_model_version, "rf-1");
    assert_eq!(info.price_rows, 4);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_horizon_override_from_config() {
    let dir = temp_dir();
    write_fixture(&dir, price_artifact(&["Seasonal_Index", "Lagged_Price"]));
    let mut config = config_for(&dir);
    config.default_horizon = Some(6);

    let context = AdvisoryContext::load(&config).unwrap();

    assert_eq!(context.default_horizon(), 6);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_artifact_column_mismatch_is_fatal() {
    let dir = temp_dir();
    write_fixture(&dir, price_artifact(&["Lagged_Price", "Seasonal_Index"]));

    let err = AdvisoryContext::load(&config_for(&dir)).err().unwrap();

    assert!(matches!(
        err,
        AdvisoryError::Config(ConfigError::SchemaMismatch { .. })
    ));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_files_reported_by_path() {
    let dir = temp_dir();

    let err = AdvisoryContext::load(&config_for(&dir)).err().unwrap();

    match err {
        AdvisoryError::Config(ConfigError::MissingArtifact { path, .. }) => {
            assert!(path.ends_with("profile.toml"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_failed_reload_keeps_previous_context() {
    let handle = AdvisoryHandle::new(context_with(
        Arc::new(LaggedPricePredictor::new(1.0)),
        Arc::new(FixedClassifier::single("Tomato")),
    ));
    let before = handle.current();
    let dir = temp_dir();

    assert!(handle.reload(&config_for(&dir)).is_err());

    assert!(Arc::ptr_eq(&before, &handle.current()));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_reload_swaps_context() {
    let handle = AdvisoryHandle::new(context_with(
        Arc::new(LaggedPricePredictor::new(1.0)),
        Arc::new(FixedClassifier::single("Tomato")),
    ));
    let before = handle.current();
    let dir = temp_dir();
    write_fixture(&dir, price_artifact(&["Seasonal_Index", "Lagged_Price"]));

    handle.reload(&config_for(&dir)).unwrap();

    let after = handle.current();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.model_info().price_model, "SmartCore Linear Regression");
    // Snapshots taken earlier keep answering from the old state
    assert_eq!(before.model_info().price_model, "lagged-price mock");
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_catalog_lists_loaded_values() {
    let context = context_with(
        Arc::new(LaggedPricePredictor::new(1.0)),
        Arc::new(FixedClassifier::single("Tomato")),
    );

    let catalog = context.catalog();

    assert_eq!(catalog.crops, vec!["Tomato", "Onion", "Cotton", "Chili"]);
    assert_eq!(catalog.cities, vec!["Bangalore", "Mysore", "Davangere", "Hubli"]);
    assert_eq!(catalog.regions, vec!["South Karnataka", "North Karnataka"]);
    assert_eq!(catalog.soil_types, vec!["Loamy", "Sandy", "Clay"]);
}
