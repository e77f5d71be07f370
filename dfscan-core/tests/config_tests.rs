//! DfscanConfig loading and environment override tests
//!
//! Environment-mutating tests are #[serial].

use dfscan_common::config::ConfigSource;
use dfscan_core::config::{CLASSIFIER_ENDPOINT_ENV_VAR, LOG_LEVEL_ENV_VAR};
use dfscan_core::DfscanConfig;
use serial_test::serial;
use std::env;
use tempfile::TempDir;

fn clear_env() {
    env::remove_var(CLASSIFIER_ENDPOINT_ENV_VAR);
    env::remove_var(LOG_LEVEL_ENV_VAR);
}

#[test]
#[serial]
fn test_file_values_loaded() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dfscan.toml");
    std::fs::write(
        &path,
        r#"
[analysis]
analyzer_timeout_ms = 5000

[heuristics.color]
balance_threshold = 0.1

[fusion]
safeguard_floor = 0.65
"#,
    )
    .unwrap();

    let config = DfscanConfig::load(Some(&path)).unwrap();
    assert_eq!(config.analysis.analyzer_timeout_ms, 5000);
    assert_eq!(config.heuristics.color.balance_threshold, 0.1);
    assert_eq!(config.fusion.safeguard_floor, 0.65);
    assert_eq!(config.heuristics.blur.grid, 3);
}

#[test]
#[serial]
fn test_env_overrides_apply() {
    clear_env();
    env::set_var(CLASSIFIER_ENDPOINT_ENV_VAR, " http://localhost:8000/predict ");
    env::set_var(LOG_LEVEL_ENV_VAR, "debug");

    let config = DfscanConfig::load_from(&ConfigSource::CompiledDefaults).unwrap();
    clear_env();

    assert_eq!(
        config.classifier.endpoint.as_deref(),
        Some("http://localhost:8000/predict")
    );
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_unbalanced_weights_rejected() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dfscan.toml");
    std::fs::write(&path, "[fusion]\nclassifier_weight = 0.9\n").unwrap();

    let err = DfscanConfig::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}

#[test]
#[serial]
fn test_missing_explicit_file_is_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    assert!(DfscanConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
}
