//! Unit tests for the SettingsEngine.

use returnnav::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use returnnav::types::errors::SettingsError;
use returnnav::types::settings::{NavigationSettings, DEFAULT_QUERY_PARAM, DEFAULT_STORAGE_KEY};
use rstest::rstest;
use serde_json::json;

fn config_path(dir: &tempfile::TempDir) -> String {
    dir.path().join("config").join("navigation.json").to_string_lossy().to_string()
}

#[test]
fn test_defaults() {
    let settings = NavigationSettings::default();
    assert_eq!(settings.storage_key, DEFAULT_STORAGE_KEY);
    assert_eq!(settings.storage_key, "nav:returnTokens:v1");
    assert_eq!(settings.query_param, DEFAULT_QUERY_PARAM);
    assert_eq!(settings.query_param, "rtk");
    assert_eq!(settings.token_ttl_ms, 86_400_000);
    assert_eq!(settings.default_fallback, "/");
    assert!(settings.purge_on_startup);
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = config_path(&dir);
    let mut engine = SettingsEngine::new(path.clone());
    engine.load().unwrap();
    engine.save().unwrap();

    assert!(std::path::Path::new(&path).exists());
    assert_eq!(engine.get_config_path(), path);
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("navigation.json");
    std::fs::write(&path, r#"{ "token_ttl_ms": 60000 }"#).unwrap();

    let mut engine = SettingsEngine::new(path.to_string_lossy().to_string());
    let settings = engine.load().unwrap();

    assert_eq!(settings.token_ttl_ms, 60_000);
    assert_eq!(settings.query_param, "rtk");
}

#[test]
fn test_malformed_file_is_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("navigation.json");
    std::fs::write(&path, "{ not json").unwrap();

    let mut engine = SettingsEngine::new(path.to_string_lossy().to_string());
    assert!(matches!(engine.load(), Err(SettingsError::SerializationError(_))));
}

#[test]
fn test_invalid_file_contents_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("navigation.json");
    std::fs::write(&path, r#"{ "query_param": "" }"#).unwrap();

    let mut engine = SettingsEngine::new(path.to_string_lossy().to_string());
    assert!(matches!(engine.load(), Err(SettingsError::InvalidValue(_))));
}

#[rstest]
#[case("storage_key", json!(""))]
#[case("query_param", json!("  "))]
#[case("token_ttl_ms", json!(-5))]
#[case("token_ttl_ms", json!("soon"))]
#[case("default_fallback", json!("home"))]
#[case("purge_on_startup", json!("yes"))]
fn test_set_value_rejects_invalid_values(#[case] key: &str, #[case] value: serde_json::Value) {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = SettingsEngine::new(config_path(&dir));
    engine.load().unwrap();

    let result = engine.set_value(key, value);

    assert!(matches!(result, Err(SettingsError::InvalidValue(_))), "{key}: {result:?}");
    assert_eq!(engine.get_settings(), &NavigationSettings::default());
}

#[rstest]
#[case("")]
#[case("unknown_key")]
fn test_set_value_rejects_unknown_keys(#[case] key: &str) {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = SettingsEngine::new(config_path(&dir));
    assert!(matches!(
        engine.set_value(key, json!(1)),
        Err(SettingsError::InvalidKey(_))
    ));
}

#[test]
fn test_reset_restores_defaults_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = config_path(&dir);
    let mut engine = SettingsEngine::new(path.clone());
    engine.set_value("default_fallback", json!("/home")).unwrap();
    engine.set_value("purge_on_startup", json!(false)).unwrap();
    engine.reset().unwrap();

    let mut reloaded = SettingsEngine::new(path);
    assert_eq!(reloaded.load().unwrap(), NavigationSettings::default());
}
