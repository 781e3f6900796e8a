//! Loading configuration from files and `.env` files.

use std::fs;

use stele_config::{ConfigError, ConfigLoader, SteleConfig};
use stele_telemetry::LogFormat;
use tempfile::TempDir;

const TOML: &str = r#"
[engine]
builtin_namespaces = ["stele.meta", "java.lang.annotation"]
cache_enabled = false
max_meta_depth = 6

[logging]
level = "info,stele_engine=trace"
format = "compact"

[metrics.global_labels]
service = "catalog"
"#;

#[test]
fn test_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stele.toml");
    fs::write(&path, TOML).unwrap();

    let loader = ConfigLoader::new().with_file(&path).unwrap();
    assert!(loader.file_loaded());
    let config = loader.load().unwrap();

    assert!(!config.engine.cache_enabled);
    assert_eq!(config.engine.max_meta_depth, 6);
    assert!(config.engine.is_builtin("java.lang.annotation.Retention"));
    assert!(config.engine.nested_annotations_as_map);
    assert_eq!(config.logging.format, LogFormat::Compact);
    assert_eq!(
        config.metrics.global_labels.get("service").map(String::as_str),
        Some("catalog")
    );
}

#[test]
fn test_json_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stele.json");
    fs::write(&path, r#"{ "engine": { "class_values_as_string": true } }"#).unwrap();

    let config = ConfigLoader::new().with_file(&path).unwrap().load().unwrap();
    assert!(config.engine.class_values_as_string);
    assert_eq!(config.logging, SteleConfig::default().logging);
}

#[test]
fn test_unknown_field_in_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stele.toml");
    fs::write(&path, "[engine]\nmax_depth = 3\n").unwrap();

    let result = ConfigLoader::new().with_file(&path);
    assert!(matches!(result, Err(ConfigError::TomlError(_))));
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stele.yaml");
    fs::write(&path, "engine: {}\n").unwrap();

    let result = ConfigLoader::new().with_file(&path);
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_file_replaces_preset() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stele.toml");
    fs::write(&path, "[engine]\nmax_meta_depth = 3\n").unwrap();

    let config = ConfigLoader::new()
        .with_development()
        .with_file(&path)
        .unwrap()
        .load()
        .unwrap();
    assert_eq!(config.engine.max_meta_depth, 3);
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_dotenv_file_layers_over_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("stele.toml");
    fs::write(&config_path, TOML).unwrap();
    let env_path = dir.path().join(".env");
    fs::write(
        &env_path,
        "# local overrides\nSTELE_DOTENV_TEST__ENGINE__MAX_META_DEPTH=12\nSTELE_DOTENV_TEST__LOGGING__FORMAT=pretty\nUNRELATED=1\n",
    )
    .unwrap();

    let config = ConfigLoader::new()
        .with_env_prefix("STELE_DOTENV_TEST")
        .with_file(&config_path)
        .unwrap()
        .with_dotenv_file(&env_path)
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.engine.max_meta_depth, 12);
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert!(!config.engine.cache_enabled);
}

#[test]
fn test_missing_dotenv_file() {
    let result = ConfigLoader::new().with_dotenv_file("/nonexistent/.env");
    assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
}
