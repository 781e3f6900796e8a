//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, `.env` files, and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use stele_telemetry::LogFormat;

use crate::{ConfigError, SteleConfig};

/// Default prefix of environment variable overrides.
pub const DEFAULT_ENV_PREFIX: &str = "STELE";

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values or a preset
/// 2. Configuration file (TOML or JSON)
/// 3. `.env` file variables
/// 4. Environment variables
///
/// A file replaces the whole configuration; sections and fields it omits take
/// their default values.
///
/// # Example
///
/// ```no_run
/// use stele_config::ConfigLoader;
///
/// # fn main() -> Result<(), stele_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("stele.toml")?
///     .with_dotenv()?
///     .with_env_prefix("STELE")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: SteleConfig,
    env_prefix: Option<String>,
    dotenv_vars: Vec<(String, String)>,
    file_loaded: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SteleConfig::default(),
            env_prefix: None,
            dotenv_vars: Vec::new(),
            file_loaded: false,
        }
    }

    /// Start with default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = SteleConfig::default();
        self
    }

    /// Start with development preset configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use stele_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = SteleConfig::development();
        self
    }

    /// Start with production preset configuration.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = SteleConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// Supports TOML (.toml) and JSON (.json) formats, chosen by extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let file_config = Self::parse_file(&content, path)?;
        self.merge_config(file_config);
        self.file_loaded = true;

        Ok(self)
    }

    /// Load configuration from an optional file.
    ///
    /// If the file exists, loads it. If not, silently continues.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format ("toml" or "json").
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unsupported.
    ///
    /// # Example
    ///
    /// ```
    /// use stele_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [engine]
    ///     max_meta_depth = 8
    ///     builtin_namespaces = ["stele.meta", "java.lang.annotation"]
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.engine.max_meta_depth, 8);
    /// assert!(config.engine.is_builtin("java.lang.annotation.Retention"));
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let file_config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };

        self.merge_config(file_config);
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`, for
    /// example `STELE__ENGINE__MAX_META_DEPTH=8`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Read variables from `./.env`, if present.
    ///
    /// The variables apply as overrides under the environment prefix, below
    /// real environment variables. The process environment is not modified.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be parsed.
    pub fn with_dotenv(mut self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv_iter() {
            Ok(iter) => {
                for item in iter {
                    self.dotenv_vars.push(item?);
                }
                Ok(self)
            }
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Read variables from a specific `.env` file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn with_dotenv_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        for item in dotenvy::from_path_iter(path)? {
            self.dotenv_vars.push(item?);
        }
        Ok(self)
    }

    /// Apply explicit `PREFIX__SECTION__KEY` overrides.
    ///
    /// Uses the configured prefix, or [`DEFAULT_ENV_PREFIX`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value cannot be parsed or a key is unknown.
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let prefix = self.prefix();
        for (key, value) in vars {
            self.apply_if_prefixed(key.as_ref(), value.as_ref(), &prefix)?;
        }
        Ok(self)
    }

    /// Returns `true` if a configuration file was loaded.
    #[must_use]
    pub fn file_loaded(&self) -> bool {
        self.file_loaded
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies `.env` variables, then environment variable overrides (if a
    /// prefix was set), and validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Environment variable parsing fails
    /// - Configuration validation fails
    ///
    /// # Example
    ///
    /// ```
    /// use stele_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().load().unwrap();
    /// assert!(config.engine.cache_enabled);
    /// ```
    pub fn load(mut self) -> Result<SteleConfig, ConfigError> {
        let prefix = self.prefix();

        for (key, value) in std::mem::take(&mut self.dotenv_vars) {
            self.apply_if_prefixed(&key, &value, &prefix)?;
        }

        if self.env_prefix.is_some() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without applying overrides or validating.
    #[must_use]
    pub fn load_unvalidated(self) -> SteleConfig {
        self.config
    }

    fn prefix(&self) -> String {
        self.env_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_ENV_PREFIX.to_string())
    }

    // Parse configuration file based on extension
    fn parse_file(content: &str, path: &Path) -> Result<SteleConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn merge_config(&mut self, file_config: SteleConfig) {
        self.config = file_config;
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let mut vars: Vec<(String, String)> = env::vars().collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_if_prefixed(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_if_prefixed(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        match key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) {
            Some(path) => self.apply_env_var(key, path, value),
            None => Ok(()),
        }
    }

    // Apply a single `SECTION__KEY` override
    fn apply_env_var(&mut self, key: &str, path: &str, value: &str) -> Result<(), ConfigError> {
        let parts: Vec<&str> = path.split("__").collect();

        match parts.as_slice() {
            // Engine section
            ["ENGINE", "CACHE_ENABLED"] => {
                self.config.engine.cache_enabled = expect_bool(key, value)?;
            }
            ["ENGINE", "MAX_META_DEPTH"] => {
                self.config.engine.max_meta_depth = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["ENGINE", "CLASS_VALUES_AS_STRING"] => {
                self.config.engine.class_values_as_string = expect_bool(key, value)?;
            }
            ["ENGINE", "NESTED_ANNOTATIONS_AS_MAP"] => {
                self.config.engine.nested_annotations_as_map = expect_bool(key, value)?;
            }
            ["ENGINE", "BUILTIN_NAMESPACES"] => {
                self.config.engine.builtin_namespaces = value
                    .split(',')
                    .map(str::trim)
                    .filter(|ns| !ns.is_empty())
                    .map(str::to_string)
                    .collect();
            }

            // Logging section
            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = expect_bool(key, value)?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = value.parse::<LogFormat>().map_err(|_| {
                    ConfigError::env_parse_error(key, "expected 'json', 'pretty', or 'compact'")
                })?;
            }
            ["LOGGING", "SPAN_EVENTS"] => {
                self.config.logging.span_events = expect_bool(key, value)?;
            }
            ["LOGGING", "FILE_LINE_INFO"] => {
                self.config.logging.file_line_info = expect_bool(key, value)?;
            }
            ["LOGGING", "THREAD_IDS"] => {
                self.config.logging.thread_ids = expect_bool(key, value)?;
            }
            ["LOGGING", "INCLUDE_TARGET"] => {
                self.config.logging.include_target = expect_bool(key, value)?;
            }

            // Metrics section
            ["METRICS", "ENABLED"] => {
                self.config.metrics.enabled = expect_bool(key, value)?;
            }
            ["METRICS", "GLOBAL_LABELS", label] => {
                self.config
                    .metrics
                    .global_labels
                    .insert(label.to_lowercase(), value.to_string());
            }

            [section, field @ ..] => {
                return Err(ConfigError::unknown_field(field.join("__"), *section));
            }
            [] => return Err(ConfigError::env_parse_error(key, "invalid key format")),
        }

        Ok(())
    }
}

fn expect_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, SteleConfig::default());
    }

    #[test]
    fn test_loader_with_development() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{ "engine": { "cache_enabled": false }, "metrics": { "enabled": false } }"#;
        let config = ConfigLoader::new().with_string(json, "json").unwrap().load().unwrap();
        assert!(!config.engine.cache_enabled);
        assert!(!config.metrics.enabled);
        assert_eq!(config.engine.max_meta_depth, 32);
    }

    #[test]
    fn test_loader_with_string_unsupported_format() {
        assert!(ConfigLoader::new().with_string("", "yaml").is_err());
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/stele.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let loader = ConfigLoader::new()
            .with_optional_file("/nonexistent/stele.toml")
            .unwrap();
        assert!(!loader.file_loaded());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_vars_engine_section() {
        let config = ConfigLoader::new()
            .with_vars([
                ("STELE__ENGINE__MAX_META_DEPTH", "4"),
                ("STELE__ENGINE__CACHE_ENABLED", "off"),
                ("STELE__ENGINE__BUILTIN_NAMESPACES", "stele.meta, java.lang.annotation"),
                ("STELE__ENGINE__CLASS_VALUES_AS_STRING", "true"),
            ])
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.engine.max_meta_depth, 4);
        assert!(!config.engine.cache_enabled);
        assert!(config.engine.class_values_as_string);
        assert_eq!(
            config.engine.builtin_namespaces,
            vec!["stele.meta".to_string(), "java.lang.annotation".to_string()]
        );
    }

    #[test]
    fn test_vars_logging_and_metrics() {
        let config = ConfigLoader::new()
            .with_vars([
                ("STELE__LOGGING__LEVEL", "warn"),
                ("STELE__LOGGING__FORMAT", "compact"),
                ("STELE__METRICS__GLOBAL_LABELS__SERVICE", "catalog"),
            ])
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(
            config.metrics.global_labels.get("service").map(String::as_str),
            Some("catalog")
        );
    }

    #[test]
    fn test_vars_other_prefixes_ignored() {
        let config = ConfigLoader::new()
            .with_vars([("PATH", "/usr/bin"), ("STELEX__ENGINE__CACHE_ENABLED", "false")])
            .unwrap()
            .load_unvalidated();
        assert!(config.engine.cache_enabled);
    }

    #[test]
    fn test_vars_invalid_values() {
        let result = ConfigLoader::new().with_vars([("STELE__ENGINE__MAX_META_DEPTH", "deep")]);
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));

        let result = ConfigLoader::new().with_vars([("STELE__LOGGING__FORMAT", "xml")]);
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    fn test_vars_unknown_key() {
        let result = ConfigLoader::new().with_vars([("STELE__ENGINE__CACHE", "true")]);
        assert!(matches!(
            result,
            Err(ConfigError::UnknownField { ref field, ref section }) if field == "CACHE" && section == "ENGINE"
        ));
    }

    #[test]
    fn test_custom_prefix() {
        let config = ConfigLoader::new()
            .with_env_prefix("app")
            .with_vars([("APP__ENGINE__MAX_META_DEPTH", "2"), ("STELE__ENGINE__MAX_META_DEPTH", "9")])
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.engine.max_meta_depth, 2);
    }

    #[test]
    fn test_overrides_are_validated() {
        let result = ConfigLoader::new()
            .with_vars([("STELE__ENGINE__MAX_META_DEPTH", "0")])
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
