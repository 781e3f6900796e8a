//! Main configuration types.
//!
//! This module provides the top-level [`SteleConfig`] struct and its builder.

use serde::{Deserialize, Serialize};
use stele_engine::EngineSettings;
use stele_telemetry::{LogConfig, LogFormat, MetricsConfig, TelemetryConfig};

use crate::ConfigError;

/// Complete Stele configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use stele_config::SteleConfig;
///
/// let config = SteleConfig::default();
/// assert_eq!(config.engine.max_meta_depth, 32);
/// assert!(config.engine.cache_enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct SteleConfig {
    /// Engine settings.
    #[serde(default)]
    pub engine: EngineSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LogConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl SteleConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use stele_config::SteleConfig;
    /// use stele_engine::EngineSettings;
    ///
    /// let config = SteleConfig::builder()
    ///     .engine(EngineSettings {
    ///         cache_enabled: false,
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert!(!config.engine.cache_enabled);
    /// ```
    #[must_use]
    pub fn builder() -> SteleConfigBuilder {
        SteleConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `engine.max_meta_depth` is zero
    /// - a built-in namespace is empty or ends with `.`
    /// - `logging.level` is not a valid filter
    /// - a metrics label name is not a valid Prometheus label
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_meta_depth == 0 {
            return Err(ConfigError::invalid_value(
                "engine.max_meta_depth",
                "must be at least 1",
            ));
        }

        if let Some(namespace) = self
            .engine
            .builtin_namespaces
            .iter()
            .find(|ns| ns.is_empty() || ns.ends_with('.'))
        {
            return Err(ConfigError::invalid_value(
                "engine.builtin_namespaces",
                format!("invalid namespace: {namespace:?}"),
            ));
        }

        if self.logging.enabled {
            self.logging
                .validate()
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        if let Some(label) = self
            .metrics
            .global_labels
            .keys()
            .find(|label| !is_label_name(label))
        {
            return Err(ConfigError::invalid_value(
                "metrics.global_labels",
                format!("invalid label name: {label:?}"),
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty log output at debug level
    /// - Metrics recorder disabled
    ///
    /// # Example
    ///
    /// ```
    /// use stele_config::SteleConfig;
    ///
    /// let config = SteleConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        Self {
            engine: EngineSettings::default(),
            logging: LogConfig::development(),
            metrics: MetricsConfig {
                enabled: false,
                ..MetricsConfig::default()
            },
        }
    }

    /// Create a production configuration preset.
    ///
    /// - JSON log output at info level
    /// - Metrics recorder enabled
    ///
    /// # Example
    ///
    /// ```
    /// use stele_config::SteleConfig;
    /// use stele_telemetry::LogFormat;
    ///
    /// let config = SteleConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        Self {
            engine: EngineSettings::default(),
            logging: LogConfig {
                format: LogFormat::Json,
                ..LogConfig::production()
            },
            metrics: MetricsConfig::default(),
        }
    }

    /// Returns the telemetry part of the configuration.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            logging: self.logging.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

/// Returns `true` for names matching `[a-zA-Z_][a-zA-Z0-9_]*`.
fn is_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Builder for [`SteleConfig`].
#[derive(Debug, Default)]
pub struct SteleConfigBuilder {
    engine: Option<EngineSettings>,
    logging: Option<LogConfig>,
    metrics: Option<MetricsConfig>,
}

impl SteleConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine settings.
    #[must_use]
    pub fn engine(mut self, engine: EngineSettings) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LogConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the metrics configuration.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> SteleConfig {
        SteleConfig {
            engine: self.engine.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            metrics: self.metrics.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<SteleConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SteleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.builtin_namespaces, vec!["stele.meta".to_string()]);
    }

    #[test]
    fn test_validate_zero_depth() {
        let result = SteleConfig::builder()
            .engine(EngineSettings {
                max_meta_depth: 0,
                ..EngineSettings::default()
            })
            .build_validated();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "engine.max_meta_depth"
        ));
    }

    #[test]
    fn test_validate_namespace() {
        let config = SteleConfig::builder()
            .engine(EngineSettings {
                builtin_namespaces: vec!["java.lang.".to_string()],
                ..EngineSettings::default()
            })
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_log_level() {
        let config = SteleConfig::builder()
            .logging(LogConfig {
                level: "stele_engine=loud".to_string(),
                ..LogConfig::default()
            })
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_label_name() {
        let config = SteleConfig::builder()
            .metrics(MetricsConfig::default().with_global_label("9lives", "x"))
            .build();
        assert!(config.validate().is_err());

        let config = SteleConfig::builder()
            .metrics(MetricsConfig::default().with_global_label("service_name", "x"))
            .build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let dev = SteleConfig::development();
        assert_eq!(dev.logging.format, LogFormat::Pretty);
        assert!(!dev.metrics.enabled);

        let prod = SteleConfig::production();
        assert_eq!(prod.logging.level, "info");
        assert!(prod.metrics.enabled);
        assert_eq!(prod.telemetry().metrics, prod.metrics);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SteleConfig::development();
        let text = toml::to_string(&config).unwrap();
        let parsed: SteleConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<SteleConfig, _> = toml::from_str("[server]\nport = 80\n");
        assert!(result.is_err());

        let result: Result<SteleConfig, _> = toml::from_str("[engine]\ncache = true\n");
        assert!(result.is_err());
    }
}
