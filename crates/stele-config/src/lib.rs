//! Typed configuration for Stele.
//!
//! This crate provides a strongly-typed configuration for the annotation
//! engine and its telemetry with support for:
//! - TOML and JSON configuration files
//! - `.env` files and environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → `.env` → env)
//!
//! # Overview
//!
//! [`SteleConfig`] holds three sections:
//!
//! - `engine` - [`EngineSettings`](stele_engine::EngineSettings) (caching, depth limit, merge defaults)
//! - `logging` - [`LogConfig`](stele_telemetry::LogConfig)
//! - `metrics` - [`MetricsConfig`](stele_telemetry::MetricsConfig)
//!
//! # Example
//!
//! ```no_run
//! use stele_config::ConfigLoader;
//!
//! # fn main() -> Result<(), stele_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_production()
//!     .with_optional_file("stele.toml")?
//!     .with_dotenv()?
//!     .with_env_prefix("STELE")
//!     .load()?;
//!
//! stele_telemetry::init_telemetry(&config.telemetry()).ok();
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [engine]
//! builtin_namespaces = ["stele.meta"]
//! cache_enabled = true
//! class_values_as_string = false
//! nested_annotations_as_map = true
//! max_meta_depth = 32
//!
//! [logging]
//! enabled = true
//! level = "info,stele_engine=debug"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//!
//! [metrics.global_labels]
//! service = "catalog"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden via environment variables using the format
//! `PREFIX__SECTION__KEY`. For example:
//!
//! - `STELE__ENGINE__MAX_META_DEPTH=8`
//! - `STELE__ENGINE__BUILTIN_NAMESPACES=stele.meta,java.lang.annotation`
//! - `STELE__LOGGING__FORMAT=pretty`
//! - `STELE__METRICS__GLOBAL_LABELS__SERVICE=catalog`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;

pub use config::{SteleConfig, SteleConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
