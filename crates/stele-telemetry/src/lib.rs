//! Observability for Stele.
//!
//! The engine crates only emit through the `tracing` and `metrics` facades.
//! This crate wires those facades to concrete outputs:
//!
//! - **Logging**: `tracing-subscriber` with JSON or human-readable output
//! - **Metrics**: a Prometheus recorder via `metrics-exporter-prometheus`
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `stele_cache_lookups_total` | Counter | `cache`, `outcome` | Engine cache lookups |
//! | `stele_introspection_failures_total` | Counter | `element_kind` | Recovered introspection failures |
//!
//! # Example
//!
//! ```rust,no_run
//! use stele_telemetry::{init_telemetry, render_metrics, TelemetryConfig};
//!
//! let config = TelemetryConfig::builder()
//!     .service_name("catalog")
//!     .log_level("info,stele_engine=debug")
//!     .build();
//! init_telemetry(&config)?;
//!
//! // ... run the engine ...
//!
//! if let Some(text) = render_metrics() {
//!     println!("{text}");
//! }
//! # Ok::<(), stele_telemetry::TelemetryError>(())
//! ```
//!
//! Output looks like:
//!
//! ```text
//! # HELP stele_cache_lookups_total Engine cache lookups by cache and outcome
//! # TYPE stele_cache_lookups_total counter
//! stele_cache_lookups_total{cache="merged",outcome="hit",service="catalog"} 1234
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{describe_metrics, init_metrics, render_metrics, MetricsConfig, MetricsRegistry};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// Both install process-wide state, so this succeeds at most once per process
/// for each enabled subsystem.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
