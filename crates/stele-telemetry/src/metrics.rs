//! Prometheus metrics for Stele.
//!
//! The engine records through the `metrics` facade; this module installs a
//! Prometheus recorder and renders what was recorded.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `stele_cache_lookups_total` | Counter | `cache`, `outcome` | Engine cache lookups |
//! | `stele_introspection_failures_total` | Counter | `element_kind` | Recovered introspection failures |

use std::collections::BTreeMap;
use std::sync::OnceLock;

use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use serde::{Deserialize, Serialize};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metric names recorded by the engine.
pub mod names {
    /// Cache lookups, labelled by `cache` and `outcome` (`hit` or `miss`).
    pub const CACHE_LOOKUPS: &str = "stele_cache_lookups_total";

    /// Annotation introspection failures recovered during a search.
    pub const INTROSPECTION_FAILURES: &str = "stele_introspection_failures_total";
}

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Whether the Prometheus recorder is installed.
    pub enabled: bool,

    /// Labels added to every metric.
    pub global_labels: BTreeMap<String, String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            global_labels: BTreeMap::new(),
        }
    }
}

impl MetricsConfig {
    /// Adds a label to every metric.
    #[must_use]
    pub fn with_global_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.global_labels.insert(key.into(), value.into());
        self
    }

    /// Builds an uninstalled recorder for this configuration.
    #[must_use]
    pub fn build_recorder(&self) -> PrometheusRecorder {
        self.global_labels
            .iter()
            .fold(PrometheusBuilder::new(), |builder, (key, value)| {
                builder.add_global_label(key, value)
            })
            .build_recorder()
    }
}

/// Renders the metrics of one Prometheus recorder.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    handle: PrometheusHandle,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with the given handle.
    #[must_use]
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Returns the registry of the global recorder, if installed.
    #[must_use]
    pub fn global() -> Option<Self> {
        METRICS_HANDLE.get().cloned().map(Self::new)
    }

    /// Renders all metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Installs the Prometheus recorder as the global `metrics` recorder.
///
/// Does nothing when `config.enabled` is false.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if a global recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let recorder = config.build_recorder();
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    describe_metrics();

    Ok(())
}

/// Renders the global recorder in Prometheus format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Registers descriptions for the engine metrics with the current recorder.
pub fn describe_metrics() {
    describe_counter!(
        names::CACHE_LOOKUPS,
        "Engine cache lookups by cache and outcome"
    );
    describe_counter!(
        names::INTROSPECTION_FAILURES,
        "Annotation introspection failures recovered during a search"
    );
}
