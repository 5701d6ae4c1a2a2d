//! Centralized metrics infrastructure for the repository pipeline
//!
//! Each stage defines its own metrics in a dedicated submodule. Runs are short
//! batch jobs, so instead of serving an HTTP endpoint the recorder snapshot is
//! rendered to a Prometheus textfile at the end of a run.

pub mod cleaner;
pub mod features;
pub mod merger;
pub mod registry;

pub use cleaner::CleanerMetrics;
pub use features::FeatureMetrics;
pub use merger::MergerMetrics;

use std::path::Path;
use std::sync::{Once, OnceLock};
use tracing::{info, warn};

use crate::error::Result;
use crate::storage::write_atomically;

static INIT: Once = Once::new();
static HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder and register every phase's metrics.
///
/// Idempotent. Without it, recording calls are no-ops.
pub fn init_metrics() {
    INIT.call_once(|| {
        match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                if HANDLE.set(handle).is_err() {
                    warn!("METRICS: recorder handle was already stored");
                }
                registry::register_all_metrics();
                info!("Prometheus recorder installed");
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
            }
        }
    });
}

/// Render the current snapshot in Prometheus text format, if a recorder is installed
pub fn render() -> Option<String> {
    HANDLE.get().map(|handle| handle.render())
}

/// Write the snapshot for node-exporter's textfile collector.
///
/// Skipped with a warning when [`init_metrics`] was never called.
pub fn write_textfile(path: &Path) -> Result<()> {
    match render() {
        Some(text) => {
            write_atomically(path, text.as_bytes())?;
            info!("Metrics written to {}", path.display());
        }
        None => warn!(
            "Metrics recorder not installed; not writing {}",
            path.display()
        ),
    }
    Ok(())
}

/// Trait for phase-specific metrics collections
pub trait PhaseMetrics {
    /// Register all metrics for this phase so they appear in the first snapshot
    fn register_metrics();

    /// Get the phase name used in metric names
    fn phase_name() -> &'static str;

    /// Get documentation for all metrics in this phase
    fn metrics_documentation() -> Vec<MetricDoc>;
}

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
    pub labels: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
    Gauge,
}

/// Builds metric names following the convention
/// `repo_insights_{phase}_{metric_name}[_total]`
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("repo_insights_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("repo_insights_", $phase, "_", $name)
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("repo_insights_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;
