//! Metrics registry for coordinating phase-specific metrics
//!
//! Registers every phase's metrics at startup and detects naming conflicts early.

use crate::metrics::{MetricDoc, PhaseMetrics};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Register all metrics from all phases
pub fn register_all_metrics() {
    let mut all_metrics = HashMap::new();

    register_phase_metrics::<super::merger::MergerMetrics>(&mut all_metrics);
    register_phase_metrics::<super::cleaner::CleanerMetrics>(&mut all_metrics);
    register_phase_metrics::<super::features::FeatureMetrics>(&mut all_metrics);

    info!(
        "Registered {} total metrics across all phases",
        all_metrics.len()
    );
    log_metrics_summary(&all_metrics);
}

/// Register metrics for a specific phase and detect conflicts
fn register_phase_metrics<T: PhaseMetrics>(all_metrics: &mut HashMap<&'static str, MetricDoc>) {
    T::register_metrics();
    let phase_name = T::phase_name();

    for doc in T::metrics_documentation() {
        if extract_phase_from_metric_name(doc.name) != phase_name {
            warn!(
                "Metric '{}' does not carry its phase name '{}'",
                doc.name, phase_name
            );
        }
        if all_metrics.contains_key(doc.name) {
            warn!(
                "Metric name conflict detected: '{}' is defined twice (phase '{}')",
                doc.name, phase_name
            );
        } else {
            all_metrics.insert(doc.name, doc);
        }
    }
}

fn log_metrics_summary(all_metrics: &HashMap<&'static str, MetricDoc>) {
    let mut names: Vec<&&str> = all_metrics.keys().collect();
    names.sort();
    for name in names {
        let doc = &all_metrics[*name];
        debug!(
            "  - {} ({:?}, labels {:?}): {}",
            doc.name, doc.metric_type, doc.labels, doc.help
        );
    }
}

/// Extract phase name from metric name (e.g. "repo_insights_cleaner_rows_in_total" -> "cleaner")
fn extract_phase_from_metric_name(metric_name: &str) -> &str {
    if let Some(stripped) = metric_name.strip_prefix("repo_insights_") {
        if let Some(next_underscore) = stripped.find('_') {
            return &stripped[..next_underscore];
        }
    }
    "unknown"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{CleanerMetrics, FeatureMetrics, MergerMetrics};

    #[test]
    fn test_extract_phase_from_metric_name() {
        assert_eq!(
            extract_phase_from_metric_name("repo_insights_cleaner_rows_in_total"),
            "cleaner"
        );
        assert_eq!(
            extract_phase_from_metric_name("repo_insights_merger_duration_seconds"),
            "merger"
        );
        assert_eq!(extract_phase_from_metric_name("invalid_metric_name"), "unknown");
    }

    #[test]
    fn test_documented_names_are_unique_and_prefixed() {
        let docs: Vec<(MetricDoc, &str)> = MergerMetrics::metrics_documentation()
            .into_iter()
            .map(|d| (d, MergerMetrics::phase_name()))
            .chain(
                CleanerMetrics::metrics_documentation()
                    .into_iter()
                    .map(|d| (d, CleanerMetrics::phase_name())),
            )
            .chain(
                FeatureMetrics::metrics_documentation()
                    .into_iter()
                    .map(|d| (d, FeatureMetrics::phase_name())),
            )
            .collect();

        let mut seen = std::collections::HashSet::new();
        for (doc, phase) in &docs {
            assert!(seen.insert(doc.name), "duplicate metric {}", doc.name);
            assert_eq!(extract_phase_from_metric_name(doc.name), *phase);
        }
    }
}
