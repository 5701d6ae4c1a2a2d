//! Feature-engineering Phase Metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};
use crate::pipeline::processing::features::FeatureReport;

/// Metrics collection for the FeatureEngineer phase
pub struct FeatureMetrics;

impl FeatureMetrics {
    pub fn record_features(report: &FeatureReport, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "features", "rows_engineered"))
            .increment(report.rows as u64);
        ::metrics::counter!(phase_metric!(counter, "features", "rows_missing_watchers"))
            .increment(report.rows_missing_watchers as u64);
        ::metrics::counter!(phase_metric!(counter, "features", "ages_recomputed"))
            .increment(report.ages_recomputed as u64);
        ::metrics::counter!(phase_metric!(counter, "features", "future_timestamps_clamped"))
            .increment(report.future_timestamps_clamped as u64);
        ::metrics::histogram!(phase_metric!(histogram, "features", "duration_seconds"))
            .record(duration_secs);
    }
}

impl PhaseMetrics for FeatureMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "features", "rows_engineered"));
        let _ = counter!(phase_metric!(counter, "features", "rows_missing_watchers"));
        let _ = counter!(phase_metric!(counter, "features", "ages_recomputed"));
        let _ = counter!(phase_metric!(counter, "features", "future_timestamps_clamped"));
        let _ = histogram!(phase_metric!(histogram, "features", "duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "features"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "features", "rows_engineered"),
                metric_type: MetricType::Counter,
                help: "Rows written to the featured table",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "features", "rows_missing_watchers"),
                metric_type: MetricType::Counter,
                help: "Rows left without log_watchers and popularity_score",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "features", "ages_recomputed"),
                metric_type: MetricType::Counter,
                help: "Rows whose repo_age_days was missing and recomputed",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "features", "future_timestamps_clamped"),
                metric_type: MetricType::Counter,
                help: "Update timestamps after the as-of instant that were clamped",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "features", "duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Duration of the features step in seconds",
                labels: vec![],
            },
        ]
    }
}
