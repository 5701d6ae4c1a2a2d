//! Merger Phase Metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

/// Metrics collection for the Merger phase
pub struct MergerMetrics;

impl MergerMetrics {
    /// Record one raw partition loaded from disk
    pub fn record_partition_loaded(rows: usize) {
        ::metrics::counter!(phase_metric!(counter, "merger", "partitions_loaded")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "merger", "partition_rows"))
            .record(rows as f64);
    }

    /// Record a completed merge
    pub fn record_merge(total_rows: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "merger", "rows_merged"))
            .increment(total_rows as u64);
        ::metrics::histogram!(phase_metric!(histogram, "merger", "duration_seconds"))
            .record(duration_secs);
    }
}

impl PhaseMetrics for MergerMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "merger", "partitions_loaded"));
        let _ = counter!(phase_metric!(counter, "merger", "rows_merged"));
        let _ = histogram!(phase_metric!(histogram, "merger", "partition_rows"));
        let _ = histogram!(phase_metric!(histogram, "merger", "duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "merger"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "merger", "partitions_loaded"),
                metric_type: MetricType::Counter,
                help: "Total number of raw language partitions loaded",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "merger", "rows_merged"),
                metric_type: MetricType::Counter,
                help: "Total number of rows written to the merged table",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "merger", "partition_rows"),
                metric_type: MetricType::Histogram,
                help: "Rows per raw partition",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "merger", "duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Duration of the merge step in seconds",
                labels: vec![],
            },
        ]
    }
}
