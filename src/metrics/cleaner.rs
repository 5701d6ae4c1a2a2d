//! Cleaner Phase Metrics
//!
//! Counts every repair the cleaner makes and the ceiling applied per column.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};
use crate::pipeline::processing::clean::CleanReport;

/// Metrics collection for the Cleaner phase
pub struct CleanerMetrics;

impl CleanerMetrics {
    /// Record a completed cleaning pass
    pub fn record_clean(report: &CleanReport, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "cleaner", "rows_in"))
            .increment(report.rows_in as u64);
        ::metrics::counter!(phase_metric!(counter, "cleaner", "rows_out"))
            .increment(report.rows_out as u64);
        ::metrics::counter!(phase_metric!(counter, "cleaner", "duplicates_removed"))
            .increment(report.duplicates_removed as u64);
        ::metrics::counter!(phase_metric!(counter, "cleaner", "languages_filled"))
            .increment(report.languages_filled as u64);
        ::metrics::counter!(phase_metric!(counter, "cleaner", "future_timestamps_clamped"))
            .increment(report.future_created_clamped as u64);
        ::metrics::counter!(phase_metric!(counter, "cleaner", "degenerate_ages"))
            .increment(report.degenerate_ages as u64);

        for (column, filled) in &report.nulls_filled {
            ::metrics::counter!(
                phase_metric!(counter, "cleaner", "nulls_filled"),
                "column" => column.clone()
            )
            .increment(*filled as u64);
        }
        for clip in &report.clips {
            ::metrics::counter!(
                phase_metric!(counter, "cleaner", "rows_clipped"),
                "column" => clip.column.clone()
            )
            .increment(clip.rows_clipped as u64);
            if let Some(threshold) = clip.threshold {
                ::metrics::gauge!(
                    phase_metric!(gauge, "cleaner", "clip_threshold"),
                    "column" => clip.column.clone()
                )
                .set(threshold as f64);
            }
        }

        ::metrics::histogram!(phase_metric!(histogram, "cleaner", "duration_seconds"))
            .record(duration_secs);
    }
}

impl PhaseMetrics for CleanerMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "cleaner", "rows_in"));
        let _ = counter!(phase_metric!(counter, "cleaner", "rows_out"));
        let _ = counter!(phase_metric!(counter, "cleaner", "duplicates_removed"));
        let _ = counter!(phase_metric!(counter, "cleaner", "languages_filled"));
        let _ = counter!(phase_metric!(counter, "cleaner", "future_timestamps_clamped"));
        let _ = counter!(phase_metric!(counter, "cleaner", "degenerate_ages"));
        let _ = histogram!(phase_metric!(histogram, "cleaner", "duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "cleaner"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "cleaner", "rows_in"),
                metric_type: MetricType::Counter,
                help: "Rows read from the merged table",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "cleaner", "rows_out"),
                metric_type: MetricType::Counter,
                help: "Rows written to the cleaned table",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "cleaner", "duplicates_removed"),
                metric_type: MetricType::Counter,
                help: "Rows dropped as duplicates of an earlier (repo_name, language)",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "cleaner", "languages_filled"),
                metric_type: MetricType::Counter,
                help: "Rows whose missing language was set to the unknown sentinel",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "cleaner", "nulls_filled"),
                metric_type: MetricType::Counter,
                help: "Null count cells defaulted to zero",
                labels: vec!["column"],
            },
            MetricDoc {
                name: phase_metric!(counter, "cleaner", "rows_clipped"),
                metric_type: MetricType::Counter,
                help: "Values lowered to the column's percentile ceiling",
                labels: vec!["column"],
            },
            MetricDoc {
                name: phase_metric!(gauge, "cleaner", "clip_threshold"),
                metric_type: MetricType::Gauge,
                help: "Ceiling applied to each clipped column in the last run",
                labels: vec!["column"],
            },
            MetricDoc {
                name: phase_metric!(counter, "cleaner", "future_timestamps_clamped"),
                metric_type: MetricType::Counter,
                help: "Creation timestamps after the as-of instant that were clamped",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "cleaner", "degenerate_ages"),
                metric_type: MetricType::Counter,
                help: "Rows with a zero-day age",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "cleaner", "duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Duration of the clean step in seconds",
                labels: vec![],
            },
        ]
    }
}
