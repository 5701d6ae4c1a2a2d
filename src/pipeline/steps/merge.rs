use std::time::Instant;
use tracing::{debug, info};

use super::{PipelineStep, RunContext, StepResult};
use crate::constants::MERGED_COLUMNS;
use crate::error::{PipelineError, Result};
use crate::metrics::MergerMetrics;
use crate::pipeline::processing::merge::{merge_partitions, RawPartition};
use crate::storage::{read_raw_partition, write_table};

/// Pipeline step that concatenates every configured language partition
#[derive(Debug, Default)]
pub struct MergeStep;

impl MergeStep {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineStep for MergeStep {
    fn execute(&self, ctx: &RunContext) -> Result<StepResult> {
        let started = Instant::now();
        let partitions = &ctx.config.partitions;
        if partitions.is_empty() {
            return Err(PipelineError::Config(
                "merge needs at least one partition".to_string(),
            ));
        }
        info!("🔗 Running merge step over {} partitions", partitions.len());

        // Load everything before writing anything, so a bad partition leaves no output
        let mut loaded = Vec::with_capacity(partitions.len());
        for spec in partitions {
            let records = read_raw_partition(spec)?;
            debug!("Loaded {} rows for '{}'", records.len(), spec.language);
            MergerMetrics::record_partition_loaded(records.len());
            loaded.push(RawPartition {
                language_source: spec.language.clone(),
                records,
            });
        }

        let outcome = merge_partitions(loaded);
        let artifact = write_table(&ctx.config.paths.merged, &MERGED_COLUMNS, &outcome.records)?;

        let duration = started.elapsed().as_secs_f64();
        MergerMetrics::record_merge(outcome.report.total_rows, duration);

        let message = format!(
            "Merge completed: {} rows from {} partitions written to {}",
            outcome.report.total_rows,
            outcome.report.partitions.len(),
            artifact.path.display()
        );
        info!("✅ {}", message);

        Ok(StepResult::success(
            self.step_name(),
            outcome.report.total_rows,
            artifact,
            &outcome.report,
            message,
        )?
        .with_duration(duration))
    }

    fn step_name(&self) -> &'static str {
        "merge"
    }
}
