use std::time::Instant;
use tracing::info;

use super::{PipelineStep, RunContext, StepResult};
use crate::constants::{CLEANED_COLUMNS, MERGED_COLUMNS};
use crate::error::Result;
use crate::metrics::CleanerMetrics;
use crate::pipeline::processing::clean::{clean, CleanOptions};
use crate::storage::{read_table, write_table, HeaderPolicy};
use crate::types::MergedRecord;

/// Pipeline step for repairing, deduplicating and bounding the merged table
#[derive(Debug, Default)]
pub struct CleanStep;

impl CleanStep {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineStep for CleanStep {
    fn execute(&self, ctx: &RunContext) -> Result<StepResult> {
        let started = Instant::now();
        let input = &ctx.config.paths.merged;
        info!("🧹 Running clean step on {}", input.display());

        let merged: Vec<MergedRecord> =
            read_table(input, "merged", &MERGED_COLUMNS, HeaderPolicy::Normalize)?;
        let rows_in = merged.len();

        let options = CleanOptions::from_config(&ctx.config.cleaning, ctx.as_of);
        let outcome = clean(merged, &options)?;
        let artifact = write_table(&ctx.config.paths.cleaned, &CLEANED_COLUMNS, &outcome.records)?;

        let duration = started.elapsed().as_secs_f64();
        CleanerMetrics::record_clean(&outcome.report, duration);

        let message = format!(
            "Clean completed: {} rows in, {} rows out ({} duplicates removed)",
            rows_in, outcome.report.rows_out, outcome.report.duplicates_removed
        );
        info!("✅ {}", message);

        Ok(StepResult::success(self.step_name(), rows_in, artifact, &outcome.report, message)?
            .with_duration(duration))
    }

    fn step_name(&self) -> &'static str {
        "clean"
    }
}
