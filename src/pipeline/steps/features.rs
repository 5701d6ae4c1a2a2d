use std::time::Instant;
use tracing::info;

use super::{PipelineStep, RunContext, StepResult};
use crate::constants::{CLEANED_COLUMNS, FEATURED_COLUMNS};
use crate::error::Result;
use crate::metrics::FeatureMetrics;
use crate::pipeline::processing::features::{engineer_features, FeatureOptions};
use crate::storage::{read_table, write_table, HeaderPolicy};
use crate::types::CleanRecord;

// The cleaner's derived columns are recomputed when absent, so they are not required on input.
const REQUIRED_INPUT_COLUMNS: usize = CLEANED_COLUMNS.len() - 2;

/// Pipeline step that appends engineered features to the cleaned table
#[derive(Debug, Default)]
pub struct FeaturesStep;

impl FeaturesStep {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineStep for FeaturesStep {
    fn execute(&self, ctx: &RunContext) -> Result<StepResult> {
        let started = Instant::now();
        let input = &ctx.config.paths.cleaned;
        info!("📐 Running features step on {}", input.display());

        let cleaned: Vec<CleanRecord> = read_table(
            input,
            "cleaned",
            &CLEANED_COLUMNS[..REQUIRED_INPUT_COLUMNS],
            HeaderPolicy::Exact,
        )?;

        let options = FeatureOptions {
            as_of: ctx.as_of,
            future_timestamps: ctx.config.cleaning.future_timestamps,
        };
        let outcome = engineer_features(&cleaned, &options)?;
        let artifact = write_table(&ctx.config.paths.featured, &FEATURED_COLUMNS, &outcome.records)?;

        let duration = started.elapsed().as_secs_f64();
        FeatureMetrics::record_features(&outcome.report, duration);

        let message = format!(
            "Features completed: {} rows written to {}",
            outcome.report.rows,
            artifact.path.display()
        );
        info!("✅ {}", message);

        Ok(
            StepResult::success(self.step_name(), cleaned.len(), artifact, &outcome.report, message)?
                .with_duration(duration),
        )
    }

    fn step_name(&self) -> &'static str {
        "features"
    }
}
