use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::storage::ArtifactInfo;

/// Everything a step needs for one run. The as-of instant is captured once
/// and shared by every step so age and recency agree across stages.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: Config,
    pub as_of: DateTime<Utc>,
}

impl RunContext {
    pub fn new(config: Config, as_of: DateTime<Utc>) -> Self {
        Self { config, as_of }
    }
}

/// Common trait for all pipeline steps
pub trait PipelineStep {
    /// Load the predecessor artifact, transform it and persist the result
    fn execute(&self, ctx: &RunContext) -> Result<StepResult>;

    /// Get the name of this pipeline step
    fn step_name(&self) -> &'static str;
}

/// Result of executing a pipeline step
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub step: String,
    pub processed_count: usize,
    pub output_count: usize,
    pub message: String,
    pub artifact: ArtifactInfo,
    pub duration_secs: f64,
    /// The stage report, kept as JSON so every step fits one result type
    pub report: serde_json::Value,
}

impl StepResult {
    pub fn success<R: Serialize>(
        step: &str,
        processed: usize,
        artifact: ArtifactInfo,
        report: &R,
        message: String,
    ) -> Result<Self> {
        Ok(Self {
            step: step.to_string(),
            processed_count: processed,
            output_count: artifact.rows,
            message,
            artifact,
            duration_secs: 0.0,
            report: serde_json::to_value(report)?,
        })
    }

    pub fn with_duration(mut self, duration_secs: f64) -> Self {
        self.duration_secs = duration_secs;
        self
    }
}

pub mod clean;
pub mod features;
pub mod merge;

pub use clean::CleanStep;
pub use features::FeaturesStep;
pub use merge::MergeStep;
