use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, info_span};
use uuid::Uuid;

use super::pipeline_config::{PipelineConfig, PipelineStepConfig};
use super::steps::{CleanStep, FeaturesStep, MergeStep, PipelineStep, RunContext, StepResult};
use crate::config::Config;
use crate::error::Result;
use crate::metrics;
use crate::storage::write_atomically;

/// Runs declarative pipelines over the configured artifacts
pub struct PipelineOrchestrator {
    ctx: RunContext,
}

impl PipelineOrchestrator {
    /// `as_of` is fixed for the lifetime of the orchestrator
    pub fn new(config: Config, as_of: DateTime<Utc>) -> Self {
        Self {
            ctx: RunContext::new(config, as_of),
        }
    }

    /// Run every step in order, stopping at the first failure.
    ///
    /// Artifacts written by steps that finished before the failure stay on
    /// disk; the failing step writes nothing. On success the run report is
    /// written to `paths.report`.
    pub fn run_pipeline(&self, pipeline: &PipelineConfig) -> Result<PipelineExecutionResult> {
        pipeline.validate()?;

        let mut execution = PipelineExecutionResult::new(&pipeline.name, self.ctx.as_of);
        let span = info_span!("pipeline", name = %pipeline.name, run_id = %execution.run_id);
        let _enter = span.enter();

        info!("🚀 Starting pipeline '{}' (as of {})", pipeline.name, self.ctx.as_of);
        info!("📋 Pipeline description: {}", pipeline.description);

        for (index, step_config) in pipeline.steps.iter().enumerate() {
            info!(
                "🔄 Executing step {}/{}: {}",
                index + 1,
                pipeline.steps.len(),
                step_config.step_name()
            );

            match self.run_step(*step_config) {
                Ok(result) => execution.add_step_result(result),
                Err(e) => {
                    error!("❌ Step '{}' failed: {}", step_config.step_name(), e);
                    return Err(e);
                }
            }
        }

        execution.complete();
        let report = serde_json::to_vec_pretty(&execution)?;
        write_atomically(&self.ctx.config.paths.report, &report)?;

        if let Some(textfile) = &self.ctx.config.metrics.textfile {
            metrics::write_textfile(textfile)?;
        }

        info!(
            "🎉 Pipeline '{}' completed: {} steps in {:.2}s, report at {}",
            pipeline.name,
            execution.step_results.len(),
            execution.duration_secs().unwrap_or_default(),
            self.ctx.config.paths.report.display()
        );

        Ok(execution)
    }

    /// Run a single step independently, without writing a run report
    pub fn run_step(&self, step_config: PipelineStepConfig) -> Result<StepResult> {
        let step = create_step(step_config);
        let span = info_span!("step", name = step.step_name());
        let _enter = span.enter();
        step.execute(&self.ctx)
    }
}

fn create_step(step_config: PipelineStepConfig) -> Box<dyn PipelineStep> {
    match step_config {
        PipelineStepConfig::Merge => Box::new(MergeStep::new()),
        PipelineStepConfig::Clean => Box::new(CleanStep::new()),
        PipelineStepConfig::Features => Box::new(FeaturesStep::new()),
    }
}

/// Result of executing a complete pipeline; serialized as the run report
#[derive(Debug, Clone, Serialize)]
pub struct PipelineExecutionResult {
    pub run_id: Uuid,
    pub pipeline_name: String,
    pub as_of: DateTime<Utc>,
    pub step_results: Vec<StepResult>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl PipelineExecutionResult {
    pub fn new(pipeline_name: &str, as_of: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            pipeline_name: pipeline_name.to_string(),
            as_of,
            step_results: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn add_step_result(&mut self, result: StepResult) {
        self.step_results.push(result);
    }

    pub fn step(&self, name: &str) -> Option<&StepResult> {
        self.step_results.iter().find(|r| r.step == name)
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|end| end - self.started_at)
    }

    fn duration_secs(&self) -> Option<f64> {
        self.duration()
            .and_then(|d| d.to_std().ok())
            .map(|d| d.as_secs_f64())
    }
}
