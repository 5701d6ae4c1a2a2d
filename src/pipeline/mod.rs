// Repository pipeline: pure processing core, persisted steps, and orchestration

pub mod orchestrator;
pub mod pipeline_config;
pub mod processing;
pub mod steps;

pub use orchestrator::{PipelineExecutionResult, PipelineOrchestrator};
pub use pipeline_config::{PipelineConfig, PipelineStepConfig};
