use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{PipelineError, Result};

/// Configuration for a complete pipeline execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: String,
    pub steps: Vec<PipelineStepConfig>,
}

/// Configuration for individual pipeline steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStepConfig {
    Merge,
    Clean,
    Features,
}

impl PipelineConfig {
    /// Merge, clean and feature-engineer in one run
    pub fn full_pipeline() -> Self {
        Self {
            name: "full_pipeline".to_string(),
            description: "Merge language partitions, clean, and engineer features".to_string(),
            steps: vec![
                PipelineStepConfig::Merge,
                PipelineStepConfig::Clean,
                PipelineStepConfig::Features,
            ],
        }
    }

    pub fn merge_only() -> Self {
        Self {
            name: "merge_only".to_string(),
            description: "Concatenate raw language partitions".to_string(),
            steps: vec![PipelineStepConfig::Merge],
        }
    }

    pub fn clean_only() -> Self {
        Self {
            name: "clean_only".to_string(),
            description: "Clean the merged table".to_string(),
            steps: vec![PipelineStepConfig::Clean],
        }
    }

    pub fn features_only() -> Self {
        Self {
            name: "features_only".to_string(),
            description: "Engineer features from the cleaned table".to_string(),
            steps: vec![PipelineStepConfig::Features],
        }
    }

    /// Validate the pipeline configuration.
    ///
    /// A step may run without its dependency (the dependency's artifact is then
    /// read from disk), but never before it.
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(PipelineError::Config(format!(
                "pipeline '{}' must have at least one step",
                self.name
            )));
        }

        let mut seen_steps = HashSet::new();
        for (index, step) in self.steps.iter().enumerate() {
            let step_name = step.step_name();
            if !seen_steps.insert(step_name) {
                return Err(PipelineError::Config(format!(
                    "step '{}' appears more than once in pipeline '{}'",
                    step_name, self.name
                )));
            }

            let later = &self.steps[index + 1..];
            for dep in step.dependencies() {
                if later.iter().any(|s| s.step_name() == dep) {
                    return Err(PipelineError::Config(format!(
                        "Step '{}' depends on '{}' which appears later in the pipeline",
                        step_name, dep
                    )));
                }
            }
        }

        Ok(())
    }
}

impl PipelineStepConfig {
    pub fn step_name(&self) -> &'static str {
        match self {
            PipelineStepConfig::Merge => "merge",
            PipelineStepConfig::Clean => "clean",
            PipelineStepConfig::Features => "features",
        }
    }

    pub fn dependencies(&self) -> Vec<&'static str> {
        match self {
            PipelineStepConfig::Merge => vec![],
            PipelineStepConfig::Clean => vec!["merge"],
            PipelineStepConfig::Features => vec!["clean"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factories_validate() {
        for config in [
            PipelineConfig::full_pipeline(),
            PipelineConfig::merge_only(),
            PipelineConfig::clean_only(),
            PipelineConfig::features_only(),
        ] {
            assert!(config.validate().is_ok(), "{} should validate", config.name);
        }
    }

    #[test]
    fn test_rejects_out_of_order_steps() {
        let config = PipelineConfig {
            name: "backwards".to_string(),
            description: String::new(),
            steps: vec![PipelineStepConfig::Features, PipelineStepConfig::Clean],
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("appears later"));
    }

    #[test]
    fn test_rejects_empty_and_repeated_steps() {
        let empty = PipelineConfig {
            name: "empty".to_string(),
            description: String::new(),
            steps: vec![],
        };
        assert!(empty.validate().is_err());

        let repeated = PipelineConfig {
            name: "twice".to_string(),
            description: String::new(),
            steps: vec![PipelineStepConfig::Merge, PipelineStepConfig::Merge],
        };
        assert!(repeated.validate().is_err());
    }
}
