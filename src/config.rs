use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::common::time::parse_timestamp;
use crate::constants;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fixed as-of instant for age and recency metrics; `None` means "now"
    pub as_of: Option<String>,
    pub log_dir: PathBuf,
    pub paths: PathsConfig,
    /// Raw partitions in merge order
    pub partitions: Vec<PartitionSpec>,
    pub cleaning: CleaningConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub merged: PathBuf,
    pub cleaned: PathBuf,
    pub featured: PathBuf,
    pub report: PathBuf,
}

/// One language partition: the mapping key and where its raw table lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionSpec {
    pub language: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub clip_quantile: f64,
    pub unknown_language: String,
    pub future_timestamps: FutureTimestampPolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus textfile written at the end of a run
    pub textfile: Option<PathBuf>,
}

/// What to do with a `created_at`/`updated_at` later than the as-of instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FutureTimestampPolicy {
    /// Treat the span as zero days and count the occurrence
    #[default]
    Clamp,
    /// Abort the run
    Reject,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = Path::new(constants::DEFAULT_DATA_DIR);
        Self {
            as_of: None,
            log_dir: PathBuf::from(constants::DEFAULT_LOG_DIR),
            paths: PathsConfig::default(),
            partitions: constants::DEFAULT_LANGUAGES
                .iter()
                .map(|language| PartitionSpec {
                    language: language.to_string(),
                    path: data_dir.join(constants::partition_file_name(language)),
                })
                .collect(),
            cleaning: CleaningConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let data_dir = Path::new(constants::DEFAULT_DATA_DIR);
        Self {
            merged: data_dir.join("raw").join("all_github_repos.csv"),
            cleaned: data_dir.join("processed").join("cleaned_github_repos.csv"),
            featured: data_dir.join("processed").join("featured_github_repos.csv"),
            report: data_dir.join("processed").join("run_report.json"),
        }
    }
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            clip_quantile: constants::DEFAULT_CLIP_QUANTILE,
            unknown_language: constants::UNKNOWN_LANGUAGE.to_string(),
            future_timestamps: FutureTimestampPolicy::default(),
        }
    }
}

impl Config {
    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Like [`Config::load`], but falls back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No config file at {}, using defaults", path.display());
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let q = self.cleaning.clip_quantile;
        if !(q > 0.0 && q <= 1.0) {
            return Err(PipelineError::Config(format!(
                "cleaning.clip_quantile must be in (0, 1], got {q}"
            )));
        }
        if self.cleaning.unknown_language.trim().is_empty() {
            return Err(PipelineError::Config(
                "cleaning.unknown_language must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for partition in &self.partitions {
            if partition.language.trim().is_empty() {
                return Err(PipelineError::Config(
                    "partition language keys must not be empty".to_string(),
                ));
            }
            if partition.path.as_os_str().is_empty() {
                return Err(PipelineError::Config(format!(
                    "partition '{}' has an empty path",
                    partition.language
                )));
            }
            if !seen.insert(partition.language.as_str()) {
                return Err(PipelineError::Config(format!(
                    "partition '{}' is listed more than once",
                    partition.language
                )));
            }
        }

        if let Some(as_of) = &self.as_of {
            parse_as_of(as_of)?;
        }
        Ok(())
    }

    /// Resolve the as-of instant for this run: explicit override, then
    /// `REPO_INSIGHTS_AS_OF`, then the config file, then the current time.
    pub fn resolve_as_of(&self, cli_override: Option<&str>) -> Result<DateTime<Utc>> {
        if let Some(value) = cli_override {
            return parse_as_of(value);
        }
        if let Ok(value) = std::env::var(constants::AS_OF_ENV) {
            if !value.trim().is_empty() {
                return parse_as_of(&value);
            }
        }
        if let Some(value) = &self.as_of {
            return parse_as_of(value);
        }
        Ok(Utc::now())
    }
}

fn parse_as_of(value: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(value)
        .map_err(|reason| PipelineError::Config(format!("invalid as-of instant '{value}': {reason}")))
}
