use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("table '{partition}' is missing required column '{column}'")]
    Schema { partition: String, column: String },

    #[error("row {row}: cannot parse {column} value '{value}' as a timestamp: {reason}")]
    Parse {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    #[error("{table}: row {row} does not match the declared schema: {source}")]
    Row {
        table: String,
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("repository '{repo_name}' has {column} in the future ({value})")]
    FutureTimestamp {
        repo_name: String,
        column: String,
        value: String,
    },

    #[error("input artifact not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to move artifact into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
