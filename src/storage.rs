//! Flat-file persistence for stage artifacts.
//!
//! Every table is a CSV file with a header row. Writes go to a temporary file in
//! the destination directory and are renamed into place only once the whole
//! table has been written, so a failing stage never leaves a partial artifact.
//! Two runs writing the same path concurrently are last-writer-wins.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::PartitionSpec;
use crate::constants::RAW_SCHEMA;
use crate::error::{PipelineError, Result};
use crate::pipeline::processing::clean::normalize_column_name;
use crate::types::RawRecord;

/// How header cells are matched against the declared columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// Header cells must match the declared names exactly
    Exact,
    /// Header cells are trimmed and lower-cased first
    Normalize,
}

/// A table written to disk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactInfo {
    pub path: PathBuf,
    pub rows: usize,
    pub sha256: String,
}

/// Load one raw language partition, rejecting it if any raw column is absent
pub fn read_raw_partition(spec: &PartitionSpec) -> Result<Vec<RawRecord>> {
    read_table(&spec.path, &spec.language, &RAW_SCHEMA, HeaderPolicy::Exact)
}

/// Load a stage table into typed records.
///
/// `table` names the table in diagnostics. Every column in `required` must be
/// present; extra columns are ignored.
pub fn read_table<T>(
    path: &Path,
    table: &str,
    required: &[&str],
    policy: HeaderPolicy,
) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    if !path.exists() {
        return Err(PipelineError::MissingInput {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let headers: csv::StringRecord = match policy {
        HeaderPolicy::Exact => headers,
        HeaderPolicy::Normalize => headers.iter().map(normalize_column_name).collect(),
    };
    check_columns(table, &headers, required)?;
    reader.set_headers(headers);

    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<T>().enumerate() {
        let record = row.map_err(|source| PipelineError::Row {
            table: table.to_string(),
            row: index + 1,
            source,
        })?;
        records.push(record);
    }

    debug!("Loaded {} rows from {}", records.len(), path.display());
    Ok(records)
}

fn check_columns(table: &str, headers: &csv::StringRecord, required: &[&str]) -> Result<()> {
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(PipelineError::Schema {
                partition: table.to_string(),
                column: column.to_string(),
            });
        }
    }

    let extra: Vec<&str> = headers
        .iter()
        .filter(|h| !required.contains(h))
        .collect();
    if !extra.is_empty() {
        warn!("Table '{}' has undeclared columns that will be dropped: {:?}", table, extra);
    }
    Ok(())
}

/// Serialize `records` under an explicit header and atomically move the file into place
pub fn write_table<T>(path: &Path, columns: &[&str], records: &[T]) -> Result<ArtifactInfo>
where
    T: Serialize,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(columns)?;
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| PipelineError::Io(e.into_error()))?;

    let sha256 = write_atomically(path, &bytes)?;
    debug!("Wrote {} rows to {}", records.len(), path.display());

    Ok(ArtifactInfo {
        path: path.to_path_buf(),
        rows: records.len(),
        sha256,
    })
}

/// Write `bytes` to `path` via a sibling temp file; returns the hex SHA-256 of the content
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<String> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut tmp = NamedTempFile::new_in(&parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;

    Ok(hex::encode(Sha256::digest(bytes)))
}
