//! Data-understanding summary of any stage table.
//!
//! Works on the raw CSV cells rather than typed records, so it can be pointed
//! at a raw partition, the merged table or either processed artifact.

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{LANGUAGE, REPO_NAME};
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    /// Rows identical to an earlier row in every cell
    pub exact_duplicate_rows: usize,
    /// Rows repeating an earlier `(repo_name, language)`; absent when either column is
    pub key_duplicate_rows: Option<usize>,
    /// Distinct non-empty languages, sorted
    pub languages: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub nulls: usize,
    /// Present when every non-empty cell parses as a number
    pub numeric: Option<NumericSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

/// Running numeric aggregate for one column
#[derive(Default)]
struct NumericAccumulator {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
    non_numeric: bool,
}

impl NumericAccumulator {
    fn push(&mut self, cell: &str) {
        if self.non_numeric {
            return;
        }
        match cell.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                if self.count == 0 {
                    self.min = value;
                    self.max = value;
                } else {
                    self.min = self.min.min(value);
                    self.max = self.max.max(value);
                }
                self.count += 1;
                self.sum += value;
            }
            _ => self.non_numeric = true,
        }
    }

    fn finish(&self) -> Option<NumericSummary> {
        if self.non_numeric || self.count == 0 {
            return None;
        }
        Some(NumericSummary {
            min: self.min,
            mean: self.sum / self.count as f64,
            max: self.max,
        })
    }
}

/// Summarize the table at `path`
pub fn inspect_table(path: &Path) -> Result<TableSummary> {
    if !path.exists() {
        return Err(PipelineError::MissingInput {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let repo_idx = headers.iter().position(|h| h == REPO_NAME);
    let lang_idx = headers.iter().position(|h| h == LANGUAGE);

    let mut nulls = vec![0usize; headers.len()];
    let mut numeric: Vec<NumericAccumulator> =
        headers.iter().map(|_| NumericAccumulator::default()).collect();
    let mut seen_rows: HashSet<Vec<String>> = HashSet::new();
    let mut seen_keys: HashSet<(String, String)> = HashSet::new();
    let mut languages = BTreeSet::new();

    let mut rows = 0;
    let mut exact_duplicate_rows = 0;
    let mut key_duplicate_rows = 0;

    for record in reader.records() {
        let record = record?;
        rows += 1;

        for (index, cell) in record.iter().enumerate().take(headers.len()) {
            let cell = cell.trim();
            if cell.is_empty() {
                nulls[index] += 1;
            } else {
                numeric[index].push(cell);
            }
        }

        let cells: Vec<String> = record.iter().map(str::to_string).collect();
        if !seen_rows.insert(cells) {
            exact_duplicate_rows += 1;
        }

        if let (Some(r), Some(l)) = (repo_idx, lang_idx) {
            let key = (
                record.get(r).unwrap_or_default().to_string(),
                record.get(l).unwrap_or_default().to_string(),
            );
            if !seen_keys.insert(key) {
                key_duplicate_rows += 1;
            }
        }
        if let Some(language) = lang_idx.and_then(|l| record.get(l)) {
            let language = language.trim();
            if !language.is_empty() {
                languages.insert(language.to_string());
            }
        }
    }

    debug!("Inspected {} rows from {}", rows, path.display());

    let has_key = repo_idx.is_some() && lang_idx.is_some();
    Ok(TableSummary {
        path: path.to_path_buf(),
        rows,
        columns: headers
            .into_iter()
            .zip(nulls)
            .zip(&numeric)
            .map(|((name, nulls), acc)| ColumnSummary {
                name,
                nulls,
                numeric: acc.finish(),
            })
            .collect(),
        exact_duplicate_rows,
        key_duplicate_rows: has_key.then_some(key_duplicate_rows),
        languages: lang_idx.map(|_| languages.into_iter().collect()),
    })
}

impl fmt::Display for TableSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Table: {}", self.path.display())?;
        writeln!(f, "Shape: {} rows x {} columns", self.rows, self.columns.len())?;
        writeln!(f)?;
        writeln!(f, "{:<26} {:>8} {:>14} {:>14} {:>14}", "column", "nulls", "min", "mean", "max")?;
        for column in &self.columns {
            match &column.numeric {
                Some(n) => writeln!(
                    f,
                    "{:<26} {:>8} {:>14.3} {:>14.3} {:>14.3}",
                    column.name, column.nulls, n.min, n.mean, n.max
                )?,
                None => writeln!(f, "{:<26} {:>8}", column.name, column.nulls)?,
            }
        }
        writeln!(f)?;
        writeln!(f, "Exact duplicate rows: {}", self.exact_duplicate_rows)?;
        if let Some(dups) = self.key_duplicate_rows {
            writeln!(f, "Duplicate (repo_name, language) rows: {}", dups)?;
        }
        if let Some(languages) = &self.languages {
            writeln!(f, "Distinct languages ({}): {}", languages.len(), languages.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_inspect_counts_nulls_duplicates_and_languages() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merged.csv");
        fs::write(
            &path,
            "repo_name,language,stargazers_count,note\n\
             k8s,Go,10,x\n\
             k8s,Go,10,x\n\
             k8s,Go,30,y\n\
             hugo,,,z\n\
             tokio,Rust,5,\n",
        )
        .unwrap();

        let summary = inspect_table(&path).unwrap();
        assert_eq!(summary.rows, 5);
        assert_eq!(summary.columns.len(), 4);
        assert_eq!(summary.exact_duplicate_rows, 1);
        assert_eq!(summary.key_duplicate_rows, Some(2));
        assert_eq!(
            summary.languages,
            Some(vec!["Go".to_string(), "Rust".to_string()])
        );

        let stars = &summary.columns[2];
        assert_eq!(stars.nulls, 1);
        assert_eq!(
            stars.numeric,
            Some(NumericSummary {
                min: 5.0,
                mean: 13.75,
                max: 30.0
            })
        );
        assert_eq!(summary.columns[0].numeric, None);
        assert_eq!(summary.columns[3].nulls, 1);
    }

    #[test]
    fn test_inspect_without_key_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("other.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();

        let summary = inspect_table(&path).unwrap();
        assert_eq!(summary.key_duplicate_rows, None);
        assert_eq!(summary.languages, None);
        assert!(summary.to_string().contains("Shape: 1 rows x 2 columns"));
    }

    #[test]
    fn test_inspect_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            inspect_table(&dir.path().join("nope.csv")),
            Err(PipelineError::MissingInput { .. })
        ));
    }
}
