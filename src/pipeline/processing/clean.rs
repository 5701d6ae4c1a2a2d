//! Cleaner: repairs, deduplicates, normalizes and bounds the merged dataset.
//!
//! Steps run in a fixed order over the whole table:
//! missing-value repair, deduplication on `(repo_name, language)`, timestamp
//! parsing, 99th-percentile capping, then the first derived metrics.
//! Column-name normalization happens when the merged table is loaded (see
//! [`normalize_column_name`]).

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, instrument, warn};

use super::stats::clip_upper;
use crate::common::time::{parse_timestamp, whole_days_between};
use crate::config::{CleaningConfig, FutureTimestampPolicy};
use crate::constants::{
    CLIPPED_COLUMNS, CREATED_AT, FORKS_COUNT, SIZE, STARGAZERS_COUNT, UPDATED_AT,
};
use crate::error::{PipelineError, Result};
use crate::types::{CleanRecord, MergedRecord};

#[derive(Debug, Clone)]
pub struct CleanOptions {
    pub as_of: DateTime<Utc>,
    pub clip_quantile: f64,
    pub unknown_language: String,
    pub future_timestamps: FutureTimestampPolicy,
}

impl CleanOptions {
    pub fn from_config(config: &CleaningConfig, as_of: DateTime<Utc>) -> Self {
        Self {
            as_of,
            clip_quantile: config.clip_quantile,
            unknown_language: config.unknown_language.clone(),
            future_timestamps: config.future_timestamps,
        }
    }
}

/// Ceiling applied to one count column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnClip {
    pub column: String,
    pub threshold: Option<u64>,
    pub rows_clipped: usize,
}

/// Every repair the cleaner made, so a run can be audited afterwards
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub languages_filled: usize,
    pub nulls_filled: BTreeMap<String, usize>,
    pub duplicates_removed: usize,
    pub clips: Vec<ColumnClip>,
    pub future_created_clamped: usize,
    /// Rows created on the as-of day; `stars_per_day` uses a one-day denominator for them
    pub degenerate_ages: usize,
}

#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub records: Vec<CleanRecord>,
    pub report: CleanReport,
}

/// A merged row after missing-value repair, still carrying raw timestamps
struct RepairedRow {
    row: usize,
    repo_name: String,
    language: String,
    created_at: String,
    updated_at: String,
    stargazers_count: u64,
    forks_count: u64,
    open_issues_count: Option<u64>,
    watchers_count: Option<u64>,
    size: u64,
    language_source: String,
}

/// Trim and lower-case a column identifier
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Run the cleaner over the whole merged table
#[instrument(skip_all, fields(rows = records.len(), as_of = %options.as_of))]
pub fn clean(records: Vec<MergedRecord>, options: &CleanOptions) -> Result<CleanOutcome> {
    let mut report = CleanReport {
        rows_in: records.len(),
        ..CleanReport::default()
    };

    let repaired = repair_missing(records, &options.unknown_language, &mut report);
    info!(
        "Missing values handled: {} languages, {:?} counts",
        report.languages_filled, report.nulls_filled
    );

    let unique = deduplicate(repaired, &mut report);
    info!(
        "Removed {} duplicate repositories, {} remain",
        report.duplicates_removed,
        unique.len()
    );

    let mut cleaned = parse_timestamps(unique)?;
    debug!("Timestamps normalized to UTC");

    cap_outliers(&mut cleaned, options.clip_quantile, &mut report);
    info!("Outliers capped at quantile {}", options.clip_quantile);

    derive_age_metrics(&mut cleaned, options, &mut report)?;

    report.rows_out = cleaned.len();
    info!(
        "Cleaning finished: {} rows in, {} rows out",
        report.rows_in, report.rows_out
    );

    Ok(CleanOutcome {
        records: cleaned,
        report,
    })
}

fn repair_missing(
    records: Vec<MergedRecord>,
    unknown_language: &str,
    report: &mut CleanReport,
) -> Vec<RepairedRow> {
    let mut stars_filled = 0;
    let mut forks_filled = 0;
    let mut size_filled = 0;

    let repaired = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let language = match record.language {
                Some(language) if !language.is_empty() => language,
                _ => {
                    report.languages_filled += 1;
                    unknown_language.to_string()
                }
            };
            let fill = |value: Option<u64>, counter: &mut usize| {
                value.unwrap_or_else(|| {
                    *counter += 1;
                    0
                })
            };

            RepairedRow {
                row: index + 1,
                repo_name: record.repo_name,
                language,
                created_at: record.created_at,
                updated_at: record.updated_at,
                stargazers_count: fill(record.stargazers_count, &mut stars_filled),
                forks_count: fill(record.forks_count, &mut forks_filled),
                open_issues_count: record.open_issues_count,
                watchers_count: record.watchers_count,
                size: fill(record.size, &mut size_filled),
                language_source: record.language_source,
            }
        })
        .collect();

    report.nulls_filled.insert(STARGAZERS_COUNT.to_string(), stars_filled);
    report.nulls_filled.insert(FORKS_COUNT.to_string(), forks_filled);
    report.nulls_filled.insert(SIZE.to_string(), size_filled);
    repaired
}

/// Keep the first row seen for each `(repo_name, language)` key
fn deduplicate(rows: Vec<RepairedRow>, report: &mut CleanReport) -> Vec<RepairedRow> {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(rows.len());
    let before = rows.len();

    let unique: Vec<RepairedRow> = rows
        .into_iter()
        .filter(|row| seen.insert((row.repo_name.clone(), row.language.clone())))
        .collect();

    report.duplicates_removed = before - unique.len();
    unique
}

fn parse_timestamps(rows: Vec<RepairedRow>) -> Result<Vec<CleanRecord>> {
    rows.into_iter()
        .map(|row| {
            let created_at = parse_column(row.row, CREATED_AT, &row.created_at)?;
            let updated_at = parse_column(row.row, UPDATED_AT, &row.updated_at)?;
            Ok(CleanRecord {
                repo_name: row.repo_name,
                language: row.language,
                created_at,
                updated_at,
                stargazers_count: row.stargazers_count,
                forks_count: row.forks_count,
                open_issues_count: row.open_issues_count,
                watchers_count: row.watchers_count,
                size: row.size,
                language_source: row.language_source,
                repo_age_days: None,
                stars_per_day: None,
            })
        })
        .collect()
}

fn parse_column(row: usize, column: &str, value: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(value).map_err(|reason| PipelineError::Parse {
        row,
        column: column.to_string(),
        value: value.to_string(),
        reason,
    })
}

fn cap_outliers(records: &mut [CleanRecord], quantile: f64, report: &mut CleanReport) {
    type Field = fn(&mut CleanRecord) -> &mut u64;
    // Same order as CLIPPED_COLUMNS
    let fields: [Field; 3] = [
        |r| &mut r.stargazers_count,
        |r| &mut r.forks_count,
        |r| &mut r.size,
    ];

    for (column, field) in CLIPPED_COLUMNS.into_iter().zip(fields) {
        let values: Vec<u64> = records.iter_mut().map(|r| *field(r)).collect();
        let outcome = clip_upper(&values, quantile);
        for (record, value) in records.iter_mut().zip(outcome.values) {
            *field(record) = value;
        }
        debug!(
            "{}: ceiling {:?}, {} rows clipped",
            column, outcome.threshold, outcome.clipped
        );
        report.clips.push(ColumnClip {
            column: column.to_string(),
            threshold: outcome.threshold,
            rows_clipped: outcome.clipped,
        });
    }
}

fn derive_age_metrics(
    records: &mut [CleanRecord],
    options: &CleanOptions,
    report: &mut CleanReport,
) -> Result<()> {
    for record in records.iter_mut() {
        let mut age_days = whole_days_between(record.created_at, options.as_of);
        if age_days < 0 {
            match options.future_timestamps {
                FutureTimestampPolicy::Reject => {
                    return Err(PipelineError::FutureTimestamp {
                        repo_name: record.repo_name.clone(),
                        column: CREATED_AT.to_string(),
                        value: record.created_at.to_rfc3339(),
                    });
                }
                FutureTimestampPolicy::Clamp => {
                    warn!(
                        "Repository '{}' was created after the as-of instant; clamping its age to 0",
                        record.repo_name
                    );
                    report.future_created_clamped += 1;
                    age_days = 0;
                }
            }
        }
        if age_days == 0 {
            report.degenerate_ages += 1;
        }

        record.repo_age_days = Some(age_days);
        record.stars_per_day = Some(stars_per_day(record.stargazers_count, age_days));
    }
    Ok(())
}

/// Average stars gained per day of repository life.
///
/// Repositories younger than one day are treated as one day old so the value stays finite.
pub fn stars_per_day(stargazers_count: u64, repo_age_days: i64) -> f64 {
    stargazers_count as f64 / repo_age_days.max(1) as f64
}
