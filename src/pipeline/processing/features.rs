//! FeatureEngineer: appends log-scaled, recency and composite metrics.
//!
//! Never removes rows and never changes existing columns. Output is a pure
//! function of the cleaned table and the as-of instant.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::common::time::whole_days_between;
use crate::config::FutureTimestampPolicy;
use crate::constants::{CREATED_AT, UPDATED_AT};
use crate::error::{PipelineError, Result};
use crate::types::{CleanRecord, FeaturedRecord};

use super::clean::stars_per_day;

const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone)]
pub struct FeatureOptions {
    pub as_of: DateTime<Utc>,
    pub future_timestamps: FutureTimestampPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureReport {
    pub rows: usize,
    /// Rows without `watchers_count`; their `log_watchers` and `popularity_score` stay empty
    pub rows_missing_watchers: usize,
    /// Rows whose age had to be recomputed because the cleaned table lacked it
    pub ages_recomputed: usize,
    pub future_timestamps_clamped: usize,
}

#[derive(Debug, Clone)]
pub struct FeatureOutcome {
    pub records: Vec<FeaturedRecord>,
    pub report: FeatureReport,
}

/// `ln(1 + x)`; zero for zero counts and finite for every non-negative count
pub fn log_count(count: u64) -> f64 {
    (count as f64).ln_1p()
}

/// Forks relative to visibility; the `+ 1` keeps zero-star repositories defined
pub fn engagement_ratio(forks_count: u64, stargazers_count: u64) -> f64 {
    round_to(forks_count as f64 / (stargazers_count as f64 + 1.0), 3)
}

/// Round to `decimals` places, ties to even
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

#[instrument(skip_all, fields(rows = records.len(), as_of = %options.as_of))]
pub fn engineer_features(records: &[CleanRecord], options: &FeatureOptions) -> Result<FeatureOutcome> {
    let mut report = FeatureReport {
        rows: records.len(),
        ..FeatureReport::default()
    };

    let featured = records
        .iter()
        .map(|record| engineer_record(record, options, &mut report))
        .collect::<Result<Vec<_>>>()?;

    info!(
        "Engineered features for {} rows ({} without watchers)",
        report.rows, report.rows_missing_watchers
    );

    Ok(FeatureOutcome {
        records: featured,
        report,
    })
}

fn engineer_record(
    record: &CleanRecord,
    options: &FeatureOptions,
    report: &mut FeatureReport,
) -> Result<FeaturedRecord> {
    let repo_age_days = match record.repo_age_days {
        Some(days) => days,
        None => {
            report.ages_recomputed += 1;
            elapsed_days(record, CREATED_AT, record.created_at, options, report)?
        }
    };
    let stars_per_day = record
        .stars_per_day
        .unwrap_or_else(|| stars_per_day(record.stargazers_count, repo_age_days));
    let days_since_last_update = elapsed_days(record, UPDATED_AT, record.updated_at, options, report)?;

    let log_stars = log_count(record.stargazers_count);
    let log_forks = log_count(record.forks_count);
    let log_watchers = record.watchers_count.map(log_count);
    if log_watchers.is_none() {
        report.rows_missing_watchers += 1;
    }
    let popularity_score = log_watchers.map(|watchers| round_to(log_stars + log_forks + watchers, 3));

    Ok(FeaturedRecord {
        repo_name: record.repo_name.clone(),
        language: record.language.clone(),
        created_at: record.created_at,
        updated_at: record.updated_at,
        stargazers_count: record.stargazers_count,
        forks_count: record.forks_count,
        open_issues_count: record.open_issues_count,
        watchers_count: record.watchers_count,
        size: record.size,
        language_source: record.language_source.clone(),
        repo_age_days,
        stars_per_day,
        log_stars,
        log_forks,
        log_watchers,
        repo_age_years: round_to(repo_age_days as f64 / DAYS_PER_YEAR, 2),
        days_since_last_update,
        popularity_score,
        engagement_ratio: engagement_ratio(record.forks_count, record.stargazers_count),
    })
}

/// Whole days from `instant` to the as-of instant, with the future-timestamp policy applied
fn elapsed_days(
    record: &CleanRecord,
    column: &str,
    instant: DateTime<Utc>,
    options: &FeatureOptions,
    report: &mut FeatureReport,
) -> Result<i64> {
    let days = whole_days_between(instant, options.as_of);
    if days >= 0 {
        return Ok(days);
    }
    match options.future_timestamps {
        FutureTimestampPolicy::Reject => Err(PipelineError::FutureTimestamp {
            repo_name: record.repo_name.clone(),
            column: column.to_string(),
            value: instant.to_rfc3339(),
        }),
        FutureTimestampPolicy::Clamp => {
            warn!(
                "Repository '{}' has {} after the as-of instant; clamping to 0 days",
                record.repo_name, column
            );
            report.future_timestamps_clamped += 1;
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn options() -> FeatureOptions {
        FeatureOptions {
            as_of: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            future_timestamps: FutureTimestampPolicy::Clamp,
        }
    }

    fn cleaned(stars: u64, forks: u64, watchers: Option<u64>) -> CleanRecord {
        CleanRecord {
            repo_name: "k8s".to_string(),
            language: "Go".to_string(),
            created_at: Utc.with_ymd_and_hms(2014, 6, 6, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            stargazers_count: stars,
            forks_count: forks,
            open_issues_count: Some(500),
            watchers_count: watchers,
            size: 900_000,
            language_source: "go".to_string(),
            repo_age_days: Some(3862),
            stars_per_day: Some(25.893),
        }
    }

    #[test]
    fn test_log_count_is_zero_at_zero() {
        assert_eq!(log_count(0), 0.0);
        assert!((log_count(100_000) - 100_001f64.ln()).abs() < 1e-12);
        assert!(log_count(u64::MAX).is_finite());
    }

    #[test]
    fn test_popularity_score_sums_logs() {
        let outcome =
            engineer_features(&[cleaned(100_000, 38_000, Some(100_000))], &options()).unwrap();
        let record = &outcome.records[0];
        // 33.57124 unrounded; summing the three terms pre-rounded gives 33.572
        assert_eq!(record.popularity_score, Some(33.571));
        assert!((record.log_forks - 38_001f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_engagement_ratio_handles_zero_stars() {
        assert_eq!(engagement_ratio(0, 0), 0.0);
        assert_eq!(engagement_ratio(5, 0), 5.0);
        assert_eq!(engagement_ratio(38_000, 100_000), 0.38);
        assert_eq!(engagement_ratio(1, 2), 0.333);
    }

    #[test]
    fn test_engagement_ratio_ties_round_to_even() {
        // 1 / 16 = 0.0625 exactly
        assert_eq!(engagement_ratio(1, 15), 0.062);
        // 3 / 16 = 0.1875 exactly
        assert_eq!(engagement_ratio(3, 15), 0.188);
    }

    #[test]
    fn test_recency_and_age_in_years() {
        let outcome = engineer_features(&[cleaned(1, 1, Some(1))], &options()).unwrap();
        let record = &outcome.records[0];
        assert_eq!(record.days_since_last_update, 366);
        assert_eq!(record.repo_age_days, 3862);
        assert_eq!(record.repo_age_years, 10.58);
    }

    #[test]
    fn test_missing_age_is_recomputed() {
        let mut record = cleaned(10, 1, Some(1));
        record.repo_age_days = None;
        record.stars_per_day = None;

        let outcome = engineer_features(&[record], &options()).unwrap();
        assert_eq!(outcome.records[0].repo_age_days, 3862);
        assert_eq!(outcome.report.ages_recomputed, 1);
        assert!((outcome.records[0].stars_per_day - 10.0 / 3862.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_watchers_leave_composite_empty() {
        let outcome = engineer_features(&[cleaned(3, 1, None)], &options()).unwrap();
        let record = &outcome.records[0];
        assert_eq!(record.log_watchers, None);
        assert_eq!(record.popularity_score, None);
        assert_eq!(outcome.report.rows_missing_watchers, 1);
    }

    #[test]
    fn test_future_update_follows_policy() {
        let mut record = cleaned(1, 1, Some(1));
        record.updated_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        let outcome = engineer_features(std::slice::from_ref(&record), &options()).unwrap();
        assert_eq!(outcome.records[0].days_since_last_update, 0);
        assert_eq!(outcome.report.future_timestamps_clamped, 1);

        let strict = FeatureOptions {
            future_timestamps: FutureTimestampPolicy::Reject,
            ..options()
        };
        assert!(matches!(
            engineer_features(&[record], &strict),
            Err(PipelineError::FutureTimestamp { .. })
        ));
    }

    #[test]
    fn test_rerun_is_identical() {
        let input = vec![cleaned(5, 2, Some(9)), cleaned(0, 0, None)];
        let first = engineer_features(&input, &options()).unwrap();
        let second = engineer_features(&input, &options()).unwrap();
        assert_eq!(first.records, second.records);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(33.57249, 3), 33.572);
        assert_eq!(round_to(10.5808, 2), 10.58);
        assert_eq!(round_to(0.0, 3), 0.0);
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
    }
}
