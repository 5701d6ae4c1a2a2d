use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use repo_insights::config::{Config, FutureTimestampPolicy, PartitionSpec};
use repo_insights::constants::{FEATURED_COLUMNS, RAW_SCHEMA};
use repo_insights::pipeline::{PipelineConfig, PipelineOrchestrator};
use repo_insights::storage::{read_table, HeaderPolicy};
use repo_insights::types::FeaturedRecord;
use repo_insights::PipelineError;

const GO_ROWS: &str =
    "k8s,Go,2014-06-06T00:00:00Z,2024-01-01T00:00:00Z,100000,38000,500,100000,900000\n";
const RUST_ROWS: &str = "k8s,Rust,2020-01-01T00:00:00Z,2023-01-01T00:00:00Z,,,5,10,\n";

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

fn write_partition(dir: &Path, language: &str, header: &str, rows: &str) -> PartitionSpec {
    let path = dir.join(format!("{language}_repos.csv"));
    fs::write(&path, format!("{header}\n{rows}")).unwrap();
    PartitionSpec {
        language: language.to_string(),
        path,
    }
}

/// Config pointing every artifact into `dir`, with the go and rust scenario partitions
fn scenario_config(dir: &Path) -> Config {
    let header = RAW_SCHEMA.join(",");
    let mut config = Config::default();
    config.partitions = vec![
        write_partition(dir, "go", &header, GO_ROWS),
        write_partition(dir, "rust", &header, RUST_ROWS),
    ];
    config.paths.merged = dir.join("raw").join("all_github_repos.csv");
    config.paths.cleaned = dir.join("processed").join("cleaned_github_repos.csv");
    config.paths.featured = dir.join("processed").join("featured_github_repos.csv");
    config.paths.report = dir.join("processed").join("run_report.json");
    config
}

fn read_featured(path: &Path) -> Result<Vec<FeaturedRecord>> {
    Ok(read_table(path, "featured", &FEATURED_COLUMNS, HeaderPolicy::Exact)?)
}

#[test]
fn test_scenario_end_to_end() -> Result<()> {
    let dir = tempdir()?;
    let config = scenario_config(dir.path());
    let paths = config.paths.clone();

    let result = PipelineOrchestrator::new(config, as_of())
        .run_pipeline(&PipelineConfig::full_pipeline())?;
    assert_eq!(result.step_results.len(), 3);
    assert_eq!(result.step("merge").map(|s| s.output_count), Some(2));
    assert_eq!(result.step("clean").map(|s| s.output_count), Some(2));

    let merged = fs::read_to_string(&paths.merged)?;
    let mut lines = merged.lines();
    assert!(lines.next().unwrap_or_default().ends_with(",language_source"));
    assert!(lines.next().unwrap_or_default().ends_with(",go"));
    assert!(lines.next().unwrap_or_default().ends_with(",rust"));

    let featured = read_featured(&paths.featured)?;
    assert_eq!(featured.len(), 2);

    let go = &featured[0];
    assert_eq!(go.language, "Go");
    assert_eq!(go.language_source, "go");
    // ln(100001) + ln(38001) + ln(100001) = 33.57124
    assert_eq!(go.popularity_score, Some(33.571));
    assert_eq!(go.engagement_ratio, 0.38);
    assert_eq!(go.days_since_last_update, 366);

    let rust = &featured[1];
    assert_eq!(rust.language_source, "rust");
    assert_eq!(rust.stargazers_count, 0);
    assert_eq!(rust.forks_count, 0);
    assert_eq!(rust.size, 0);
    assert_eq!(rust.engagement_ratio, 0.0);
    assert_eq!(rust.repo_age_days, 1827);
    assert_eq!(rust.stars_per_day, 0.0);

    let report: serde_json::Value = serde_json::from_slice(&fs::read(&paths.report)?)?;
    assert_eq!(report["pipeline_name"], "full_pipeline");
    assert_eq!(report["as_of"], "2025-01-01T00:00:00Z");
    let featured_sha = hex::encode(Sha256::digest(fs::read(&paths.featured)?));
    assert_eq!(report["step_results"][2]["artifact"]["sha256"], featured_sha.as_str());
    assert_eq!(report["step_results"][1]["report"]["nulls_filled"]["size"], 1);
    Ok(())
}

#[test]
fn test_steps_run_separately_match_full_run() -> Result<()> {
    let full_dir = tempdir()?;
    let full = scenario_config(full_dir.path());
    let full_featured = full.paths.featured.clone();
    PipelineOrchestrator::new(full, as_of()).run_pipeline(&PipelineConfig::full_pipeline())?;

    let step_dir = tempdir()?;
    let stepwise = scenario_config(step_dir.path());
    let step_featured = stepwise.paths.featured.clone();
    let orchestrator = PipelineOrchestrator::new(stepwise, as_of());
    for pipeline in [
        PipelineConfig::merge_only(),
        PipelineConfig::clean_only(),
        PipelineConfig::features_only(),
    ] {
        orchestrator.run_pipeline(&pipeline)?;
    }

    assert_eq!(fs::read(full_featured)?, fs::read(step_featured)?);
    Ok(())
}

#[test]
fn test_schema_error_leaves_no_output() -> Result<()> {
    let dir = tempdir()?;
    let mut config = scenario_config(dir.path());
    let without_size = RAW_SCHEMA[..8].join(",");
    config.partitions[1] = write_partition(
        dir.path(),
        "rust",
        &without_size,
        "k8s,Rust,2020-01-01T00:00:00Z,2023-01-01T00:00:00Z,,,5,10\n",
    );
    let paths = config.paths.clone();

    let err = PipelineOrchestrator::new(config, as_of())
        .run_pipeline(&PipelineConfig::full_pipeline())
        .unwrap_err();
    match err {
        PipelineError::Schema { partition, column } => {
            assert_eq!(partition, "rust");
            assert_eq!(column, "size");
        }
        other => panic!("expected schema error, got {other}"),
    }

    assert!(!paths.merged.exists());
    assert!(!paths.cleaned.exists());
    assert!(!paths.report.exists());
    Ok(())
}

#[test]
fn test_parse_error_keeps_prior_artifacts() -> Result<()> {
    let dir = tempdir()?;
    let config = scenario_config(dir.path());
    let paths = config.paths.clone();
    PipelineOrchestrator::new(config.clone(), as_of())
        .run_pipeline(&PipelineConfig::full_pipeline())?;
    let cleaned_before = fs::read(&paths.cleaned)?;
    let featured_before = fs::read(&paths.featured)?;

    let header = RAW_SCHEMA.join(",");
    write_partition(
        dir.path(),
        "rust",
        &header,
        "k8s,Rust,last tuesday,2023-01-01T00:00:00Z,1,1,1,1,1\n",
    );

    let err = PipelineOrchestrator::new(config, as_of())
        .run_pipeline(&PipelineConfig::full_pipeline())
        .unwrap_err();
    match err {
        PipelineError::Parse { row, column, value, .. } => {
            assert_eq!(row, 2);
            assert_eq!(column, "created_at");
            assert_eq!(value, "last tuesday");
        }
        other => panic!("expected parse error, got {other}"),
    }

    assert_eq!(fs::read(&paths.cleaned)?, cleaned_before);
    assert_eq!(fs::read(&paths.featured)?, featured_before);

    // Only finished artifacts in the output directory, no leftover temp files
    let mut entries: Vec<String> = fs::read_dir(dir.path().join("processed"))?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    entries.sort();
    assert_eq!(
        entries,
        vec![
            "cleaned_github_repos.csv",
            "featured_github_repos.csv",
            "run_report.json"
        ]
    );
    Ok(())
}

#[test]
fn test_reject_policy_aborts_on_future_creation() -> Result<()> {
    let dir = tempdir()?;
    let mut config = scenario_config(dir.path());
    config.cleaning.future_timestamps = FutureTimestampPolicy::Reject;
    let paths = config.paths.clone();

    let before_rust = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
    let err = PipelineOrchestrator::new(config, before_rust)
        .run_pipeline(&PipelineConfig::full_pipeline())
        .unwrap_err();
    assert!(matches!(err, PipelineError::FutureTimestamp { .. }));
    assert!(!paths.cleaned.exists());
    Ok(())
}

#[test]
fn test_missing_predecessor_artifact() -> Result<()> {
    let dir = tempdir()?;
    let config = scenario_config(dir.path());

    let err = PipelineOrchestrator::new(config, as_of())
        .run_pipeline(&PipelineConfig::features_only())
        .unwrap_err();
    assert!(matches!(err, PipelineError::MissingInput { .. }));
    Ok(())
}
