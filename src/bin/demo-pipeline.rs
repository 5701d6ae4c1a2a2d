/// Demo: run merge -> clean -> features over two tiny partitions in a scratch directory
use anyhow::{Context, Result};
use std::fs;

use repo_insights::config::{Config, PartitionSpec};
use repo_insights::constants::{partition_file_name, RAW_SCHEMA};
use repo_insights::logging;
use repo_insights::metrics;
use repo_insights::pipeline::{PipelineConfig, PipelineOrchestrator};

const GO_ROWS: &str = "k8s,Go,2014-06-06T00:00:00Z,2024-01-01T00:00:00Z,100000,38000,500,100000,900000\n";
const RUST_ROWS: &str = "k8s,Rust,2020-01-01T00:00:00Z,2023-01-01T00:00:00Z,,,5,10,\n";

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let scratch = tempfile::tempdir().context("failed to create scratch directory")?;
    let root = scratch.path();
    let _guard = logging::init_logging(&root.join("logs"));
    metrics::init_metrics();

    let header = RAW_SCHEMA.join(",");
    let mut config = Config::default();
    config.partitions.clear();
    for (language, rows) in [("go", GO_ROWS), ("rust", RUST_ROWS)] {
        let path = root.join(partition_file_name(language));
        fs::write(&path, format!("{header}\n{rows}"))
            .with_context(|| format!("failed to write {}", path.display()))?;
        config.partitions.push(PartitionSpec {
            language: language.to_string(),
            path,
        });
    }
    config.paths.merged = root.join("raw").join("all_github_repos.csv");
    config.paths.cleaned = root.join("processed").join("cleaned_github_repos.csv");
    config.paths.featured = root.join("processed").join("featured_github_repos.csv");
    config.paths.report = root.join("processed").join("run_report.json");
    config.metrics.textfile = Some(root.join("processed").join("pipeline.prom"));

    let as_of = config.resolve_as_of(Some("2025-01-01T00:00:00Z"))?;
    let featured_path = config.paths.featured.clone();
    let report_path = config.paths.report.clone();

    let orchestrator = PipelineOrchestrator::new(config, as_of);
    let result = orchestrator.run_pipeline(&PipelineConfig::full_pipeline())?;

    println!("🎬 Demo run {} as of {}", result.run_id, as_of.to_rfc3339());
    for step in &result.step_results {
        println!("   ✅ {}: {}", step.step, step.message);
    }

    println!("\n📄 {}", featured_path.display());
    print!("{}", fs::read_to_string(&featured_path)?);
    println!("\n🧾 {}", report_path.display());
    println!("{}", fs::read_to_string(&report_path)?);

    Ok(())
}
