use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, info_span};

use repo_insights::app::inspect_table;
use repo_insights::config::Config;
use repo_insights::constants;
use repo_insights::logging;
use repo_insights::metrics;
use repo_insights::pipeline::{PipelineConfig, PipelineExecutionResult, PipelineOrchestrator};

#[derive(Parser)]
#[command(name = "repo_insights")]
#[command(about = "Merge, clean and feature-engineer GitHub repository snapshots")]
#[command(version)]
struct Cli {
    /// Pipeline configuration file (defaults to $REPO_INSIGHTS_CONFIG, then pipeline.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fixed as-of instant (RFC 3339) for age and recency metrics
    #[arg(long, global = true)]
    as_of: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Concatenate the language partitions into the merged table
    Merge,
    /// Clean the merged table
    Clean,
    /// Engineer features from the cleaned table
    Features,
    /// Run merge, clean and features in order
    Run,
    /// Summarize any stage table: shape, nulls, duplicates, languages, numeric ranges
    Inspect {
        /// CSV table to inspect
        file: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Resolve the config file and describe where it came from, for logging once tracing is up
fn load_config(cli_path: Option<PathBuf>) -> Result<(Config, String)> {
    // An explicitly named file must exist; the default location may be absent
    if let Some(path) = cli_path {
        let config = Config::load(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        return Ok((config, path.display().to_string()));
    }
    if let Ok(path) = std::env::var(constants::CONFIG_ENV) {
        let path = PathBuf::from(path);
        let config = Config::load(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        return Ok((config, format!("{} (${})", path.display(), constants::CONFIG_ENV)));
    }
    let path = PathBuf::from(constants::DEFAULT_CONFIG_PATH);
    let source = if path.exists() {
        path.display().to_string()
    } else {
        "built-in defaults".to_string()
    };
    let config = Config::load_or_default(&path).context("failed to load default config")?;
    Ok((config, source))
}

fn print_execution(result: &PipelineExecutionResult) {
    println!("\n📊 Pipeline '{}' (run {})", result.pipeline_name, result.run_id);
    println!("   As of: {}", result.as_of.to_rfc3339());
    for step in &result.step_results {
        println!(
            "   {:<9} {:>8} in {:>8} out  {}",
            step.step,
            step.processed_count,
            step.output_count,
            step.artifact.path.display()
        );
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let (config, config_source) = load_config(cli.config)?;
    let _guard = logging::init_logging(&config.log_dir);
    info!("Using configuration from {}", config_source);

    let pipeline = match cli.command {
        Commands::Inspect { file, json } => {
            let summary = inspect_table(&file)
                .with_context(|| format!("failed to inspect {}", file.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{summary}");
            }
            return Ok(());
        }
        Commands::Merge => PipelineConfig::merge_only(),
        Commands::Clean => PipelineConfig::clean_only(),
        Commands::Features => PipelineConfig::features_only(),
        Commands::Run => PipelineConfig::full_pipeline(),
    };

    let as_of = config
        .resolve_as_of(cli.as_of.as_deref())
        .context("failed to resolve the as-of instant")?;

    let span = info_span!("repo_insights", pipeline = %pipeline.name);
    let _enter = span.enter();
    info!("Starting {} with as-of {}", pipeline.name, as_of);

    metrics::init_metrics();
    let orchestrator = PipelineOrchestrator::new(config, as_of);

    match orchestrator.run_pipeline(&pipeline) {
        Ok(result) => {
            print_execution(&result);
            Ok(())
        }
        Err(e) => {
            error!("Pipeline '{}' failed: {}", pipeline.name, e);
            Err(e).with_context(|| format!("pipeline '{}' failed", pipeline.name))
        }
    }
}
