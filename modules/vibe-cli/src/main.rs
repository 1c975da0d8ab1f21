use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vibe_pipeline::{
    load_config, Analyzer, BatchOptions, BatchScheduler, BatchStats, ContentType, LlmAnalyzer,
    PipelineConfig, PipelineRunner, RawContent, RunOptions,
};

#[derive(Parser)]
#[command(name = "vibe", about = "Analyze scraped social media content")]
#[command(version)]
struct Cli {
    /// Path to config TOML file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one variant over a single scrape result
    Run {
        /// Variant name (full, video-only, document-only, fast, or one from config)
        #[arg(long, default_value = "full")]
        variant: String,

        #[command(flatten)]
        overrides: Overrides,

        /// JSON file holding one scrape result
        file: PathBuf,
    },

    /// Run a JSON array of scrape results in throttled chunks
    Batch {
        /// Items per chunk (default from config)
        #[arg(long)]
        batch_size: Option<usize>,

        #[command(flatten)]
        overrides: Overrides,

        /// JSON file holding an array of scrape results
        file: PathBuf,
    },
}

#[derive(Args, Clone, Default)]
struct Overrides {
    /// Skip classification: video, document or mixed
    #[arg(long)]
    content_type: Option<ContentType>,

    /// Platform label for the report
    #[arg(long)]
    platform: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    init_tracing(cli.json);

    match run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vibe=info,vibe_pipeline=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<String> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    let analyzer = Arc::new(LlmAnalyzer::from_config(&config.models)?);
    info!(model = config.models.analysis.as_str(), "Analyzer ready");
    execute(cli.command, &config, analyzer).await
}

/// Run the command and return the JSON to print.
async fn execute(command: Command, config: &PipelineConfig, analyzer: Arc<dyn Analyzer>) -> Result<String> {
    let runner = PipelineRunner::new(analyzer, config)?;

    match command {
        Command::Run {
            variant,
            overrides,
            file,
        } => {
            let raw: RawContent = read_json(&file)?;
            let options = RunOptions {
                content_type: overrides.content_type,
                platform: overrides.platform,
            };
            let report = runner.run(&variant, Arc::new(raw), options).await?;
            Ok(serde_json::to_string_pretty(&report)?)
        }
        Command::Batch {
            batch_size,
            overrides,
            file,
        } => {
            let items: Vec<RawContent> = read_json(&file)?;
            let scheduler = BatchScheduler::new(Arc::new(runner), config.batch.clone());
            let options = BatchOptions {
                batch_size,
                content_type: overrides.content_type,
                platform: overrides.platform,
            };
            let results = scheduler.run_batch(items, options).await?;
            eprintln!("{}", BatchStats::from_results(&results));
            Ok(serde_json::to_string_pretty(&results)?)
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse input file: {}", path.display()))
}
