//! dfscan - image authenticity scanner
//!
//! Runs every image through the assessment pipeline and prints one JSON
//! document per image on stdout. Logs go to stderr (or the configured file).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dfscan_core::config::{CLASSIFIER_ENDPOINT_ENV_VAR, LOG_LEVEL_ENV_VAR};
use dfscan_core::summary::summarize_with_fallback;
use dfscan_core::{DfscanConfig, Pipeline};
use serde_json::json;
use tracing::info;

/// Output document per image
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Full analysis report
    Json,
    /// Report plus rule-based summary
    Summary,
}

/// Command-line arguments for dfscan
#[derive(Parser, Debug)]
#[command(name = "dfscan")]
#[command(about = "Multi-signal deepfake and image authenticity scanner")]
#[command(version)]
struct Args {
    /// Images to analyze (PNG or JPEG)
    #[arg(required_unless_present = "print_config")]
    images: Vec<PathBuf>,

    /// Config file (overrides DFSCAN_CONFIG and the per-user config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Classifier inference endpoint
    #[arg(long, env = CLASSIFIER_ENDPOINT_ENV_VAR)]
    classifier_endpoint: Option<String>,

    /// Log level or filter directive
    #[arg(long, env = LOG_LEVEL_ENV_VAR)]
    log_level: Option<String>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = DfscanConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(endpoint) = args.classifier_endpoint.filter(|e| !e.trim().is_empty()) {
        config.classifier.endpoint = Some(endpoint);
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    if args.print_config {
        let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
        print!("{}", rendered);
        return Ok(());
    }

    dfscan_common::logging::init_tracing(&config.logging).context("Failed to initialize logging")?;

    info!("Starting dfscan {}", env!("CARGO_PKG_VERSION"));

    let pipeline = Pipeline::from_config(&config);
    if pipeline.orchestrator().has_classifier() {
        info!("Classifier enabled");
    } else {
        info!("No classifier configured, running heuristics only");
    }

    for path in &args.images {
        let report = pipeline.analyze_path(path).await;

        let document = match args.format {
            OutputFormat::Json => serde_json::to_value(&report)?,
            OutputFormat::Summary => {
                let summary = summarize_with_fallback(None, &report).await;
                json!({ "report": report, "summary": summary })
            }
        };

        println!(
            "{}",
            serde_json::to_string_pretty(&document).context("Failed to serialize report")?
        );
    }

    Ok(())
}
