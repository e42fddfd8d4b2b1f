mod classify;
mod config;
mod errors;
mod llm_client;
mod models;
mod taxonomy;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::classify::batch::{load_records, run_batch, write_log, BatchSummary};
use crate::classify::classifier::Classifier;
use crate::config::{Cli, Config};
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::taxonomy::TaxonomyIndex;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // load .env if present; ignore if missing
    // Pre-flight: every fatal condition is checked before the first record.
    let config = Config::from_cli(Cli::parse())?;

    // Logs go to stderr; stdout carries only the final summary.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.log_level))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting genre-mapper v{}", env!("CARGO_PKG_VERSION"));

    let index = TaxonomyIndex::load(&config.taxonomy_path).context("failed to load taxonomy")?;
    let records = load_records(&config.input_path).context("failed to load test cases")?;

    let llm = LlmClient::new(config.llm.clone()).map_err(AppError::from)?;
    info!(
        "LLM client initialized (model: {}, max retries: {})",
        llm.model(),
        config.llm.max_retries
    );

    let classifier = Classifier::new(index, Box::new(llm));
    info!(
        "Classifying {} case(s) against {} taxonomy leaves",
        records.len(),
        classifier.index().len()
    );

    let log = run_batch(&classifier, &records).await?;
    write_log(&config.output_path, &log).context("failed to write reasoning log")?;

    let summary = BatchSummary::from_log(&log);
    println!();
    println!(
        "✓ Processing complete. {} created.",
        config.output_path.display()
    );
    println!("✓ Processed {} cases", summary.total);
    println!(
        "✓ Mapped: {}, Unmapped: {}",
        summary.mapped, summary.unmapped
    );

    Ok(())
}
