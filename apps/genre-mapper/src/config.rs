use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::errors::AppError;
use crate::llm_client::{LlmSettings, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, GROQ_API_URL};

/// Environment variable read when `--api-key` is not given.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Command-line arguments. Most flags also read an environment variable, and
/// a `.env` file is loaded before parsing.
#[derive(Parser, Debug, Clone)]
#[command(name = "genre-mapper")]
#[command(about = "Map story tags and blurbs onto a closed fiction taxonomy")]
#[command(version)]
pub struct Cli {
    /// Taxonomy file: main category -> sub-genre -> [leaf categories]
    #[arg(long, env = "TAXONOMY_PATH", default_value = "taxonomy.json")]
    pub taxonomy: PathBuf,

    /// Batch file: JSON array of {id, tags, blurb}
    #[arg(short, long, env = "TEST_CASES_PATH", default_value = "test_cases.json")]
    pub input: PathBuf,

    /// Where to write the reasoning log
    #[arg(short, long, env = "REASONING_LOG_PATH", default_value = "reasoning_log.json")]
    pub output: PathBuf,

    /// Model identifier sent with every request
    #[arg(long, env = "GROQ_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Chat completions endpoint
    #[arg(long, env = "GROQ_API_URL", default_value = GROQ_API_URL)]
    pub api_url: String,

    /// API key (falls back to GROQ_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Extra attempts per record on 429/5xx/transport errors
    #[arg(long, env = "MAX_RETRIES", default_value_t = 0)]
    pub max_retries: u32,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Log level for this crate when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Resolved, immutable run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub taxonomy_path: PathBuf,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub llm: LlmSettings,
    pub log_level: String,
}

impl Config {
    /// Fails if no API key can be found; nothing has been processed yet at
    /// that point.
    pub fn from_cli(cli: Cli) -> Result<Self, AppError> {
        let api_key = resolve_api_key(cli.api_key)?;

        if cli.timeout_secs == 0 {
            return Err(AppError::Config(
                "--timeout-secs must be greater than zero".to_string(),
            ));
        }

        Ok(Config {
            taxonomy_path: cli.taxonomy,
            input_path: cli.input,
            output_path: cli.output,
            llm: LlmSettings {
                api_url: cli.api_url,
                model: cli.model,
                max_retries: cli.max_retries,
                timeout: Duration::from_secs(cli.timeout_secs),
                ..LlmSettings::new(api_key)
            },
            log_level: cli.log_level,
        })
    }
}

/// Explicit key first, then the environment. Blank values count as missing.
fn resolve_api_key(explicit: Option<String>) -> Result<String, AppError> {
    explicit
        .filter(|k| !k.trim().is_empty())
        .or_else(|| {
            std::env::var(API_KEY_ENV)
                .ok()
                .filter(|k| !k.trim().is_empty())
        })
        .ok_or_else(|| {
            AppError::Config(format!(
                "API key not found. Pass --api-key or set the {API_KEY_ENV} environment variable."
            ))
        })
}
