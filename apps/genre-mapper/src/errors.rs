use std::path::PathBuf;

use thiserror::Error;

use crate::llm_client::LlmError;

/// Fatal, pre-flight errors. Any of these aborts the run before (or instead of)
/// producing a reasoning log.
///
/// Per-record model failures are NOT represented here: they are `LlmError`s and
/// get converted into `[UNMAPPED]` results by the classifier.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid taxonomy: {0}")]
    Taxonomy(String),

    #[error("Invalid batch input: {0}")]
    Batch(String),

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LLM client error: {0}")]
    Llm(#[from] LlmError),
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }
}
