//! Batch driver — classifies a file of story records, strictly in input order.

use std::collections::HashSet;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::classify::classifier::Classifier;
use crate::errors::AppError;
use crate::models::classification::{LogEntry, ReasoningLog};
use crate::models::story::StoryRecord;

/// Counts reported after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub mapped: usize,
    pub unmapped: usize,
}

impl BatchSummary {
    pub fn from_log(log: &ReasoningLog) -> Self {
        let mapped = log
            .values()
            .filter(|e| e.mapped_category.is_mapped())
            .count();
        Self {
            total: log.len(),
            mapped,
            unmapped: log.len() - mapped,
        }
    }
}

/// Reads the batch file: a JSON array of story records.
pub fn load_records(path: &Path) -> Result<Vec<StoryRecord>, AppError> {
    let raw = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
    let records: Vec<StoryRecord> = serde_json::from_str(&raw).map_err(|e| {
        AppError::Batch(format!(
            "{}: expected a JSON array of {{id, tags, blurb}} objects: {e}",
            path.display()
        ))
    })?;
    info!(path = %path.display(), count = records.len(), "batch loaded");
    Ok(records)
}

/// Log keys for every record, in order. Two records resolving to the same key
/// would collapse into one log entry, so that is rejected up front.
pub fn case_keys(records: &[StoryRecord]) -> Result<Vec<String>, AppError> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut keys = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let key = record.case_key(i + 1);
        if !seen.insert(key.clone()) {
            return Err(AppError::Batch(format!(
                "duplicate case key '{key}' (record {} of {})",
                i + 1,
                records.len()
            )));
        }
        keys.push(key);
    }
    Ok(keys)
}

/// Classifies every record, one at a time, and returns the reasoning log.
///
/// Only pre-flight problems (duplicate keys) return an error. Per-record model
/// failures are already folded into `[UNMAPPED]` entries by the classifier.
pub async fn run_batch(
    classifier: &Classifier,
    records: &[StoryRecord],
) -> Result<ReasoningLog, AppError> {
    let keys = case_keys(records)?;
    let total = records.len();
    let mut log = ReasoningLog::with_capacity(total);

    for (i, (record, key)) in records.iter().zip(keys).enumerate() {
        info!("Processing case {}/{}", record.display_id(i + 1), total);

        let result = classifier.classify(&record.tags, &record.blurb).await;

        info!(case = %key, mapped_category = %result.mapped_category, "case classified");

        log.insert(
            key,
            LogEntry {
                input_tags: record.tags.clone(),
                blurb: record.blurb.clone(),
                mapped_category: result.mapped_category,
                reasoning: result.reasoning,
            },
        );
    }

    Ok(log)
}

/// Writes the log as 4-space-indented JSON. The file is written to a temp file
/// in the same directory and renamed into place, so a failed run never leaves
/// a truncated log behind.
pub fn write_log(path: &Path, log: &ReasoningLog) -> Result<(), AppError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| AppError::io(dir, e))?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        log.serialize(&mut serializer)?;
        writer.write_all(b"\n").map_err(|e| AppError::io(path, e))?;
        writer.flush().map_err(|e| AppError::io(path, e))?;
    }

    tmp.persist(path).map_err(|e| AppError::io(path, e.error))?;
    info!(path = %path.display(), entries = log.len(), "reasoning log written");
    Ok(())
}
