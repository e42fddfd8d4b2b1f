use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::taxonomy::MappedCategory;

/// Reasoning recorded when the model omits one.
pub const NO_REASONING: &str = "No reasoning provided.";

/// The model's raw JSON answer. Nothing here is trusted: `mapped_category`
/// must go through the taxonomy gate before it is used.
///
/// Both fields are kept as raw JSON so a wrongly typed field never discards
/// the rest of the reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelVerdict {
    #[serde(default)]
    pub mapped_category: Option<Value>,
    #[serde(default)]
    pub reasoning: Option<Value>,
}

impl ModelVerdict {
    pub fn new(mapped_category: Option<&str>, reasoning: Option<&str>) -> Self {
        Self {
            mapped_category: mapped_category.map(Value::from),
            reasoning: reasoning.map(Value::from),
        }
    }

    /// The claimed category, if the model sent one as a string.
    pub fn claimed_category(&self) -> Option<&str> {
        self.mapped_category.as_ref().and_then(Value::as_str)
    }

    /// Reasoning as text. Strings pass through; other values are rendered as
    /// compact JSON. Null and blank text count as missing.
    pub fn reasoning_text(&self) -> Option<String> {
        let text = match self.reasoning.as_ref()? {
            Value::Null => return None,
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Validated classification of one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub mapped_category: MappedCategory,
    pub reasoning: String,
}

/// One entry of the reasoning log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub input_tags: Vec<String>,
    pub blurb: String,
    pub mapped_category: MappedCategory,
    pub reasoning: String,
}

/// `case_<id>` → entry, in input order.
pub type ReasoningLog = IndexMap<String, LogEntry>;
