use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Caller-supplied record identifier. Test case files use both numbers and strings.
///
/// Numbers keep their JSON form, so `1.5` and values past `i64` survive into
/// the case key unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// One story to classify. Every field is optional in the input file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blurb: String,
}

impl StoryRecord {
    /// Key used in the reasoning log. `position` is 1-based and only used when
    /// the record carries no id.
    pub fn case_key(&self, position: usize) -> String {
        match &self.id {
            Some(id) => format!("case_{id}"),
            None => format!("case_{position}"),
        }
    }

    /// Label for progress output: the id, or the position when absent.
    pub fn display_id(&self, position: usize) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => position.to_string(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
