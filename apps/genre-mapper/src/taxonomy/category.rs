use std::fmt;

use serde::{Serialize, Serializer};

/// Reserved value meaning "no valid leaf applies". Used both as a legitimate
/// model answer and as the fallback for anything the gate rejects.
pub const UNMAPPED: &str = "[UNMAPPED]";

/// Full hierarchical position of a leaf: main category, sub-genre, leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryPath {
    pub main: String,
    pub sub: String,
    pub leaf: String,
}

impl CategoryPath {
    pub fn new(main: impl Into<String>, sub: impl Into<String>, leaf: impl Into<String>) -> Self {
        Self {
            main: main.into(),
            sub: sub.into(),
            leaf: leaf.into(),
        }
    }
}

impl fmt::Display for CategoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} > {} > {}", self.main, self.sub, self.leaf)
    }
}

/// Outcome of the validation gate.
///
/// Only `TaxonomyIndex::validate` builds a `Mapped` value from model output, so
/// a raw model string can never end up in the reasoning log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappedCategory {
    Mapped(CategoryPath),
    Unmapped,
}

impl MappedCategory {
    pub fn is_mapped(&self) -> bool {
        matches!(self, MappedCategory::Mapped(_))
    }
}

impl fmt::Display for MappedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappedCategory::Mapped(path) => path.fmt(f),
            MappedCategory::Unmapped => f.write_str(UNMAPPED),
        }
    }
}

impl Serialize for MappedCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
