#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::taxonomy::category::{CategoryPath, MappedCategory, UNMAPPED};

/// The taxonomy file as written on disk: main category → sub-genre → leaves.
///
/// Backed by `IndexMap` so the document order survives into the prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxonomyDocument(IndexMap<String, IndexMap<String, Vec<String>>>);

impl TaxonomyDocument {
    /// Iterates `(main, sub, leaf)` triples in document order.
    pub fn triples(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.0.iter().flat_map(|(main, subs)| {
            subs.iter().flat_map(move |(sub, leaves)| {
                leaves
                    .iter()
                    .map(move |leaf| (main.as_str(), sub.as_str(), leaf.as_str()))
            })
        })
    }

    pub fn main_categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Read-only, closed-world lookup over the taxonomy.
///
/// Built once before any record is classified and shared by reference for the
/// rest of the run.
#[derive(Debug, Clone)]
pub struct TaxonomyIndex {
    document: TaxonomyDocument,
    /// Pretty-printed document, serialized once for prompt construction.
    document_json: String,
    /// Valid leaves in document order.
    leaves: Vec<String>,
    paths: HashMap<String, CategoryPath>,
}

impl TaxonomyIndex {
    /// Reads and indexes a taxonomy file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        let index = Self::from_json_str(&raw)?;
        info!(
            path = %path.display(),
            leaves = index.len(),
            "taxonomy loaded"
        );
        Ok(index)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, AppError> {
        let document: TaxonomyDocument = serde_json::from_str(raw).map_err(|e| {
            AppError::Taxonomy(format!(
                "expected an object of main category -> sub-genre -> [leaf names]: {e}"
            ))
        })?;
        Self::from_document(document)
    }

    /// Flattens the document. A leaf name that appears more than once is
    /// rejected: it would make the leaf → path lookup ambiguous.
    pub fn from_document(document: TaxonomyDocument) -> Result<Self, AppError> {
        let mut leaves = Vec::new();
        let mut paths: HashMap<String, CategoryPath> = HashMap::new();

        for (main, sub, leaf) in document.triples() {
            if let Some(existing) = paths.get(leaf) {
                return Err(AppError::Taxonomy(format!(
                    "leaf '{leaf}' appears under both '{} > {}' and '{main} > {sub}'",
                    existing.main, existing.sub
                )));
            }
            paths.insert(leaf.to_string(), CategoryPath::new(main, sub, leaf));
            leaves.push(leaf.to_string());
        }

        if leaves.is_empty() {
            warn!("taxonomy has no leaf categories; every record will be unmapped");
        }
        if paths.contains_key(UNMAPPED) {
            warn!("taxonomy contains a leaf named {UNMAPPED}; it is shadowed by the sentinel");
        }

        let document_json = serde_json::to_string_pretty(&document)?;

        Ok(Self {
            document,
            document_json,
            leaves,
            paths,
        })
    }

    /// The validation gate. `candidate` is untrusted model output.
    ///
    /// The sentinel is checked before the lookup, so it wins even over a leaf
    /// with the same name. Missing, empty, or unknown candidates are unmapped.
    pub fn validate(&self, candidate: Option<&str>) -> MappedCategory {
        let Some(candidate) = candidate else {
            return MappedCategory::Unmapped;
        };
        if candidate == UNMAPPED {
            return MappedCategory::Unmapped;
        }
        match self.paths.get(candidate) {
            Some(path) => MappedCategory::Mapped(path.clone()),
            None => {
                debug!(candidate, "category not in taxonomy, treating as unmapped");
                MappedCategory::Unmapped
            }
        }
    }

    /// String form of [`validate`](Self::validate): `"main > sub > leaf"` or `"[UNMAPPED]"`.
    pub fn validate_and_format(&self, candidate: Option<&str>) -> String {
        self.validate(candidate).to_string()
    }

    pub fn contains(&self, leaf: &str) -> bool {
        self.paths.contains_key(leaf)
    }

    pub fn path_of(&self, leaf: &str) -> Option<&CategoryPath> {
        self.paths.get(leaf)
    }

    pub fn leaves(&self) -> &[String] {
        &self.leaves
    }

    pub fn document(&self) -> &TaxonomyDocument {
        &self.document
    }

    pub fn document_json(&self) -> &str {
        &self.document_json
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}
