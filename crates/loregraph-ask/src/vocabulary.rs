//! Schema vocabulary: the valid relationship types and node label.
//!
//! Loaded once at process start and read-only for the lifetime of the
//! service; concurrent reads need no synchronization because nothing
//! ever mutates it post-load.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use loregraph_core::LoreError;

/// The relationship types and node label the graph schema actually
/// contains. Generated queries are validated against this set before
/// anything reaches the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaVocabulary {
    pub relationship_types: BTreeSet<String>,
    pub node_label: String,
}

impl SchemaVocabulary {
    /// Load the vocabulary from a JSON file.
    ///
    /// Fails with `LoreError::Config` if the file is unreadable,
    /// malformed, or names no relationship types.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            LoreError::Config(format!("cannot read vocabulary {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    /// Parse the vocabulary from JSON text.
    pub fn from_json(raw: &str) -> Result<Self, LoreError> {
        let vocabulary: SchemaVocabulary = serde_json::from_str(raw)
            .map_err(|e| LoreError::Config(format!("malformed vocabulary: {e}")))?;
        vocabulary.check()?;
        Ok(vocabulary)
    }

    /// The curated Dark Souls lore vocabulary shipped with the binary.
    pub fn builtin() -> Self {
        let relationship_types = [
            "belongs_to",
            "created_by",
            "dropped_by",
            "engraved_with",
            "found_in",
            "grants",
            "has_skill",
            "is_effective_against",
            "made_of",
            "protects_against",
            "used_by",
            "wield",
            "worn_by",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        Self {
            relationship_types,
            node_label: "Entity".to_string(),
        }
    }

    fn check(&self) -> Result<(), LoreError> {
        if self.relationship_types.is_empty() {
            return Err(LoreError::Config(
                "vocabulary names no relationship types".to_string(),
            ));
        }
        if self.node_label.trim().is_empty() {
            return Err(LoreError::Config("vocabulary names no node label".to_string()));
        }
        Ok(())
    }

    /// Exact membership test for a relationship-type or label token.
    pub fn contains(&self, token: &str) -> bool {
        token == self.node_label || self.relationship_types.contains(token)
    }
}
