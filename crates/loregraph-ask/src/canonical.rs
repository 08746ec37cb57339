//! Canonical question bank: known question patterns mapped to
//! pre-vetted queries and pre-written interpretations.
//!
//! A canonical hit bypasses generation entirely, so matching must never
//! produce a false positive: a wrong canonical answer would be returned
//! with full confidence. Matching is therefore exact equality of
//! normalized forms; anything less than exact falls through to
//! generation.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use loregraph_core::LoreError;

/// One hand-authored (pattern, query, interpretation) triple.
///
/// The query is validated against the schema vocabulary at authoring
/// time (`loregraph-ask check-bank`) and never re-validated per request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalEntry {
    pub pattern: String,
    pub query: String,
    pub interpretation: String,
}

/// The fixed table of canonical questions, keyed by normalized pattern.
///
/// Loaded at startup, never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct CanonicalBank {
    entries: HashMap<String, CanonicalEntry>,
}

impl CanonicalBank {
    /// Load the bank from a JSON array of entries.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            LoreError::Config(format!("cannot read canonical bank {}: {e}", path.display()))
        })?;
        let entries: Vec<CanonicalEntry> = serde_json::from_str(&raw)
            .map_err(|e| LoreError::Config(format!("malformed canonical bank: {e}")))?;
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: Vec<CanonicalEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| (normalize_question(&e.pattern), e))
            .collect();
        Self { entries }
    }

    /// The curated Dark Souls entries shipped with the binary.
    pub fn builtin() -> Self {
        Self::from_entries(builtin_entries())
    }

    /// Exact match on the normalized question.
    ///
    /// `None` is not an error; it means "proceed to generation".
    pub fn lookup(&self, question: &str) -> Option<&CanonicalEntry> {
        self.entries.get(&normalize_question(question))
    }

    pub fn entries(&self) -> impl Iterator<Item = &CanonicalEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Case-fold, collapse whitespace, strip trailing punctuation.
pub fn normalize_question(text: &str) -> String {
    let lowered = text.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(['?', '!', '.', ',', ';', ':'])
        .trim_end()
        .to_string()
}

fn builtin_entries() -> Vec<CanonicalEntry> {
    vec![
        CanonicalEntry {
            pattern: "Which weapons are wielded by Black Knights?".to_string(),
            query: "MATCH (e1:Entity {id: 'Black Knights'})-[:wield]->(e2:Entity)\n\
                    RETURN e2.id AS source, 'wield' AS relation, e1.id AS target\n\
                    ORDER BY source"
                .to_string(),
            interpretation: "The Black Knights wield two notable weapons: the Black Knight \
                             Sword and the Heavy Black Knight Sword. Both fit their brutal, \
                             imposing combat style and fearsome reputation."
                .to_string(),
        },
        CanonicalEntry {
            pattern: "What weapons are effective against specific enemy types?".to_string(),
            query: "MATCH (w:Entity)-[:is_effective_against]->(e:Entity)\n\
                    RETURN w.id AS source, 'is_effective_against' AS relation, e.id AS target"
                .to_string(),
            interpretation: "The Blood Club is effective against most foes, pointing to its \
                             versatility in battle, while the Lightning Broadsword excels \
                             against crowds of enemies."
                .to_string(),
        },
        CanonicalEntry {
            pattern: "What skills are associated with specific weapons?".to_string(),
            query: "MATCH (s:Entity)-[:has_skill]->(k:Entity)\n\
                    RETURN s.id AS source, 'has_skill' AS relation, k.id AS target\n\
                    ORDER BY source"
                .to_string(),
            interpretation: "Two weapons carry explicit skills: the Dark Bastard Sword is \
                             tied to Stomp, and the Gargoyle Flame Hammer to Kindled Flurry. \
                             Each pairing marks a combat mechanic unique to that weapon."
                .to_string(),
        },
        CanonicalEntry {
            pattern: "What properties or affiliations do shields reveal?".to_string(),
            query: "MATCH (s:Entity)-[r]->(e:Entity)\n\
                    WHERE toLower(s.id) CONTAINS 'shield'\n\
                    RETURN s.id AS source, type(r) AS relation, e.id AS target\n\
                    ORDER BY relation"
                .to_string(),
            interpretation: "Shields reveal a wide spread of attributes. Greatshields \
                             emphasize stability and absorption, small shields excel at \
                             parrying, and several are tied to factions, figures, \
                             engravings, or rare materials."
                .to_string(),
        },
        CanonicalEntry {
            pattern: "Who are the Black Knights related to?".to_string(),
            query: "MATCH (e1:Entity {id: 'Black Knights'})-[r]->(e2:Entity)\n\
                    RETURN e1.id AS source, type(r) AS relation, e2.id AS target"
                .to_string(),
            interpretation: "The Black Knights are linked to chaos demons and to weapons \
                             like the Black Knight Sword. The relationships paint them as \
                             elite warriors shaped by fire and endless battle."
                .to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_folds_case_whitespace_punctuation() {
        assert_eq!(
            normalize_question("  Which   weapons are WIELDED by Black Knights?  "),
            "which weapons are wielded by black knights"
        );
        assert_eq!(normalize_question("Hello!!!"), "hello");
        assert_eq!(normalize_question("already normal"), "already normal");
    }

    #[test]
    fn lookup_matches_exactly_after_normalization() {
        let bank = CanonicalBank::builtin();

        let entry = bank
            .lookup("which weapons are WIELDED by black knights")
            .expect("case and punctuation variants must match");
        assert!(entry.query.contains(":wield"));

        let entry = bank
            .lookup("  Who are the   Black Knights related to? ")
            .expect("whitespace variants must match");
        assert!(entry.interpretation.contains("chaos demons"));
    }

    #[test]
    fn lookup_rejects_near_misses() {
        let bank = CanonicalBank::builtin();

        // One word off: no fuzzy matching, ever.
        assert!(bank
            .lookup("Which weapons are carried by Black Knights?")
            .is_none());
        assert!(bank.lookup("Which weapons are wielded by Knights?").is_none());
        assert!(bank.lookup("").is_none());
    }

    #[test]
    fn builtin_has_five_entries() {
        let bank = CanonicalBank::builtin();
        assert_eq!(bank.len(), 5);
        assert!(!bank.is_empty());
    }

    #[test]
    fn loads_entries_from_json() {
        let entries: Vec<CanonicalEntry> = serde_json::from_str(
            r#"[{
                "pattern": "Who wields the Zweihander?",
                "query": "MATCH (a:Entity)-[:wield]->(b:Entity {id: 'Zweihander'}) RETURN a.id AS source",
                "interpretation": "The Zweihander is wielded by giants."
            }]"#,
        )
        .unwrap();
        let bank = CanonicalBank::from_entries(entries);
        assert_eq!(bank.len(), 1);
        assert!(bank.lookup("who wields the zweihander").is_some());
    }
}
