//! Local, deterministic validation of query candidates.
//!
//! Pure lexical analysis with no I/O and no side effects, so the repair
//! loop can call it repeatedly. Two checks: every relationship-type and label
//! token must exist in the schema vocabulary, and every variable
//! referenced in a projection clause (RETURN / ORDER BY) must have a
//! binding occurrence in a pattern.

use std::collections::BTreeSet;

use loregraph_core::{QueryCandidate, ValidationReport};

use crate::vocabulary::SchemaVocabulary;

/// Validate a candidate against the schema vocabulary.
pub fn validate(candidate: &QueryCandidate, vocabulary: &SchemaVocabulary) -> ValidationReport {
    let scan = scan_query(&candidate.text);
    let mut report = ValidationReport::default();

    for token in scan.relationship_types {
        if !vocabulary.relationship_types.contains(&token) {
            report.unknown_tokens.insert(token);
        }
    }
    for label in scan.labels {
        if label != vocabulary.node_label {
            report.unknown_tokens.insert(label);
        }
    }
    for var in scan.projection_refs {
        if !scan.bindings.contains(&var) {
            report.unbound_variables.insert(var);
        }
    }

    report
}

// ── Lexical structure ────────────────────────────────────────────

/// Everything the validator and repairer need to know about a query's
/// lexical structure.
pub(crate) struct QueryScan {
    /// Type tokens from bracketed edge patterns, in order of appearance.
    pub relationship_types: Vec<String>,
    /// Label tokens from node patterns.
    pub labels: Vec<String>,
    /// Names bound by patterns or `AS` aliases.
    pub bindings: BTreeSet<String>,
    /// Identifiers referenced in RETURN / ORDER BY.
    pub projection_refs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Sym(char),
}

/// Replace string-literal contents with spaces, preserving the character
/// count and the quote characters themselves. Escape sequences inside a
/// literal are masked too.
pub(crate) fn mask_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    let mut quote: Option<char> = None;
    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == '\\' {
                    out.push(' ');
                    if chars.next().is_some() {
                        out.push(' ');
                    }
                } else if c == q {
                    quote = None;
                    out.push(q);
                } else {
                    out.push(' ');
                }
            }
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }
    out
}

fn lex(masked: &str) -> Vec<Tok> {
    let mut toks = Vec::new();
    let mut chars = masked.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_alphabetic() || c == '_' {
            let mut word = String::new();
            while let Some(&c2) = chars.peek() {
                if c2.is_ascii_alphanumeric() || c2 == '_' {
                    word.push(c2);
                    chars.next();
                } else {
                    break;
                }
            }
            toks.push(Tok::Ident(word));
        } else if c == '`' {
            chars.next();
            let mut word = String::new();
            for c2 in chars.by_ref() {
                if c2 == '`' {
                    break;
                }
                word.push(c2);
            }
            toks.push(Tok::Ident(word));
        } else if c.is_ascii_digit() {
            // Numeric literals (including range bounds) carry no names.
            while let Some(&c2) = chars.peek() {
                if c2.is_ascii_digit() || c2 == '.' {
                    chars.next();
                } else {
                    break;
                }
            }
        } else {
            toks.push(Tok::Sym(c));
            chars.next();
        }
    }
    toks
}

fn is_keyword(word: &str) -> bool {
    matches!(
        word.to_ascii_uppercase().as_str(),
        "MATCH"
            | "OPTIONAL"
            | "WHERE"
            | "RETURN"
            | "WITH"
            | "ORDER"
            | "BY"
            | "ASC"
            | "DESC"
            | "LIMIT"
            | "SKIP"
            | "AS"
            | "DISTINCT"
            | "AND"
            | "OR"
            | "NOT"
            | "XOR"
            | "IN"
            | "CONTAINS"
            | "STARTS"
            | "ENDS"
            | "IS"
            | "NULL"
            | "TRUE"
            | "FALSE"
            | "UNWIND"
            | "MERGE"
            | "CREATE"
            | "DELETE"
            | "DETACH"
            | "SET"
            | "REMOVE"
            | "EXISTS"
            | "UNION"
            | "ALL"
    )
}

/// Scan a query's lexical structure: relationship types, labels,
/// bindings, and projection references.
pub(crate) fn scan_query(text: &str) -> QueryScan {
    let masked = mask_strings(text);
    let toks = lex(&masked);
    let mut scan = QueryScan {
        relationship_types: Vec::new(),
        labels: Vec::new(),
        bindings: BTreeSet::new(),
        projection_refs: Vec::new(),
    };

    let mut in_projection = false;
    let mut i = 0;
    while i < toks.len() {
        match &toks[i] {
            Tok::Ident(word) => {
                match word.to_ascii_uppercase().as_str() {
                    "RETURN" => {
                        in_projection = true;
                        i += 1;
                    }
                    // ORDER BY extends the projection; LIMIT/SKIP end it.
                    "ORDER" | "BY" => {
                        i += 1;
                    }
                    "LIMIT" | "SKIP" | "MATCH" | "WHERE" | "WITH" | "UNWIND" => {
                        in_projection = false;
                        i += 1;
                    }
                    "AS" => {
                        // An alias becomes a referencable name downstream.
                        if let Some(Tok::Ident(alias)) = toks.get(i + 1) {
                            if !is_keyword(alias) {
                                scan.bindings.insert(alias.clone());
                            }
                            i += 2;
                        } else {
                            i += 1;
                        }
                    }
                    _ => {
                        if in_projection && !is_keyword(word) {
                            let after_dot = i > 0 && toks[i - 1] == Tok::Sym('.');
                            let is_call = toks.get(i + 1) == Some(&Tok::Sym('('));
                            if !after_dot && !is_call {
                                scan.projection_refs.push(word.clone());
                            }
                        }
                        i += 1;
                    }
                }
            }
            Tok::Sym('(') => {
                // A paren after a non-keyword identifier is a function
                // call, not a node pattern.
                let is_call = i > 0 && matches!(&toks[i - 1], Tok::Ident(w) if !is_keyword(w));
                i += 1;
                if is_call {
                    continue;
                }
                if let Some(Tok::Ident(var)) = toks.get(i) {
                    let binds = matches!(
                        toks.get(i + 1),
                        Some(Tok::Sym(':')) | Some(Tok::Sym(')')) | Some(Tok::Sym('{'))
                    );
                    if binds && !is_keyword(var) {
                        scan.bindings.insert(var.clone());
                        i += 1;
                    } else {
                        // Parenthesized expression, not a node pattern.
                        continue;
                    }
                }
                while toks.get(i) == Some(&Tok::Sym(':')) {
                    if let Some(Tok::Ident(label)) = toks.get(i + 1) {
                        scan.labels.push(label.clone());
                        i += 2;
                    } else {
                        break;
                    }
                }
            }
            Tok::Sym('[') => {
                i += 1;
                if let Some(Tok::Ident(var)) = toks.get(i) {
                    let binds = matches!(
                        toks.get(i + 1),
                        Some(Tok::Sym(':')) | Some(Tok::Sym(']')) | Some(Tok::Sym('*'))
                    );
                    if binds && !is_keyword(var) {
                        scan.bindings.insert(var.clone());
                        i += 1;
                    }
                }
                while toks.get(i) == Some(&Tok::Sym(':')) || toks.get(i) == Some(&Tok::Sym('|')) {
                    if let Some(Tok::Ident(token)) = toks.get(i + 1) {
                        scan.relationship_types.push(token.clone());
                        i += 2;
                    } else {
                        break;
                    }
                }
                while i < toks.len() && toks[i] != Tok::Sym(']') {
                    i += 1;
                }
            }
            _ => {
                i += 1;
            }
        }
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::CanonicalBank;

    fn vocab() -> SchemaVocabulary {
        SchemaVocabulary::builtin()
    }

    fn candidate(text: &str) -> QueryCandidate {
        QueryCandidate::generated(text)
    }

    #[test]
    fn valid_query_passes() {
        let report = validate(
            &candidate(
                "MATCH (a:Entity {id: 'Black Knights'})-[:wield]->(b:Entity)\n\
                 RETURN b.id AS source, a.id AS target ORDER BY source",
            ),
            &vocab(),
        );
        assert!(report.is_valid(), "unexpected report: {report:?}");
    }

    #[test]
    fn unknown_relationship_token_is_flagged() {
        let report = validate(
            &candidate("MATCH (a:Entity)-[:wielded_by]->(b:Entity) RETURN b.id"),
            &vocab(),
        );
        assert!(!report.is_valid());
        assert!(report.unknown_tokens.contains("wielded_by"));
        assert!(report.unbound_variables.is_empty());
    }

    #[test]
    fn unknown_label_is_flagged() {
        let report = validate(
            &candidate("MATCH (a:Monster)-[:wield]->(b:Entity) RETURN b.id"),
            &vocab(),
        );
        assert!(report.unknown_tokens.contains("Monster"));
    }

    #[test]
    fn backticked_and_alternated_types() {
        let report = validate(
            &candidate("MATCH (a:Entity)-[:`wield`|belongs_to]->(b:Entity) RETURN b.id"),
            &vocab(),
        );
        assert!(report.is_valid());

        let report = validate(
            &candidate("MATCH (a:Entity)-[:wield|`forged_from`]->(b:Entity) RETURN b.id"),
            &vocab(),
        );
        assert!(report.unknown_tokens.contains("forged_from"));
    }

    #[test]
    fn unbound_projection_variable_is_flagged() {
        let report = validate(
            &candidate("MATCH (a:Entity)-[]->(b:Entity) RETURN a.id, type(r)"),
            &vocab(),
        );
        assert!(!report.is_valid());
        assert!(report.unbound_variables.contains("r"));
        assert!(report.unknown_tokens.is_empty());
    }

    #[test]
    fn bound_relationship_variable_passes() {
        let report = validate(
            &candidate("MATCH (a:Entity)-[r]->(b:Entity) RETURN a.id, type(r), b.id"),
            &vocab(),
        );
        assert!(report.is_valid());
    }

    #[test]
    fn aliases_are_referencable_in_order_by() {
        let report = validate(
            &candidate(
                "MATCH (s:Entity)-[r]->(e:Entity)\n\
                 WHERE toLower(s.id) CONTAINS 'shield'\n\
                 RETURN s.id AS source, type(r) AS relation, e.id AS target\n\
                 ORDER BY relation",
            ),
            &vocab(),
        );
        assert!(report.is_valid(), "unexpected report: {report:?}");
    }

    #[test]
    fn string_literals_are_ignored() {
        // The literal contains a bogus token and bracket noise; neither
        // may leak into the scan.
        let report = validate(
            &candidate(
                "MATCH (a:Entity {id: 'wielded_by [x:bogus]'})-[:wield]->(b:Entity) RETURN b.id",
            ),
            &vocab(),
        );
        assert!(report.is_valid(), "unexpected report: {report:?}");
    }

    #[test]
    fn variable_length_edges_carry_no_bindings() {
        let report = validate(
            &candidate("MATCH (a:Entity)-[*1..2]->(b:Entity) RETURN b.id"),
            &vocab(),
        );
        assert!(report.is_valid());

        let report = validate(
            &candidate("MATCH (a:Entity)-[r:wield*1..2]->(b:Entity) RETURN type(r)"),
            &vocab(),
        );
        assert!(report.is_valid());
    }

    #[test]
    fn validation_is_deterministic() {
        let c = candidate("MATCH (a:Entity)-[:wielded_by]->(b:Entity) RETURN type(q)");
        let first = validate(&c, &vocab());
        let second = validate(&c, &vocab());
        assert_eq!(first, second);
    }

    #[test]
    fn builtin_canonical_queries_validate_against_builtin_vocabulary() {
        let vocabulary = vocab();
        for entry in CanonicalBank::builtin().entries() {
            let report = validate(&QueryCandidate::canonical(entry.query.clone()), &vocabulary);
            assert!(
                report.is_valid(),
                "canonical entry {:?} failed validation: {report:?}",
                entry.pattern
            );
        }
    }
}
