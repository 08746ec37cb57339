//! Bounded, deterministic repair of invalid query candidates.
//!
//! Repair never guesses: a token with zero or more than one plausible
//! vocabulary match declines the whole repair rather than invent a
//! relationship that was never in the graph. Rules, in order:
//!
//! 1. case-insensitive exact match against the vocabulary;
//! 2. stem-key match (underscore split, plural/tense suffix strip,
//!    trailing filler segment drop) when exactly one term matches;
//! 3. a variable referenced only inside a `type(...)` accessor is bound
//!    at the nearest preceding unbound relationship bracket.

use loregraph_core::{QueryCandidate, ValidationReport};

use crate::validate::mask_strings;
use crate::vocabulary::SchemaVocabulary;

/// Attempt to repair a candidate that failed validation.
///
/// Returns `None` when any problem has no unique deterministic fix.
/// Idempotent: an already-valid candidate comes back unchanged, so
/// re-running repair after a successful pass is a no-op.
pub fn repair(
    candidate: &QueryCandidate,
    validation: &ValidationReport,
    vocabulary: &SchemaVocabulary,
) -> Option<QueryCandidate> {
    if validation.is_valid() {
        return Some(candidate.clone());
    }

    let mut text = candidate.text.clone();

    for token in &validation.unknown_tokens {
        let replacement = match_token(token, vocabulary)?;
        text = substitute_token(&text, token, &replacement);
    }

    for var in &validation.unbound_variables {
        text = bind_type_accessor_variable(&text, var)?;
    }

    Some(QueryCandidate {
        text,
        origin: candidate.origin,
        repair_attempts: candidate.repair_attempts + 1,
    })
}

// ── Token matching ───────────────────────────────────────────────

/// Find the unique vocabulary term a token should be rewritten to.
fn match_token(token: &str, vocabulary: &SchemaVocabulary) -> Option<String> {
    let terms: Vec<&str> = vocabulary
        .relationship_types
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(vocabulary.node_label.as_str()))
        .collect();

    // Rule 1: case-insensitive exact match.
    let lowered = token.to_lowercase();
    let case_matches: Vec<&str> = terms
        .iter()
        .copied()
        .filter(|t| t.to_lowercase() == lowered)
        .collect();
    match case_matches.len() {
        1 => return Some(case_matches[0].to_string()),
        0 => {}
        _ => return None,
    }

    // Rule 2: stem-key match; must be unique.
    let key = stem_key(token);
    let stem_matches: Vec<&str> = terms
        .iter()
        .copied()
        .filter(|t| stem_key(t) == key)
        .collect();
    match stem_matches.len() {
        1 => Some(stem_matches[0].to_string()),
        _ => None,
    }
}

/// Reduce a token to a comparison key: lowercase, split on underscores,
/// strip plural/tense suffixes per segment, then drop trailing filler
/// segments ("wielded_by" and "wield" both reduce to "wield").
pub(crate) fn stem_key(token: &str) -> String {
    const FILLERS: &[&str] = &["by", "of", "to", "with", "for", "from", "in", "at"];

    let mut segments: Vec<String> = token
        .to_lowercase()
        .split('_')
        .filter(|s| !s.is_empty())
        .map(strip_suffix_stem)
        .collect();

    while segments.len() > 1 {
        match segments.last() {
            Some(last) if FILLERS.contains(&last.as_str()) => {
                segments.pop();
            }
            _ => break,
        }
    }

    segments.join("_")
}

fn strip_suffix_stem(segment: &str) -> String {
    for suffix in ["ing", "ed", "es", "s"] {
        if let Some(stripped) = segment.strip_suffix(suffix) {
            if stripped.len() >= 3 {
                return stripped.to_string();
            }
        }
    }
    segment.to_string()
}

// ── Textual substitution ─────────────────────────────────────────

/// Replace `:old` (and `` :`old` ``) with `:new`, respecting identifier
/// boundaries and leaving string-literal contents untouched.
fn substitute_token(text: &str, old: &str, new: &str) -> String {
    let backticked = format!(":`{old}`");
    let bare = format!(":{old}");

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut quote: Option<char> = None;

    while let Some(ch) = rest.chars().next() {
        if let Some(q) = quote {
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
            if ch == '\\' {
                if let Some(escaped) = rest.chars().next() {
                    out.push(escaped);
                    rest = &rest[escaped.len_utf8()..];
                }
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        if ch == '\'' || ch == '"' {
            quote = Some(ch);
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
            continue;
        }
        if let Some(stripped) = rest.strip_prefix(&backticked) {
            out.push(':');
            out.push_str(new);
            rest = stripped;
            continue;
        }
        if let Some(stripped) = rest.strip_prefix(&bare) {
            let boundary_ok = stripped
                .chars()
                .next()
                .map_or(true, |c| !c.is_ascii_alphanumeric() && c != '_');
            if boundary_ok {
                out.push(':');
                out.push_str(new);
                rest = stripped;
                continue;
            }
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    out
}

// ── Variable rebinding ───────────────────────────────────────────

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Bind an unbound variable at the nearest preceding unbound
/// relationship bracket, provided the variable is referenced only inside
/// `type(...)` accessors. Returns `None` when the rewrite is not safely
/// possible.
fn bind_type_accessor_variable(text: &str, var: &str) -> Option<String> {
    let masked = mask_strings(text);
    if !only_in_type_accessor(&masked, var) {
        return None;
    }

    let char_idx = find_unbound_bracket(&masked)?;
    let byte = text.char_indices().nth(char_idx).map(|(b, _)| b)?;

    let mut out = String::with_capacity(text.len() + var.len());
    out.push_str(&text[..=byte]);
    out.push_str(var);
    out.push_str(&text[byte + 1..]);
    Some(out)
}

/// Every occurrence of `var` must sit directly inside a `type(...)` call.
fn only_in_type_accessor(masked: &str, var: &str) -> bool {
    let chars: Vec<char> = masked.chars().collect();
    let mut i = 0;
    let mut found_any = false;

    while i < chars.len() {
        if is_ident_char(chars[i]) {
            let start = i;
            while i < chars.len() && is_ident_char(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if word == var {
                found_any = true;
                if !occurrence_is_type_accessor(&chars, start, i) {
                    return false;
                }
            }
        } else {
            i += 1;
        }
    }

    found_any
}

fn occurrence_is_type_accessor(chars: &[char], start: usize, end: usize) -> bool {
    // Backward: skip whitespace, expect '(', then the identifier `type`.
    let mut j = start;
    while j > 0 && chars[j - 1].is_whitespace() {
        j -= 1;
    }
    if j == 0 || chars[j - 1] != '(' {
        return false;
    }
    j -= 1;
    while j > 0 && chars[j - 1].is_whitespace() {
        j -= 1;
    }
    let mut k = j;
    while k > 0 && is_ident_char(chars[k - 1]) {
        k -= 1;
    }
    let func: String = chars[k..j].iter().collect();
    if !func.eq_ignore_ascii_case("type") {
        return false;
    }

    // Forward: skip whitespace, expect ')'.
    let mut f = end;
    while f < chars.len() && chars[f].is_whitespace() {
        f += 1;
    }
    f < chars.len() && chars[f] == ')'
}

/// Char index of the last relationship bracket before RETURN that binds
/// no variable (`[]`, `[:type]`, `[*..]`).
fn find_unbound_bracket(masked: &str) -> Option<usize> {
    let chars: Vec<char> = masked.chars().collect();
    let return_pos = find_keyword_pos(&chars, "RETURN").unwrap_or(chars.len());

    let mut best = None;
    for i in 0..return_pos {
        if chars[i] != '[' {
            continue;
        }
        let mut j = i + 1;
        while j < chars.len() && chars[j].is_whitespace() {
            j += 1;
        }
        if j < chars.len() && matches!(chars[j], ':' | ']' | '*') {
            best = Some(i);
        }
    }
    best
}

/// Position of a standalone keyword, case-insensitive.
fn find_keyword_pos(chars: &[char], word: &str) -> Option<usize> {
    let target: Vec<char> = word.chars().collect();
    let n = target.len();
    if n == 0 || chars.len() < n {
        return None;
    }

    for i in 0..=(chars.len() - n) {
        let matches_word = chars[i..i + n]
            .iter()
            .zip(&target)
            .all(|(a, b)| a.eq_ignore_ascii_case(b));
        if !matches_word {
            continue;
        }
        let before_ok = i == 0 || !is_ident_char(chars[i - 1]);
        let after_ok = i + n == chars.len() || !is_ident_char(chars[i + n]);
        if before_ok && after_ok {
            return Some(i);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;
    use loregraph_core::CandidateOrigin;
    use std::collections::BTreeSet;

    fn vocab() -> SchemaVocabulary {
        SchemaVocabulary::builtin()
    }

    fn custom_vocab(types: &[&str]) -> SchemaVocabulary {
        SchemaVocabulary {
            relationship_types: types.iter().map(|s| s.to_string()).collect(),
            node_label: "Entity".to_string(),
        }
    }

    fn run_repair(query: &str, vocabulary: &SchemaVocabulary) -> Option<QueryCandidate> {
        let candidate = QueryCandidate::generated(query);
        let report = validate(&candidate, vocabulary);
        repair(&candidate, &report, vocabulary)
    }

    #[test]
    fn case_insensitive_match_substitutes() {
        let repaired = run_repair(
            "MATCH (a:Entity)-[:WIELD]->(b:Entity) RETURN b.id",
            &vocab(),
        )
        .expect("repair must succeed");
        assert!(repaired.text.contains("[:wield]"));
        assert_eq!(repaired.repair_attempts, 1);
        assert!(validate(&repaired, &vocab()).is_valid());
    }

    #[test]
    fn stem_match_maps_wielded_by_to_wield() {
        let repaired = run_repair(
            "MATCH (a:Entity {id: 'Black Knights'})-[:wielded_by]->(b:Entity) RETURN b.id",
            &vocab(),
        )
        .expect("repair must succeed");
        assert!(repaired.text.contains("[:wield]"));
        assert!(!repaired.text.contains("wielded_by"));
        assert!(validate(&repaired, &vocab()).is_valid());
    }

    #[test]
    fn stem_match_handles_missing_plural() {
        // Vocabulary has belongs_to; the model dropped the s.
        let repaired = run_repair(
            "MATCH (a:Entity)-[:belong_to]->(b:Entity) RETURN b.id",
            &vocab(),
        )
        .expect("repair must succeed");
        assert!(repaired.text.contains("[:belongs_to]"));
    }

    #[test]
    fn label_case_is_repaired() {
        let repaired = run_repair(
            "MATCH (a:entity)-[:wield]->(b:Entity) RETURN b.id",
            &vocab(),
        )
        .expect("repair must succeed");
        assert!(repaired.text.contains("(a:Entity)"));
        assert!(validate(&repaired, &vocab()).is_valid());
    }

    #[test]
    fn ambiguous_match_declines() {
        let vocabulary = custom_vocab(&["grants", "granted_to", "wield"]);
        let result = run_repair(
            "MATCH (a:Entity)-[:granting]->(b:Entity) RETURN b.id",
            &vocabulary,
        );
        assert!(result.is_none(), "ambiguous repair must be refused");
    }

    #[test]
    fn zero_match_declines() {
        let result = run_repair(
            "MATCH (a:Entity)-[:forged_from]->(b:Entity) RETURN b.id",
            &vocab(),
        );
        assert!(result.is_none());
    }

    #[test]
    fn unbound_type_variable_is_bound_at_empty_bracket() {
        let repaired = run_repair(
            "MATCH (a:Entity)-[]->(b:Entity) RETURN a.id AS source, type(r) AS relation",
            &vocab(),
        )
        .expect("repair must succeed");
        assert!(repaired.text.contains("[r]"));
        assert!(validate(&repaired, &vocab()).is_valid());
    }

    #[test]
    fn unbound_type_variable_is_bound_at_typed_bracket() {
        let repaired = run_repair(
            "MATCH (a:Entity)-[:wield]->(b:Entity) RETURN type(r)",
            &vocab(),
        )
        .expect("repair must succeed");
        assert!(repaired.text.contains("[r:wield]"));
        assert!(validate(&repaired, &vocab()).is_valid());
    }

    #[test]
    fn variable_used_outside_type_accessor_declines() {
        let result = run_repair(
            "MATCH (a:Entity)-[]->(b:Entity) RETURN r.weight, type(r)",
            &vocab(),
        );
        assert!(result.is_none());
    }

    #[test]
    fn no_bracket_site_declines() {
        let result = run_repair("MATCH (a:Entity) RETURN type(r)", &vocab());
        assert!(result.is_none());
    }

    #[test]
    fn repair_is_idempotent_on_valid_candidates() {
        let candidate = QueryCandidate {
            text: "MATCH (a:Entity)-[:wield]->(b:Entity) RETURN b.id".to_string(),
            origin: CandidateOrigin::Generated,
            repair_attempts: 1,
        };
        let report = validate(&candidate, &vocab());
        assert!(report.is_valid());

        let again = repair(&candidate, &report, &vocab()).expect("no-op repair");
        assert_eq!(again, candidate);
    }

    #[test]
    fn repaired_candidate_passes_through_unchanged_a_second_time() {
        let first = run_repair(
            "MATCH (a:Entity)-[:wielded_by]->(b:Entity) RETURN b.id",
            &vocab(),
        )
        .expect("repair must succeed");
        let report = validate(&first, &vocab());
        assert!(report.is_valid());

        let second = repair(&first, &report, &vocab()).expect("no-op repair");
        assert_eq!(second, first);
    }

    #[test]
    fn substitution_respects_boundaries_and_strings() {
        let text = "MATCH (a:Entity {id: 'keep :wielded_by here'})-[:wielded_by]->(b:Entity) RETURN b.id";
        let out = substitute_token(text, "wielded_by", "wield");
        assert!(out.contains("[:wield]"));
        assert!(out.contains("keep :wielded_by here"));
    }

    #[test]
    fn stem_keys() {
        assert_eq!(stem_key("wielded_by"), "wield");
        assert_eq!(stem_key("wield"), "wield");
        assert_eq!(stem_key("belongs_to"), "belong");
        assert_eq!(stem_key("belong_to"), "belong");
        assert_eq!(stem_key("has_skill"), "has_skill");
        assert_eq!(stem_key("HAS_SKILLS"), "has_skill");
    }

    #[test]
    fn report_must_be_consumed_in_full_or_not_at_all() {
        // One fixable token plus one unfixable one: the whole repair
        // declines rather than executing a half-fixed query.
        let mut report = ValidationReport::default();
        report.unknown_tokens = BTreeSet::from(["WIELD".to_string(), "forged_from".to_string()]);
        let candidate = QueryCandidate::generated(
            "MATCH (a:Entity)-[:WIELD]->(b:Entity)-[:forged_from]->(c:Entity) RETURN c.id",
        );
        assert!(repair(&candidate, &report, &vocab()).is_none());
    }
}
