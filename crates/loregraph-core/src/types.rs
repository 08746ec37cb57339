//! Core domain types for the loregraph question pipeline.
//!
//! These types flow between the pipeline stages and out to the UI
//! collaborator. Everything here is request-local: created when a question
//! arrives, discarded once the answer is returned.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// ── Query Candidates ──────────────────────────────────────────────

/// Where a query candidate came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CandidateOrigin {
    /// Produced by the language model from free text.
    Generated,
    /// Copied verbatim from a pre-vetted canonical entry.
    Canonical,
}

/// A Cypher query produced for a single request.
///
/// Candidates are created per request and discarded after the request
/// completes. `repair_attempts` counts how many times the repairer has
/// rewritten this candidate; the orchestrator bounds it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryCandidate {
    pub text: String,
    pub origin: CandidateOrigin,
    pub repair_attempts: u32,
}

impl QueryCandidate {
    pub fn generated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: CandidateOrigin::Generated,
            repair_attempts: 0,
        }
    }

    pub fn canonical(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: CandidateOrigin::Canonical,
            repair_attempts: 0,
        }
    }
}

// ── Validation ────────────────────────────────────────────────────

/// Outcome of validating a candidate against the schema vocabulary.
///
/// Produced by the validator, consumed by the repairer and orchestrator.
/// `BTreeSet` keeps reporting order deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    /// Relationship-type or label tokens absent from the vocabulary.
    pub unknown_tokens: BTreeSet<String>,
    /// Variables referenced in a projection clause with no prior binding.
    pub unbound_variables: BTreeSet<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.unknown_tokens.is_empty() && self.unbound_variables.is_empty()
    }
}

// ── Execution Results ─────────────────────────────────────────────

/// One row returned by the graph store: column name → value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Ordered rows produced by executing a query.
///
/// Owned by the current request, discarded after summarization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowSet {
    pub rows: Vec<Row>,
}

impl RowSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ── Answers ───────────────────────────────────────────────────────

/// Whether a request produced a usable answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AskStatus {
    Ok,
    Failed,
}

/// User-visible failure category.
///
/// Local, deterministic failures (validation, repair rules) never surface
/// here; only the terminal outcomes a caller must distinguish.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The language-model service could not be reached within the retry bound.
    GenerationUnavailable,
    /// Validation never converged within the repair bound.
    UnrepairableQuery,
    /// The graph store rejected a query that passed local validation.
    ExecutionError,
}

impl FailureKind {
    /// Stable label matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenerationUnavailable => "generation_unavailable",
            Self::UnrepairableQuery => "unrepairable_query",
            Self::ExecutionError => "execution_error",
        }
    }
}

/// A failure category plus a human-readable message.
///
/// The message never contains internal query text or stack detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

/// The envelope returned to the UI collaborator for one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub rows: RowSet,
    /// Prose explanation of the rows, or `None` when summarization was
    /// degraded or the request failed.
    pub interpretation: Option<String>,
    pub status: AskStatus,
    pub failure: Option<Failure>,
    pub elapsed_ms: u64,
    /// Identifier of the recorded trace, if tracing was enabled.
    pub trace_id: Option<String>,
}

impl Answer {
    pub fn ok(rows: RowSet, interpretation: Option<String>, elapsed_ms: u64) -> Self {
        Self {
            rows,
            interpretation,
            status: AskStatus::Ok,
            failure: None,
            elapsed_ms,
            trace_id: None,
        }
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            rows: RowSet::default(),
            interpretation: None,
            status: AskStatus::Failed,
            failure: Some(Failure {
                kind,
                message: message.into(),
            }),
            elapsed_ms,
            trace_id: None,
        }
    }
}
