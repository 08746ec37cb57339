//! loregraph-trace — Tamper-evident capture of pipeline sessions.
//!
//! A trace records the complete journey of one question through the
//! translation pipeline: every candidate query, every stage transition,
//! and the terminal outcome. Each trace is content-hashed with BLAKE3 and
//! stored as a JSON file partitioned by date. Traces of failed executions
//! carry the offending query text and feed later vocabulary-grounding
//! review.

pub mod hash;
pub mod session;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Core Types ───────────────────────────────────────────────────

/// Unique identifier for a trace session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TraceId(pub Uuid);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A query candidate observed during the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateRecord {
    /// The candidate's query text.
    pub query: String,
    /// Where the candidate came from ("generated" or "canonical").
    pub origin: String,
    /// How many repair rewrites this candidate has been through.
    pub repair_attempts: u32,
    /// Vocabulary tokens the validator flagged.
    pub unknown_tokens: Vec<String>,
    /// Variables the validator flagged as unbound.
    pub unbound_variables: Vec<String>,
    /// When the candidate was recorded.
    pub timestamp: DateTime<Utc>,
}

/// A pipeline stage transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageEvent {
    /// Stage name (e.g. "generate", "validate", "execute").
    pub stage: String,
    /// Human-readable detail.
    pub detail: String,
    /// When the transition happened.
    pub timestamp: DateTime<Utc>,
}

/// Terminal outcome of the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Outcome {
    /// "ok" or "failed".
    pub status: String,
    /// Failure category when status is "failed".
    pub failure_kind: Option<String>,
    /// Rows returned when status is "ok".
    pub row_count: Option<usize>,
}

/// The complete record of one question's trip through the pipeline.
///
/// A trace captures everything the pipeline saw, tried, and decided for
/// a single request, providing a complete audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryTrace {
    /// Unique session identifier.
    pub id: TraceId,
    /// The question as submitted by the caller.
    pub question: String,
    /// Every candidate query, in the order it was produced.
    pub candidates: Vec<CandidateRecord>,
    /// Stage transitions, in order.
    pub events: Vec<StageEvent>,
    /// Terminal outcome — set on finalization.
    pub outcome: Option<Outcome>,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// When the session ended.
    pub completed_at: Option<DateTime<Utc>>,
    /// BLAKE3 content hash (hex) — set on finalization.
    pub content_hash: Option<String>,
}

impl QueryTrace {
    /// Compute and return the BLAKE3 hash of the trace's content.
    /// The hash covers all fields except `content_hash` itself.
    pub fn compute_hash(&self) -> String {
        hash::compute_trace_hash(self)
    }

    /// Verify that the stored content_hash matches a freshly computed hash.
    pub fn verify_integrity(&self) -> bool {
        match &self.content_hash {
            Some(stored) => stored == &self.compute_hash(),
            None => false,
        }
    }
}
