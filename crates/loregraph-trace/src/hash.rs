//! BLAKE3 content hashing for tamper evidence.
//!
//! Computes a deterministic hash of all trace fields (excluding the
//! content_hash itself) so that any modification is detectable.

use serde::Serialize;

use crate::QueryTrace;

/// Hashable representation of a QueryTrace (excludes content_hash).
#[derive(Serialize)]
struct HashableTrace<'a> {
    id: &'a crate::TraceId,
    question: &'a str,
    candidates: &'a [crate::CandidateRecord],
    events: &'a [crate::StageEvent],
    outcome: &'a Option<crate::Outcome>,
    started_at: &'a chrono::DateTime<chrono::Utc>,
    completed_at: &'a Option<chrono::DateTime<chrono::Utc>>,
}

/// Compute the BLAKE3 hash of a trace's content.
///
/// Serializes all fields except `content_hash` to canonical JSON,
/// then hashes the bytes with BLAKE3. Returns the hex-encoded hash.
pub fn compute_trace_hash(trace: &QueryTrace) -> String {
    let hashable = HashableTrace {
        id: &trace.id,
        question: &trace.question,
        candidates: &trace.candidates,
        events: &trace.events,
        outcome: &trace.outcome,
        started_at: &trace.started_at,
        completed_at: &trace.completed_at,
    };

    let json = serde_json::to_vec(&hashable).expect("Trace serialization should not fail");
    blake3::hash(&json).to_hex().to_string()
}
