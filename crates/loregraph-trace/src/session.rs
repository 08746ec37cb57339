//! Builder-pattern session recorder for trace capture.
//!
//! Used by the pipeline to incrementally record a request's journey:
//!
//! ```no_run
//! # use loregraph_trace::session::TraceSession;
//! let mut session = TraceSession::new("Which weapons are wielded by Black Knights?");
//! session.add_event("generate", "candidate produced on attempt 1");
//! session.add_candidate(
//!     "MATCH (a:Entity)-[:wielded_by]->(b:Entity) RETURN b.id",
//!     "generated",
//!     0,
//!     vec!["wielded_by".to_string()],
//!     vec![],
//! );
//! session.add_event("repair", "substituted wielded_by -> wield");
//! session.set_outcome("ok", None, Some(2));
//! let trace = session.finalize();
//! assert!(trace.content_hash.is_some());
//! ```

use chrono::Utc;

use crate::{CandidateRecord, Outcome, QueryTrace, StageEvent, TraceId};

/// A session builder that records pipeline activity incrementally.
pub struct TraceSession {
    trace: QueryTrace,
}

impl TraceSession {
    /// Start a new trace recording session for a question.
    pub fn new(question: &str) -> Self {
        Self {
            trace: QueryTrace {
                id: TraceId::new(),
                question: question.to_string(),
                candidates: Vec::new(),
                events: Vec::new(),
                outcome: None,
                started_at: Utc::now(),
                completed_at: None,
                content_hash: None,
            },
        }
    }

    /// Record a stage transition.
    pub fn add_event(&mut self, stage: &str, detail: &str) {
        self.trace.events.push(StageEvent {
            stage: stage.to_string(),
            detail: detail.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Record a candidate query together with its validation findings.
    pub fn add_candidate(
        &mut self,
        query: &str,
        origin: &str,
        repair_attempts: u32,
        unknown_tokens: Vec<String>,
        unbound_variables: Vec<String>,
    ) {
        self.trace.candidates.push(CandidateRecord {
            query: query.to_string(),
            origin: origin.to_string(),
            repair_attempts,
            unknown_tokens,
            unbound_variables,
            timestamp: Utc::now(),
        });
    }

    /// Record the terminal outcome of the request.
    pub fn set_outcome(&mut self, status: &str, failure_kind: Option<&str>, row_count: Option<usize>) {
        self.trace.outcome = Some(Outcome {
            status: status.to_string(),
            failure_kind: failure_kind.map(str::to_string),
            row_count,
        });
    }

    /// The trace ID for this session (available before finalization).
    pub fn id(&self) -> TraceId {
        self.trace.id
    }

    /// Finalize the session: set completed_at and compute the content hash.
    pub fn finalize(mut self) -> QueryTrace {
        self.trace.completed_at = Some(Utc::now());
        let hash = self.trace.compute_hash();
        self.trace.content_hash = Some(hash);
        self.trace
    }
}
