//! Trace session helpers for the question pipeline.

use loregraph_core::{CandidateOrigin, QueryCandidate, ValidationReport};
use loregraph_trace::session::TraceSession;
use loregraph_trace::store::{FileTraceStore, TraceStore};
use loregraph_trace::QueryTrace;

/// Start a trace session for one question.
pub fn start_ask_session(question: &str) -> TraceSession {
    TraceSession::new(question)
}

/// Record a stage transition.
pub fn record_stage(session: &mut TraceSession, stage: &str, detail: &str) {
    session.add_event(stage, detail);
}

/// Record a candidate query together with its validation findings.
pub fn record_candidate(
    session: &mut TraceSession,
    candidate: &QueryCandidate,
    report: &ValidationReport,
) {
    let origin = match candidate.origin {
        CandidateOrigin::Generated => "generated",
        CandidateOrigin::Canonical => "canonical",
    };
    session.add_candidate(
        &candidate.text,
        origin,
        candidate.repair_attempts,
        report.unknown_tokens.iter().cloned().collect(),
        report.unbound_variables.iter().cloned().collect(),
    );
}

/// Finalize the session and store the trace.
///
/// Storage failures are logged but never fail the request; the answer
/// has already been computed at this point.
pub fn finalize_and_store(session: TraceSession, trace_dir: &str) -> Option<QueryTrace> {
    let trace = session.finalize();

    match FileTraceStore::new(trace_dir) {
        Ok(store) => match store.save(&trace) {
            Ok(()) => {
                tracing::info!(trace_id = %trace.id, "Trace recorded for ask session");
                Some(trace)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to store trace");
                Some(trace)
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Failed to initialize trace store");
            Some(trace)
        }
    }
}
