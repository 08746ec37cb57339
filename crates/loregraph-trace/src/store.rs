//! Trace storage — trait + file-system implementation.
//!
//! Traces are stored as JSON files organized by date and session ID,
//! under a configurable root directory. Failed-execution traces are the
//! raw material for vocabulary-grounding review, so retrieval verifies
//! the content hash before returning anything.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::{QueryTrace, TraceId};

/// Errors that can occur during trace storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Trace not found: {0}")]
    NotFound(TraceId),

    #[error("Integrity check failed for trace {0}: stored hash does not match content")]
    IntegrityViolation(TraceId),

    #[error("Trace has no content hash (not finalized)")]
    NotFinalized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Query parameters for listing traces.
#[derive(Debug, Default)]
pub struct TraceQuery {
    /// Only include traces whose question contains this substring.
    pub question_contains: Option<String>,
    /// Only include traces with a failed outcome.
    pub failed_only: bool,
    /// Only include traces started at or after this time.
    pub from: Option<DateTime<Utc>>,
    /// Only include traces started at or before this time.
    pub to: Option<DateTime<Utc>>,
}

/// Trait for trace persistence backends.
pub trait TraceStore {
    /// Store a finalized trace. Returns an error if the trace has no content hash.
    fn save(&self, trace: &QueryTrace) -> Result<(), StoreError>;

    /// Retrieve a trace by ID, verifying integrity.
    fn get(&self, id: TraceId) -> Result<QueryTrace, StoreError>;

    /// List traces matching the given query, ordered by started_at descending.
    fn list(&self, query: &TraceQuery) -> Result<Vec<QueryTrace>, StoreError>;
}

/// File-system backed trace store.
///
/// Stores traces as JSON files in a directory tree:
/// ```text
/// {root}/
///   2026/
///     08/
///       07/
///         {trace_id}.json
/// ```
pub struct FileTraceStore {
    root: PathBuf,
}

impl FileTraceStore {
    /// Create a new store rooted at the given directory.
    /// Creates the directory if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Build the file path for a trace based on its start date and ID.
    fn trace_path(&self, trace: &QueryTrace) -> PathBuf {
        let date = trace.started_at.format("%Y/%m/%d");
        self.root.join(format!("{}/{}.json", date, trace.id.0))
    }

    /// Find the file path for a trace ID by scanning the directory tree.
    fn find_path(&self, id: TraceId) -> Result<PathBuf, StoreError> {
        let filename = format!("{}.json", id.0);
        find_file_recursive(&self.root, &filename).ok_or(StoreError::NotFound(id))
    }
}

impl TraceStore for FileTraceStore {
    fn save(&self, trace: &QueryTrace) -> Result<(), StoreError> {
        if trace.content_hash.is_none() {
            return Err(StoreError::NotFinalized);
        }

        let path = self.trace_path(trace);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(trace)?;
        fs::write(&path, json)?;

        tracing::debug!(
            trace_id = %trace.id,
            path = %path.display(),
            "Trace saved"
        );

        Ok(())
    }

    fn get(&self, id: TraceId) -> Result<QueryTrace, StoreError> {
        let path = self.find_path(id)?;
        let json = fs::read_to_string(&path)?;
        let trace: QueryTrace = serde_json::from_str(&json)?;

        if !trace.verify_integrity() {
            return Err(StoreError::IntegrityViolation(id));
        }

        Ok(trace)
    }

    fn list(&self, query: &TraceQuery) -> Result<Vec<QueryTrace>, StoreError> {
        let mut results = Vec::new();

        collect_traces_recursive(&self.root, query, &mut results)?;

        // Sort by started_at descending
        results.sort_by(|a, b| b.started_at.cmp(&a.started_at));

        Ok(results)
    }
}

/// Recursively find a file by name.
fn find_file_recursive(dir: &Path, filename: &str) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }

    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_file_recursive(&path, filename) {
                return Some(found);
            }
        } else if path.file_name().and_then(|n| n.to_str()) == Some(filename) {
            return Some(path);
        }
    }

    None
}

/// Recursively collect traces matching a query.
fn collect_traces_recursive(
    dir: &Path,
    query: &TraceQuery,
    results: &mut Vec<QueryTrace>,
) -> Result<(), StoreError> {
    if !dir.is_dir() {
        return Ok(());
    }

    let entries = fs::read_dir(dir)?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_traces_recursive(&path, query, results)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("json") {
            let json = fs::read_to_string(&path)?;
            let trace: QueryTrace = serde_json::from_str(&json)?;

            if matches_query(&trace, query) {
                results.push(trace);
            }
        }
    }

    Ok(())
}

/// Check whether a trace matches the given query filters.
fn matches_query(trace: &QueryTrace, query: &TraceQuery) -> bool {
    if let Some(needle) = &query.question_contains {
        if !trace.question.contains(needle.as_str()) {
            return false;
        }
    }
    if query.failed_only {
        let failed = trace
            .outcome
            .as_ref()
            .is_some_and(|o| o.status == "failed");
        if !failed {
            return false;
        }
    }
    if let Some(from) = &query.from {
        if &trace.started_at < from {
            return false;
        }
    }
    if let Some(to) = &query.to {
        if &trace.started_at > to {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TraceSession;

    fn create_test_trace(question: &str, status: &str) -> QueryTrace {
        let mut session = TraceSession::new(question);
        session.add_event("generate", "candidate produced on attempt 1");
        session.add_candidate(
            "MATCH (a:Entity)-[:wield]->(b:Entity) RETURN b.id",
            "generated",
            0,
            vec![],
            vec![],
        );
        match status {
            "failed" => session.set_outcome("failed", Some("execution_error"), None),
            _ => session.set_outcome("ok", None, Some(3)),
        }
        session.finalize()
    }

    #[test]
    fn save_and_retrieve() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTraceStore::new(dir.path()).unwrap();
        let trace = create_test_trace("Which weapons are wielded by Black Knights?", "ok");
        let id = trace.id;

        store.save(&trace).unwrap();
        let retrieved = store.get(id).unwrap();

        assert_eq!(retrieved.id, id);
        assert_eq!(
            retrieved.question,
            "Which weapons are wielded by Black Knights?"
        );
        assert_eq!(retrieved.candidates.len(), 1);
        assert_eq!(retrieved.events.len(), 1);
        assert!(retrieved.verify_integrity());
    }

    #[test]
    fn integrity_violation_detected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTraceStore::new(dir.path()).unwrap();
        let trace = create_test_trace("Who forged the Moonlight Greatsword?", "ok");
        let id = trace.id;

        store.save(&trace).unwrap();

        // Tamper with the file: change the question
        let path = store.find_path(id).unwrap();
        let mut tampered: QueryTrace =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        tampered.question = "TAMPERED QUESTION".to_string();
        fs::write(&path, serde_json::to_string_pretty(&tampered).unwrap()).unwrap();

        // Retrieval should fail with integrity violation
        let result = store.get(id);
        assert!(matches!(result, Err(StoreError::IntegrityViolation(_))));
    }

    #[test]
    fn save_rejects_unfinalized() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTraceStore::new(dir.path()).unwrap();

        let trace = QueryTrace {
            id: TraceId::new(),
            question: "test".to_string(),
            candidates: vec![],
            events: vec![],
            outcome: None,
            started_at: Utc::now(),
            completed_at: None,
            content_hash: None, // not finalized
        };

        let result = store.save(&trace);
        assert!(matches!(result, Err(StoreError::NotFinalized)));
    }

    #[test]
    fn list_filters_failed_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTraceStore::new(dir.path()).unwrap();

        let t1 = create_test_trace("question one", "ok");
        let t2 = create_test_trace("question two", "failed");
        let t3 = create_test_trace("question three", "failed");

        store.save(&t1).unwrap();
        store.save(&t2).unwrap();
        store.save(&t3).unwrap();

        let query = TraceQuery {
            failed_only: true,
            ..Default::default()
        };
        let results = store.list(&query).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|t| t.outcome.as_ref().unwrap().status == "failed"));
    }

    #[test]
    fn list_filters_by_question() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTraceStore::new(dir.path()).unwrap();

        let t1 = create_test_trace("Which weapons are wielded by Black Knights?", "ok");
        let t2 = create_test_trace("Where is the Firelink Shrine?", "ok");

        store.save(&t1).unwrap();
        store.save(&t2).unwrap();

        let query = TraceQuery {
            question_contains: Some("Black Knights".to_string()),
            ..Default::default()
        };
        let results = store.list(&query).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].question.contains("Black Knights"));
    }
}
