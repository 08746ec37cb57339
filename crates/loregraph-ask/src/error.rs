//! Error types for the loregraph-ask crate.

use thiserror::Error;

use loregraph_core::FailureKind;
use loregraph_graph::ErrorCategory;

/// Terminal pipeline failures.
///
/// Local, deterministic failures (validation findings, declined repair
/// rules) never appear here as raw data; they collapse into
/// `Unrepairable`, and the query text stays in logs and traces only.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Generation unavailable after {attempts} attempts: {last_error}")]
    GenerationUnavailable { attempts: u32, last_error: String },

    #[error("Query could not be repaired after {repair_attempts} repair cycles")]
    Unrepairable { repair_attempts: u32 },

    #[error("Execution failed ({category}): {message}")]
    Execution {
        category: ErrorCategory,
        message: String,
        /// The offending query, kept for logging and traces, never for
        /// the user-facing message.
        query: String,
    },
}

impl PipelineError {
    /// The UI-facing category for this failure.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::GenerationUnavailable { .. } => FailureKind::GenerationUnavailable,
            Self::Unrepairable { .. } => FailureKind::UnrepairableQuery,
            Self::Execution { .. } => FailureKind::ExecutionError,
        }
    }

    /// Human-readable message for the UI. Never contains query text,
    /// transport detail, or stack information.
    pub fn user_message(&self) -> String {
        match self {
            Self::GenerationUnavailable { .. } => {
                "The language-model service is currently unavailable. Please try again in a moment."
                    .to_string()
            }
            Self::Unrepairable { .. } => {
                "I couldn't translate that question into a valid graph query. Please try rephrasing it."
                    .to_string()
            }
            Self::Execution { .. } => {
                "Something went wrong while querying the graph. The issue has been recorded."
                    .to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_never_leak_query_text() {
        let err = PipelineError::Execution {
            category: ErrorCategory::Syntax,
            message: "Invalid input 'MTCH'".to_string(),
            query: "MTCH (a:Entity) RETURN a".to_string(),
        };
        let message = err.user_message();
        assert!(!message.contains("MTCH"));
        assert_eq!(err.failure_kind(), FailureKind::ExecutionError);
    }
}
