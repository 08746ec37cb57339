//! Execution seam between the pipeline and the graph store.
//!
//! The orchestrator only ever sees this narrow interface, so tests run
//! the full pipeline against a fabricated store.

use async_trait::async_trait;

use loregraph_core::RowSet;
use loregraph_graph::{ErrorCategory, GraphClient, GraphError};

/// A store-side failure, reduced to what the orchestrator needs.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{category}: {message}")]
pub struct ExecError {
    pub category: ErrorCategory,
    pub message: String,
}

/// Narrow interface over the graph-store collaborator.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, cypher: &str) -> Result<RowSet, ExecError>;
}

#[async_trait]
impl QueryExecutor for GraphClient {
    async fn execute(&self, cypher: &str) -> Result<RowSet, ExecError> {
        self.execute_read(cypher).await.map_err(|e| match e {
            GraphError::Execution { category, message } => ExecError { category, message },
            GraphError::Connection(message) => ExecError {
                category: ErrorCategory::Connectivity,
                message,
            },
            other => ExecError {
                category: ErrorCategory::Other,
                message: other.to_string(),
            },
        })
    }
}
