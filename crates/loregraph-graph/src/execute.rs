//! Read-query execution for the question pipeline.
//!
//! Executes validated Cypher text and collects the result as ordered
//! column→value row mappings. Store-side failures are categorized so the
//! orchestrator can log syntax failures (missed by local validation) for
//! vocabulary-grounding review without retrying them.

use neo4rs::query;
use serde::{Deserialize, Serialize};

use loregraph_core::{Row, RowSet};

use crate::client::{GraphClient, GraphError};

/// Distinguishable category of a store-side execution failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The store rejected the query text itself.
    Syntax,
    /// The query referenced a label, relationship type, or property the
    /// store does not know.
    MissingVocabulary,
    /// The store could not be reached or the session broke mid-query.
    Connectivity,
    /// Anything else.
    Other,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Syntax => "syntax",
            Self::MissingVocabulary => "missing_vocabulary",
            Self::Connectivity => "connectivity",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Classify a store error by its server code / message text.
fn categorize(text: &str) -> ErrorCategory {
    if text.contains("SyntaxError") || text.contains("InvalidSyntax") {
        ErrorCategory::Syntax
    } else if text.contains("UnknownLabel")
        || text.contains("UnknownRelationshipType")
        || text.contains("UnknownPropertyKey")
    {
        ErrorCategory::MissingVocabulary
    } else if text.contains("connection")
        || text.contains("Connection")
        || text.contains("IO error")
        || text.contains("timed out")
    {
        ErrorCategory::Connectivity
    } else {
        ErrorCategory::Other
    }
}

impl GraphClient {
    /// Execute a read query and collect every row as a column→value map.
    ///
    /// Row order is preserved as returned by the store.
    pub async fn execute_read(&self, cypher: &str) -> Result<RowSet, GraphError> {
        let execution_error = |e: neo4rs::Error| {
            let message = e.to_string();
            GraphError::Execution {
                category: categorize(&message),
                message,
            }
        };

        let mut stream = self
            .inner()
            .execute(query(cypher))
            .await
            .map_err(execution_error)?;

        let mut rows: Vec<Row> = Vec::new();
        loop {
            let next = stream.next().await.map_err(execution_error)?;
            let Some(row) = next else { break };
            let map: Row = row
                .to::<Row>()
                .map_err(|e| GraphError::Serialization(format!("Failed to decode row: {e}")))?;
            rows.push(map);
        }

        tracing::debug!(row_count = rows.len(), "Read query complete");
        Ok(RowSet::new(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorizes_server_codes() {
        assert_eq!(
            categorize("Neo.ClientError.Statement.SyntaxError: Invalid input"),
            ErrorCategory::Syntax
        );
        assert_eq!(
            categorize("Neo.ClientNotification.Statement.UnknownRelationshipType"),
            ErrorCategory::MissingVocabulary
        );
        assert_eq!(
            categorize("Connection refused (os error 111)"),
            ErrorCategory::Connectivity
        );
        assert_eq!(categorize("something else entirely"), ErrorCategory::Other);
    }
}
