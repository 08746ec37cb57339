//! loregraph-core: Shared types and error handling for the loregraph pipeline.
//!
//! This crate provides the foundational types used across all loregraph
//! components:
//! - Query candidates and validation reports flowing through the pipeline
//! - Row sets returned by the graph store
//! - The UI-facing `Answer` envelope and failure taxonomy
//! - Common error types

pub mod error;
pub mod types;

pub use error::LoreError;
pub use types::{
    Answer, AskStatus, CandidateOrigin, Failure, FailureKind, QueryCandidate, Row, RowSet,
    ValidationReport,
};
