//! loregraph-graph — Neo4j client for the lore knowledge graph.
//!
//! This crate is the single point of access to the graph store. The
//! question pipeline hands it validated Cypher text and gets back ordered
//! row mappings; store-side failures come back with a distinguishable
//! category (syntax vs missing vocabulary vs connectivity) so the
//! orchestrator can decide what to log and what to surface.

pub mod client;
pub mod execute;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use execute::ErrorCategory;
