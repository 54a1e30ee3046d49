//! semcat-graph: Neo4j client for the semantic catalog graph.
//!
//! This crate is the single mutation point for the catalog graph. All writes
//! are MERGE-by-key upserts against the uniqueness constraints it manages, so
//! loading the same metadata twice leaves the graph unchanged.

pub mod client;
pub mod mutations;
pub mod queries;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use mutations::EdgeOutcome;
