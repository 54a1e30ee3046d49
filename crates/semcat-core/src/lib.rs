//! semcat-core: Shared types, configuration, and error handling for the semantic catalog.
//!
//! This crate provides the foundational types used across all semcat components:
//! - Metadata records (tables, columns, concepts, joins, metrics) as read from YAML
//! - Node and edge types for the catalog graph, keyed for idempotent upserts
//! - Neo4j connection settings loaded from the environment
//! - Common error types

pub mod config;
pub mod error;
pub mod metadata;
pub mod types;

pub use config::Neo4jSettings;
pub use error::CatalogError;
pub use metadata::{
    ColumnDef, ConceptDef, DomainMetadata, ForeignKeyDef, JoinDef, MetricDef, TableDef,
};
pub use types::{Edge, EdgeProperties, EdgeType, Node, NodeKey, NodeLabel, UpsertOp};
