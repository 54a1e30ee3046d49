//! semcat-load: Loads YAML catalog metadata into the semantic catalog graph.
//!
//! The pipeline is read, map, write: the loader turns a domain directory into
//! records, the mapper turns records into keyed upserts, and the writer
//! applies them to Neo4j.

pub mod config;
pub mod error;
pub mod loader;
pub mod mapper;
pub mod writer;
