//! Error types for the semcat-load crate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Cannot reach Neo4j: {0}")]
    Connection(String),

    #[error("Graph error: {0}")]
    Graph(#[from] semcat_graph::GraphError),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<semcat_core::CatalogError> for LoadError {
    fn from(err: semcat_core::CatalogError) -> Self {
        match err {
            semcat_core::CatalogError::Config(msg) => Self::Configuration(msg),
            semcat_core::CatalogError::MissingEnv(var) => {
                Self::Configuration(format!("environment variable {var} is not set"))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;
