use thiserror::Error;

/// Top-level error type for the semantic catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration error: environment variable {0} is not set")]
    MissingEnv(&'static str),
}
