//! Neo4j connection settings.
//!
//! Settings come from `NEO4J_`-prefixed environment variables:
//! `NEO4J_URI`, `NEO4J_USER` and `NEO4J_PASSWORD` are required,
//! `NEO4J_DATABASE` is optional.

use config::{Config, Environment};

use crate::error::CatalogError;

/// Credentials and target for the catalog graph database.
#[derive(Clone)]
pub struct Neo4jSettings {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
}

impl std::fmt::Debug for Neo4jSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jSettings")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

impl Neo4jSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, CatalogError> {
        Self::from_environment(Environment::with_prefix("NEO4J"))
    }

    /// Read settings from an explicit `NEO4J_*` variable map instead of the
    /// process environment.
    pub fn from_vars(vars: config::Map<String, String>) -> Result<Self, CatalogError> {
        Self::from_environment(Environment::with_prefix("NEO4J").source(Some(vars)))
    }

    fn from_environment(env: Environment) -> Result<Self, CatalogError> {
        let cfg = Config::builder()
            .add_source(env)
            .build()
            .map_err(|e| CatalogError::Config(e.to_string()))?;

        Ok(Self {
            uri: required(&cfg, "uri", "NEO4J_URI")?,
            user: required(&cfg, "user", "NEO4J_USER")?,
            password: required(&cfg, "password", "NEO4J_PASSWORD")?,
            database: cfg
                .get_string("database")
                .ok()
                .filter(|db| !db.trim().is_empty()),
        })
    }
}

fn required(cfg: &Config, key: &str, var: &'static str) -> Result<String, CatalogError> {
    match cfg.get_string(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(CatalogError::MissingEnv(var)),
    }
}
