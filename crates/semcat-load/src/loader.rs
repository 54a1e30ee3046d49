//! YAML metadata loader.
//!
//! A domain lives at `<root>/<domain>/` and holds:
//! - `tables/*.yaml` (or `*.yml`): one table definition per file
//! - `joins.yaml`: optional list of joins between the domain's tables
//! - `metrics.yaml`: optional list of metric definitions

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use semcat_core::{
    ColumnDef, ConceptDef, DomainMetadata, ForeignKeyDef, JoinDef, MetricDef, TableDef,
};

use crate::error::{LoadError, Result};

/// Reads every metadata file of one domain.
#[derive(Debug, Clone)]
pub struct MetadataLoader {
    metadata_root: PathBuf,
    domain: String,
}

impl MetadataLoader {
    pub fn new(metadata_root: impl Into<PathBuf>, domain: impl Into<String>) -> Self {
        Self {
            metadata_root: metadata_root.into(),
            domain: domain.into(),
        }
    }

    pub fn domain_path(&self) -> PathBuf {
        self.metadata_root.join(&self.domain)
    }

    /// Load all metadata for the domain.
    pub fn load(&self) -> Result<DomainMetadata> {
        let domain_path = self.domain_path();
        tracing::info!(path = %domain_path.display(), "Loading metadata");

        if !self.metadata_root.is_dir() {
            return Err(LoadError::Configuration(format!(
                "metadata root not found: {}",
                self.metadata_root.display()
            )));
        }
        if !domain_path.is_dir() {
            return Err(LoadError::Configuration(format!(
                "domain directory not found: {}",
                domain_path.display()
            )));
        }
        let tables_path = domain_path.join("tables");
        if !tables_path.is_dir() {
            return Err(LoadError::Configuration(format!(
                "tables directory not found: {}",
                tables_path.display()
            )));
        }

        let mut metadata = DomainMetadata::new(&self.domain);
        metadata.tables = self.load_tables(&tables_path)?;
        tracing::info!(count = metadata.tables.len(), "Loaded tables");

        match find_yaml(&domain_path, "joins") {
            Some(path) => {
                metadata.joins = parse_joins(&read(&path)?, &path)?;
                tracing::info!(count = metadata.joins.len(), "Loaded joins");
            }
            None => tracing::info!("No joins file, skipping joins"),
        }

        match find_yaml(&domain_path, "metrics") {
            Some(path) => {
                metadata.metrics = parse_metrics(&read(&path)?, &path)?;
                tracing::info!(count = metadata.metrics.len(), "Loaded metrics");
            }
            None => tracing::info!("No metrics file, skipping metrics"),
        }

        Ok(metadata)
    }

    /// Parse every `.yaml`/`.yml` file in `tables_path`, in file-name order.
    fn load_tables(&self, tables_path: &Path) -> Result<Vec<TableDef>> {
        let entries = fs::read_dir(tables_path).map_err(|source| LoadError::Io {
            path: tables_path.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| LoadError::Io {
                    path: tables_path.to_path_buf(),
                    source,
                })?
                .path();
            if path.is_file() && is_yaml(&path) {
                files.push(path);
            }
        }
        files.sort();

        let mut tables: Vec<TableDef> = Vec::with_capacity(files.len());
        for path in files {
            tracing::debug!(file = %path.display(), "Parsing table file");
            let table = parse_table(&read(&path)?, &path)?;

            if table.domain != self.domain {
                tracing::warn!(
                    table = %table.table_name,
                    declared = %table.domain,
                    requested = %self.domain,
                    "Table declares a different domain"
                );
            }
            match tables.iter().position(|t| t.table_name == table.table_name) {
                Some(i) => {
                    tracing::warn!(
                        table = %table.table_name,
                        file = %path.display(),
                        "Table defined more than once, later file wins"
                    );
                    tables[i] = table;
                }
                None => tables.push(table),
            }
        }
        Ok(tables)
    }
}

// ── Parsing ──────────────────────────────────────────────────────

/// Parse one table definition. `path` is only used for error messages.
pub fn parse_table(yaml: &str, path: &Path) -> Result<TableDef> {
    let file: TableFile = serde_yaml::from_str(yaml).map_err(|e| parse_error(path, e))?;

    require(path, "table_name", &file.table_name)?;
    require(path, "domain", &file.domain)?;
    for concept in &file.concepts {
        require(path, "concepts[].name", &concept.name)?;
    }

    let mut columns = Vec::with_capacity(file.columns.len());
    for (key, value) in file.columns {
        let column_name = column_name(&key).ok_or_else(|| LoadError::Parse {
            path: path.to_path_buf(),
            message: format!("column names must be scalars, got {key:?}"),
        })?;
        let entry: Option<ColumnEntry> = serde_yaml::from_value(value).map_err(|e| {
            LoadError::Parse {
                path: path.to_path_buf(),
                message: format!("column `{column_name}`: {e}"),
            }
        })?;
        let entry = entry.unwrap_or_default();

        columns.push(ColumnDef {
            table_name: file.table_name.clone(),
            column_name,
            data_type: entry.data_type.unwrap_or_else(|| "unknown".to_string()),
            business_name: entry.business_name,
            description: entry.description,
            semantics: entry.semantics,
            unit: entry.unit,
            pii: entry.pii,
            sensitive: entry.sensitive,
        });
    }

    Ok(TableDef {
        catalog: file.catalog,
        schema: file.schema,
        table_name: file.table_name,
        domain: file.domain,
        table_type: file.table_type,
        business_name: file.business_name,
        grain: file.grain,
        description: file.description,
        tags: file.tags,
        primary_key: file.primary_key,
        foreign_keys: file
            .foreign_keys
            .into_iter()
            .map(|fk| ForeignKeyDef {
                column: fk.column,
                references_table: fk.references_table,
                references_column: fk.references_column,
                relation: fk.relation,
                description: fk.description,
            })
            .collect(),
        time_columns: file.time_columns,
        recommended_filters: file.recommended_filters,
        concepts: file
            .concepts
            .into_iter()
            .map(|c| ConceptDef {
                name: c.name,
                synonyms: c.synonyms,
            })
            .collect(),
        columns,
        sample_questions: file.sample_questions,
    })
}

/// Parse a joins file.
pub fn parse_joins(yaml: &str, path: &Path) -> Result<Vec<JoinDef>> {
    if yaml.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: JoinsFile = serde_yaml::from_str(yaml).map_err(|e| parse_error(path, e))?;

    let mut joins = Vec::with_capacity(file.joins.len());
    for join in file.joins {
        require(path, "from", &join.from)?;
        require(path, "to", &join.to)?;
        joins.push(JoinDef {
            from_table: join.from,
            to_table: join.to,
            join_type: join.join_type.unwrap_or_else(|| "inner".to_string()),
            on: join.on.into_vec(),
            description: join.description,
        });
    }
    Ok(joins)
}

/// Parse a metrics file.
pub fn parse_metrics(yaml: &str, path: &Path) -> Result<Vec<MetricDef>> {
    if yaml.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: MetricsFile = serde_yaml::from_str(yaml).map_err(|e| parse_error(path, e))?;

    let mut metrics = Vec::with_capacity(file.metrics.len());
    for m in file.metrics {
        require(path, "name", &m.name)?;
        metrics.push(MetricDef {
            name: m.name,
            business_name: m.business_name,
            description: m.description,
            expression: m.expression,
            base_table: m.base_table,
            grain: m.grain,
            unit: m.unit,
            tags: m.tags,
        });
    }
    Ok(metrics)
}

// ── File shapes ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TableFile {
    #[serde(default, deserialize_with = "nullable")]
    catalog: String,
    #[serde(default, deserialize_with = "nullable")]
    schema: String,
    table_name: String,
    domain: String,
    #[serde(default, deserialize_with = "nullable")]
    table_type: String,
    #[serde(default, deserialize_with = "nullable")]
    business_name: String,
    #[serde(default, deserialize_with = "nullable")]
    grain: String,
    #[serde(default, deserialize_with = "nullable")]
    description: String,
    #[serde(default, deserialize_with = "nullable")]
    tags: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    primary_key: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    foreign_keys: Vec<ForeignKeyEntry>,
    #[serde(default, deserialize_with = "nullable")]
    time_columns: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    recommended_filters: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    concepts: Vec<ConceptEntry>,
    /// Kept as a mapping so columns stay in declaration order.
    #[serde(default, deserialize_with = "nullable")]
    columns: serde_yaml::Mapping,
    #[serde(default, deserialize_with = "nullable")]
    sample_questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ForeignKeyEntry {
    #[serde(default, deserialize_with = "nullable")]
    column: String,
    #[serde(default, deserialize_with = "nullable")]
    references_table: String,
    #[serde(default, deserialize_with = "nullable")]
    references_column: String,
    #[serde(default, deserialize_with = "nullable")]
    relation: String,
    #[serde(default, deserialize_with = "nullable")]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ConceptEntry {
    #[serde(default, deserialize_with = "nullable")]
    name: String,
    #[serde(default, deserialize_with = "nullable")]
    synonyms: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ColumnEntry {
    #[serde(default)]
    data_type: Option<String>,
    #[serde(default)]
    business_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    description: String,
    #[serde(default, deserialize_with = "nullable")]
    semantics: Vec<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pii: bool,
    #[serde(default, deserialize_with = "nullable")]
    sensitive: bool,
}

#[derive(Debug, Deserialize)]
struct JoinsFile {
    #[serde(default, deserialize_with = "nullable")]
    joins: Vec<JoinEntry>,
}

#[derive(Debug, Deserialize)]
struct JoinEntry {
    from: String,
    to: String,
    #[serde(rename = "type", default)]
    join_type: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    on: OneOrMany,
    #[serde(default, deserialize_with = "nullable")]
    description: String,
}

#[derive(Debug, Deserialize)]
struct MetricsFile {
    #[serde(default, deserialize_with = "nullable")]
    metrics: Vec<MetricEntry>,
}

#[derive(Debug, Deserialize)]
struct MetricEntry {
    name: String,
    #[serde(default, deserialize_with = "nullable")]
    business_name: String,
    #[serde(default, deserialize_with = "nullable")]
    description: String,
    #[serde(default, deserialize_with = "nullable")]
    expression: String,
    #[serde(default, deserialize_with = "nullable")]
    base_table: String,
    #[serde(default, deserialize_with = "nullable")]
    grain: String,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    tags: Vec<String>,
}

/// A join condition written either as one string or as a list.
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::None => Vec::new(),
            Self::One(s) => vec![s],
            Self::Many(v) => v,
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Treat an explicit YAML `null` like an absent key.
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn require(path: &Path, key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LoadError::Parse {
            path: path.to_path_buf(),
            message: format!("required key `{key}` is empty"),
        });
    }
    Ok(())
}

fn column_name(key: &serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_error(path: &Path, err: serde_yaml::Error) -> LoadError {
    LoadError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// `<dir>/<stem>.yaml`, falling back to `<dir>/<stem>.yml`.
fn find_yaml(dir: &Path, stem: &str) -> Option<PathBuf> {
    ["yaml", "yml"]
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|p| p.is_file())
}
