//! Catalog metadata records.
//!
//! These are the in-memory form of the per-domain YAML files: one
//! [`TableDef`] per table file, plus the domain's join and metric lists.

use serde::{Deserialize, Serialize};

/// A database table with its columns, keys, and business annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub catalog: String,
    pub schema: String,
    pub table_name: String,
    pub domain: String,
    /// Usually `fact` or `dim`.
    pub table_type: String,
    pub business_name: String,
    pub grain: String,
    pub description: String,
    pub tags: Vec<String>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyDef>,
    pub time_columns: Vec<String>,
    pub recommended_filters: Vec<String>,
    pub concepts: Vec<ConceptDef>,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDef>,
    pub sample_questions: Vec<String>,
}

impl TableDef {
    pub fn is_primary_key(&self, column_name: &str) -> bool {
        self.primary_key.iter().any(|c| c == column_name)
    }

    pub fn is_time_column(&self, column_name: &str) -> bool {
        self.time_columns.iter().any(|c| c == column_name)
    }
}

/// A single column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub business_name: Option<String>,
    pub description: String,
    /// Semantic tags, matched against concept names.
    pub semantics: Vec<String>,
    pub unit: Option<String>,
    pub pii: bool,
    pub sensitive: bool,
}

/// A foreign key from one table to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    pub column: String,
    /// Target table, possibly qualified as `catalog.schema.table`.
    pub references_table: String,
    pub references_column: String,
    pub relation: String,
    pub description: String,
}

impl ForeignKeyDef {
    /// The bare name of the referenced table (last dotted segment).
    pub fn target_table(&self) -> &str {
        self.references_table
            .rsplit('.')
            .next()
            .unwrap_or(&self.references_table)
    }
}

/// A business concept with its synonyms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptDef {
    pub name: String,
    pub synonyms: Vec<String>,
}

/// A join path between two tables of the same domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinDef {
    pub from_table: String,
    pub to_table: String,
    pub join_type: String,
    pub on: Vec<String>,
    pub description: String,
}

/// A named business metric computed over a base table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDef {
    pub name: String,
    pub business_name: String,
    pub description: String,
    pub expression: String,
    pub base_table: String,
    pub grain: String,
    pub unit: Option<String>,
    pub tags: Vec<String>,
}

/// Everything loaded for one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainMetadata {
    pub domain: String,
    pub tables: Vec<TableDef>,
    pub joins: Vec<JoinDef>,
    pub metrics: Vec<MetricDef>,
}

impl DomainMetadata {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Default::default()
        }
    }

    /// Find a loaded table by bare name.
    pub fn table(&self, table_name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.table_name == table_name)
    }
}
