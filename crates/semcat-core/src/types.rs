//! Node and edge types for the catalog graph.
//!
//! Every node carries a [`NodeKey`] that matches one of the uniqueness
//! constraints, so an upsert is always a MERGE on that key followed by a
//! property overwrite.

use serde::{Deserialize, Serialize};

// ── Labels ────────────────────────────────────────────────────────

/// Node labels in the catalog graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NodeLabel {
    Table,
    Column,
    Concept,
    Metric,
}

impl NodeLabel {
    pub const ALL: [NodeLabel; 4] = [Self::Table, Self::Column, Self::Concept, Self::Metric];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "Table",
            Self::Column => "Column",
            Self::Concept => "Concept",
            Self::Metric => "Metric",
        }
    }
}

impl std::fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship types in the catalog graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    /// Table -> Column
    HasColumn,
    /// Table -> Table
    Join,
    /// Table -> Table
    Fk,
    /// Table -> Concept
    HasConcept,
    /// Column -> Concept
    HasSemantic,
    /// Metric -> Table
    MetricBaseTable,
    /// Table -> Metric
    HasMetric,
}

impl EdgeType {
    pub const ALL: [EdgeType; 7] = [
        Self::HasColumn,
        Self::Join,
        Self::Fk,
        Self::HasConcept,
        Self::HasSemantic,
        Self::MetricBaseTable,
        Self::HasMetric,
    ];

    /// The Cypher relationship type.
    pub fn as_cypher(&self) -> &'static str {
        match self {
            Self::HasColumn => "HAS_COLUMN",
            Self::Join => "JOIN",
            Self::Fk => "FK",
            Self::HasConcept => "HAS_CONCEPT",
            Self::HasSemantic => "HAS_SEMANTIC",
            Self::MetricBaseTable => "METRIC_BASE_TABLE",
            Self::HasMetric => "HAS_METRIC",
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_cypher())
    }
}

// ── Keys ──────────────────────────────────────────────────────────

/// Identity of a node: the property set its uniqueness constraint covers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(tag = "label")]
pub enum NodeKey {
    Table { domain: String, table_name: String },
    Column { table_name: String, column_name: String },
    Concept { name: String },
    Metric { name: String },
}

impl NodeKey {
    pub fn table(domain: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self::Table {
            domain: domain.into(),
            table_name: table_name.into(),
        }
    }

    pub fn column(table_name: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self::Column {
            table_name: table_name.into(),
            column_name: column_name.into(),
        }
    }

    pub fn concept(name: impl Into<String>) -> Self {
        Self::Concept { name: name.into() }
    }

    pub fn metric(name: impl Into<String>) -> Self {
        Self::Metric { name: name.into() }
    }

    pub fn label(&self) -> NodeLabel {
        match self {
            Self::Table { .. } => NodeLabel::Table,
            Self::Column { .. } => NodeLabel::Column,
            Self::Concept { .. } => NodeLabel::Concept,
            Self::Metric { .. } => NodeLabel::Metric,
        }
    }

    /// Key properties as `(property, value)` pairs, in constraint order.
    pub fn properties(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::Table { domain, table_name } => {
                vec![("domain", domain.as_str()), ("table_name", table_name.as_str())]
            }
            Self::Column {
                table_name,
                column_name,
            } => vec![
                ("table_name", table_name.as_str()),
                ("column_name", column_name.as_str()),
            ],
            Self::Concept { name } | Self::Metric { name } => vec![("name", name.as_str())],
        }
    }
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table { domain, table_name } => write!(f, "Table({domain}.{table_name})"),
            Self::Column {
                table_name,
                column_name,
            } => write!(f, "Column({table_name}.{column_name})"),
            Self::Concept { name } => write!(f, "Concept({name})"),
            Self::Metric { name } => write!(f, "Metric({name})"),
        }
    }
}

// ── Nodes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableNode {
    pub domain: String,
    pub table_name: String,
    pub catalog: String,
    pub schema: String,
    pub table_type: String,
    pub business_name: String,
    pub grain: String,
    pub description: String,
    pub tags: Vec<String>,
    pub primary_key: Vec<String>,
    pub time_columns: Vec<String>,
    pub recommended_filters: Vec<String>,
    pub sample_questions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnNode {
    pub domain: String,
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub business_name: Option<String>,
    pub description: String,
    pub semantics: Vec<String>,
    pub unit: Option<String>,
    pub pii: bool,
    pub sensitive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConceptNode {
    pub name: String,
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricNode {
    pub name: String,
    pub business_name: String,
    pub description: String,
    pub expression: String,
    pub base_table: String,
    pub grain: String,
    pub unit: Option<String>,
    pub tags: Vec<String>,
}

/// A node upsert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "label")]
pub enum Node {
    Table(TableNode),
    Column(ColumnNode),
    Concept(ConceptNode),
    Metric(MetricNode),
}

impl Node {
    pub fn key(&self) -> NodeKey {
        match self {
            Self::Table(t) => NodeKey::table(&t.domain, &t.table_name),
            Self::Column(c) => NodeKey::column(&c.table_name, &c.column_name),
            Self::Concept(c) => NodeKey::concept(&c.name),
            Self::Metric(m) => NodeKey::metric(&m.name),
        }
    }
}

// ── Edges ─────────────────────────────────────────────────────────

/// Properties carried by a relationship, by relationship type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeProperties {
    None,
    HasColumn {
        primary_key: bool,
        time_column: bool,
    },
    Join {
        join_type: String,
        on: Vec<String>,
        description: String,
    },
    Fk {
        column: String,
        references_column: String,
        relation: String,
        description: String,
    },
    HasConcept {
        source: String,
    },
}

/// An edge upsert between two keyed nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Edge {
    pub edge_type: EdgeType,
    pub source: NodeKey,
    pub target: NodeKey,
    pub properties: EdgeProperties,
}

impl Edge {
    pub fn new(edge_type: EdgeType, source: NodeKey, target: NodeKey) -> Self {
        Self {
            edge_type,
            source,
            target,
            properties: EdgeProperties::None,
        }
    }

    pub fn with_properties(mut self, properties: EdgeProperties) -> Self {
        self.properties = properties;
        self
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-[:{}]->{}", self.source, self.edge_type, self.target)
    }
}

/// One idempotent write against the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum UpsertOp {
    Node(Node),
    Edge(Edge),
}
