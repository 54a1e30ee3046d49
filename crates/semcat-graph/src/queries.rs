//! Read operations for the catalog graph.

use neo4rs::query;

use semcat_core::{EdgeType, NodeKey, NodeLabel};

use crate::client::{GraphClient, GraphError};

/// A lightweight record returned from node queries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NodeRecord {
    pub label: String,
    pub properties: serde_json::Value,
}

/// A lightweight record returned from relationship queries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EdgeRecord {
    pub edge_type: String,
    pub properties: serde_json::Value,
}

/// Node and relationship counts for one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct DomainSummary {
    pub tables: i64,
    pub columns: i64,
    pub metrics: i64,
    pub concepts: i64,
    pub joins: i64,
    pub foreign_keys: i64,
}

/// Every property name the loader writes, across labels and relationship types.
const KNOWN_PROPERTIES: &[&str] = &[
    "domain",
    "table_name",
    "column_name",
    "name",
    "catalog",
    "schema",
    "table_type",
    "business_name",
    "grain",
    "description",
    "tags",
    "primary_key",
    "time_columns",
    "recommended_filters",
    "sample_questions",
    "data_type",
    "semantics",
    "unit",
    "pii",
    "sensitive",
    "synonyms",
    "expression",
    "base_table",
    "time_column",
    "join_type",
    "on",
    "column",
    "references_column",
    "relation",
    "source",
];

impl GraphClient {
    // ── Counts ───────────────────────────────────────────────────

    /// Count all nodes with the given label.
    pub async fn count_nodes(&self, label: NodeLabel) -> Result<i64, GraphError> {
        let cypher = format!("MATCH (n:{label}) RETURN count(n) AS cnt");
        self.query_count(query(&cypher)).await
    }

    /// Count all relationships of the given type.
    pub async fn count_relationships(&self, edge_type: EdgeType) -> Result<i64, GraphError> {
        let rel_type = edge_type.as_cypher();
        let cypher = format!("MATCH ()-[r:{rel_type}]->() RETURN count(r) AS cnt");
        self.query_count(query(&cypher)).await
    }

    /// Count what a domain currently contributes to the graph.
    pub async fn domain_summary(&self, domain: &str) -> Result<DomainSummary, GraphError> {
        let count = move |cypher: &'static str| {
            self.query_count(query(cypher).param("domain", domain.to_string()))
        };

        Ok(DomainSummary {
            tables: count("MATCH (t:Table {domain: $domain}) RETURN count(t) AS cnt").await?,
            columns: count(
                "MATCH (:Table {domain: $domain})-[:HAS_COLUMN]->(c:Column)
                 RETURN count(DISTINCT c) AS cnt",
            )
            .await?,
            metrics: count(
                "MATCH (m:Metric)-[:METRIC_BASE_TABLE]->(:Table {domain: $domain})
                 RETURN count(DISTINCT m) AS cnt",
            )
            .await?,
            concepts: count(
                "MATCH (:Table {domain: $domain})-[:HAS_CONCEPT]->(k:Concept)
                 RETURN count(DISTINCT k) AS cnt",
            )
            .await?,
            joins: count(
                "MATCH (:Table {domain: $domain})-[r:JOIN]->(:Table)
                 RETURN count(r) AS cnt",
            )
            .await?,
            foreign_keys: count(
                "MATCH (:Table {domain: $domain})-[r:FK]->(:Table)
                 RETURN count(r) AS cnt",
            )
            .await?,
        })
    }

    // ── Lookups ──────────────────────────────────────────────────

    /// Get a node by its key, if present.
    pub async fn get_node(&self, key: &NodeKey) -> Result<Option<NodeRecord>, GraphError> {
        let props: Vec<String> = key
            .properties()
            .iter()
            .map(|(prop, _)| format!("{prop}: ${prop}"))
            .collect();
        let cypher = format!(
            "MATCH (n:{} {{{}}}) RETURN n LIMIT 1",
            key.label(),
            props.join(", ")
        );

        let mut q = query(&cypher);
        for (prop, value) in key.properties() {
            q = q.param(prop, value.to_string());
        }

        match self.query_one(q).await? {
            Some(row) => {
                let node: neo4rs::Node = row.get("n").map_err(|e| {
                    GraphError::Serialization(format!("Failed to deserialize node: {e}"))
                })?;
                Ok(Some(NodeRecord {
                    label: key.label().to_string(),
                    properties: node_properties(&node),
                }))
            }
            None => Ok(None),
        }
    }

    /// List the Column nodes attached to a table, ordered by column name.
    pub async fn table_columns(
        &self,
        domain: &str,
        table_name: &str,
    ) -> Result<Vec<NodeRecord>, GraphError> {
        let q = query(
            "MATCH (:Table {domain: $domain, table_name: $table_name})-[:HAS_COLUMN]->(c:Column)
             RETURN c
             ORDER BY c.column_name",
        )
        .param("domain", domain.to_string())
        .param("table_name", table_name.to_string());

        let rows = self.query_rows(q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let node: neo4rs::Node = row.get("c").map_err(|e| {
                GraphError::Serialization(format!("Failed to deserialize column: {e}"))
            })?;
            results.push(NodeRecord {
                label: NodeLabel::Column.to_string(),
                properties: node_properties(&node),
            });
        }
        Ok(results)
    }

    /// List relationships of one type from `source` to `target`.
    pub async fn relationships_between(
        &self,
        source: &NodeKey,
        target: &NodeKey,
        edge_type: EdgeType,
    ) -> Result<Vec<EdgeRecord>, GraphError> {
        let source_props: Vec<String> = source
            .properties()
            .iter()
            .map(|(prop, _)| format!("{prop}: $a_{prop}"))
            .collect();
        let target_props: Vec<String> = target
            .properties()
            .iter()
            .map(|(prop, _)| format!("{prop}: $b_{prop}"))
            .collect();
        let cypher = format!(
            "MATCH (a:{} {{{}}})-[r:{}]->(b:{} {{{}}})
             RETURN r",
            source.label(),
            source_props.join(", "),
            edge_type.as_cypher(),
            target.label(),
            target_props.join(", "),
        );

        let mut q = query(&cypher);
        for (prop, value) in source.properties() {
            q = q.param(&format!("a_{prop}"), value.to_string());
        }
        for (prop, value) in target.properties() {
            q = q.param(&format!("b_{prop}"), value.to_string());
        }

        let rows = self.query_rows(q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let rel: neo4rs::Relation = row
                .get("r")
                .map_err(|e| GraphError::Serialization(format!("Failed to get relation: {e}")))?;
            results.push(EdgeRecord {
                edge_type: edge_type.as_cypher().to_string(),
                properties: relation_properties(&rel),
            });
        }
        Ok(results)
    }
}

/// Copy the known catalog properties of a node into a JSON object.
fn node_properties(node: &neo4rs::Node) -> serde_json::Value {
    collect_properties(|key| {
        property_value(
            || node.get::<String>(key).ok(),
            || node.get::<bool>(key).ok(),
            || node.get::<Vec<String>>(key).ok(),
        )
    })
}

/// Copy the known catalog properties of a relationship into a JSON object.
fn relation_properties(rel: &neo4rs::Relation) -> serde_json::Value {
    collect_properties(|key| {
        property_value(
            || rel.get::<String>(key).ok(),
            || rel.get::<bool>(key).ok(),
            || rel.get::<Vec<String>>(key).ok(),
        )
    })
}

fn collect_properties(
    mut lookup: impl FnMut(&str) -> Option<serde_json::Value>,
) -> serde_json::Value {
    let mut props = serde_json::Map::new();
    for key in KNOWN_PROPERTIES {
        if let Some(value) = lookup(key) {
            props.insert((*key).to_string(), value);
        }
    }
    serde_json::Value::Object(props)
}

/// Try string, then bool, then string list.
fn property_value(
    as_string: impl FnOnce() -> Option<String>,
    as_bool: impl FnOnce() -> Option<bool>,
    as_list: impl FnOnce() -> Option<Vec<String>>,
) -> Option<serde_json::Value> {
    if let Some(s) = as_string() {
        return Some(serde_json::Value::String(s));
    }
    if let Some(b) = as_bool() {
        return Some(serde_json::Value::Bool(b));
    }
    as_list().map(|items| {
        serde_json::Value::Array(items.into_iter().map(serde_json::Value::String).collect())
    })
}
