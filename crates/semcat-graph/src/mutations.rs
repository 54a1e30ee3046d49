//! Write operations for the catalog graph.
//!
//! All mutations use MERGE (upsert) semantics keyed on the uniqueness
//! constraints, followed by a plain SET, so properties are overwritten on
//! every load rather than accumulated.

use neo4rs::{query, Query};

use semcat_core::types::{ColumnNode, ConceptNode, MetricNode, TableNode};
use semcat_core::{Edge, EdgeProperties, Node, NodeKey};

use crate::client::{GraphClient, GraphError};

/// Uniqueness constraints backing the node keys.
const CONSTRAINTS: [(&str, &str); 4] = [
    (
        "table_unique",
        "CREATE CONSTRAINT table_unique IF NOT EXISTS
         FOR (t:Table) REQUIRE (t.domain, t.table_name) IS UNIQUE",
    ),
    (
        "column_unique",
        "CREATE CONSTRAINT column_unique IF NOT EXISTS
         FOR (c:Column) REQUIRE (c.table_name, c.column_name) IS UNIQUE",
    ),
    (
        "concept_unique",
        "CREATE CONSTRAINT concept_unique IF NOT EXISTS
         FOR (k:Concept) REQUIRE k.name IS UNIQUE",
    ),
    (
        "metric_unique",
        "CREATE CONSTRAINT metric_unique IF NOT EXISTS
         FOR (m:Metric) REQUIRE m.name IS UNIQUE",
    ),
];

/// Result of an edge upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// The relationship was created or updated.
    Written,
    /// One of the endpoints does not exist, nothing was written.
    MissingEndpoint,
}

/// Counts of nodes removed by [`GraphClient::clear_domain`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClearSummary {
    pub tables: i64,
    pub columns: i64,
    pub metrics: i64,
    pub concepts: i64,
}

impl GraphClient {
    // ── Schema ───────────────────────────────────────────────────

    /// Create the node-key uniqueness constraints if they are absent.
    ///
    /// "Already exists" answers count as success. Other statement failures
    /// are logged and skipped; connection failures are returned.
    pub async fn ensure_constraints(&self) -> Result<(), GraphError> {
        for (name, cypher) in CONSTRAINTS {
            match self.run(query(cypher)).await {
                Ok(()) => tracing::debug!(constraint = name, "Constraint verified"),
                Err(e) if e.is_connection() => return Err(e),
                Err(e) if is_already_exists(&e) => {
                    tracing::debug!(constraint = name, "Constraint already exists")
                }
                Err(e) => tracing::warn!(constraint = name, error = %e, "Constraint not created"),
            }
        }
        tracing::info!("Constraints created/verified");
        Ok(())
    }

    // ── Node Upserts ─────────────────────────────────────────────

    /// Upsert any node type into the graph.
    pub async fn upsert_node(&self, node: &Node) -> Result<(), GraphError> {
        match node {
            Node::Table(t) => self.upsert_table(t).await,
            Node::Column(c) => self.upsert_column(c).await,
            Node::Concept(c) => self.upsert_concept(c).await,
            Node::Metric(m) => self.upsert_metric(m).await,
        }
    }

    /// Upsert a Table node.
    pub async fn upsert_table(&self, table: &TableNode) -> Result<(), GraphError> {
        let q = query(
            "MERGE (n:Table {domain: $domain, table_name: $table_name})
             SET n.name = $table_name, n.catalog = $catalog, n.schema = $schema,
                 n.table_type = $table_type, n.business_name = $business_name,
                 n.grain = $grain, n.description = $description, n.tags = $tags,
                 n.primary_key = $primary_key, n.time_columns = $time_columns,
                 n.recommended_filters = $recommended_filters,
                 n.sample_questions = $sample_questions",
        )
        .param("domain", table.domain.clone())
        .param("table_name", table.table_name.clone())
        .param("catalog", table.catalog.clone())
        .param("schema", table.schema.clone())
        .param("table_type", table.table_type.clone())
        .param("business_name", table.business_name.clone())
        .param("grain", table.grain.clone())
        .param("description", table.description.clone())
        .param("tags", table.tags.clone())
        .param("primary_key", table.primary_key.clone())
        .param("time_columns", table.time_columns.clone())
        .param("recommended_filters", table.recommended_filters.clone())
        .param("sample_questions", table.sample_questions.clone());

        self.run(q).await
    }

    /// Upsert a Column node.
    pub async fn upsert_column(&self, column: &ColumnNode) -> Result<(), GraphError> {
        let q = query(
            "MERGE (n:Column {table_name: $table_name, column_name: $column_name})
             SET n.name = $column_name, n.domain = $domain, n.data_type = $data_type,
                 n.business_name = $business_name, n.description = $description,
                 n.semantics = $semantics, n.unit = $unit, n.pii = $pii,
                 n.sensitive = $sensitive",
        )
        .param("table_name", column.table_name.clone())
        .param("column_name", column.column_name.clone())
        .param("domain", column.domain.clone())
        .param("data_type", column.data_type.clone())
        .param("business_name", opt_string(&column.business_name))
        .param("description", column.description.clone())
        .param("semantics", column.semantics.clone())
        .param("unit", opt_string(&column.unit))
        .param("pii", column.pii)
        .param("sensitive", column.sensitive);

        self.run(q).await
    }

    /// Upsert a Concept node.
    pub async fn upsert_concept(&self, concept: &ConceptNode) -> Result<(), GraphError> {
        let q = query(
            "MERGE (n:Concept {name: $name})
             SET n.synonyms = $synonyms",
        )
        .param("name", concept.name.clone())
        .param("synonyms", concept.synonyms.clone());

        self.run(q).await
    }

    /// Upsert a Metric node.
    pub async fn upsert_metric(&self, metric: &MetricNode) -> Result<(), GraphError> {
        let q = query(
            "MERGE (n:Metric {name: $name})
             SET n.business_name = $business_name, n.description = $description,
                 n.expression = $expression, n.base_table = $base_table,
                 n.grain = $grain, n.unit = $unit, n.tags = $tags",
        )
        .param("name", metric.name.clone())
        .param("business_name", metric.business_name.clone())
        .param("description", metric.description.clone())
        .param("expression", metric.expression.clone())
        .param("base_table", metric.base_table.clone())
        .param("grain", metric.grain.clone())
        .param("unit", opt_string(&metric.unit))
        .param("tags", metric.tags.clone());

        self.run(q).await
    }

    // ── Edge Upserts ─────────────────────────────────────────────

    /// Upsert a relationship between two keyed nodes.
    ///
    /// Both endpoints are matched by key; if either is missing the MERGE
    /// never runs and [`EdgeOutcome::MissingEndpoint`] is returned.
    pub async fn upsert_edge(&self, edge: &Edge) -> Result<EdgeOutcome, GraphError> {
        let count = self.query_count(edge_query(edge)).await?;
        if count > 0 {
            Ok(EdgeOutcome::Written)
        } else {
            Ok(EdgeOutcome::MissingEndpoint)
        }
    }

    // ── Domain Cleanup ───────────────────────────────────────────

    /// Delete a domain's tables, their columns, metrics based on them,
    /// and any concepts left without relationships.
    pub async fn clear_domain(&self, domain: &str) -> Result<ClearSummary, GraphError> {
        let rows = self
            .query_rows(
                query("MATCH (t:Table {domain: $domain}) RETURN t.table_name AS table_name")
                    .param("domain", domain.to_string()),
            )
            .await?;
        let table_names: Vec<String> = rows
            .iter()
            .filter_map(|row| row.get::<String>("table_name").ok())
            .collect();

        let mut summary = ClearSummary::default();
        if !table_names.is_empty() {
            summary.columns = self
                .query_count(
                    query(
                        "MATCH (c:Column {domain: $domain})
                         WHERE c.table_name IN $table_names
                         DETACH DELETE c
                         RETURN count(c) AS cnt",
                    )
                    .param("domain", domain.to_string())
                    .param("table_names", table_names.clone()),
                )
                .await?;

            summary.metrics = self
                .query_count(
                    query(
                        "MATCH (m:Metric)
                         WHERE m.base_table IN $table_names
                            OR (m)-[:METRIC_BASE_TABLE]->(:Table {domain: $domain})
                         DETACH DELETE m
                         RETURN count(m) AS cnt",
                    )
                    .param("domain", domain.to_string())
                    .param("table_names", table_names.clone()),
                )
                .await?;
        }

        summary.tables = self
            .query_count(
                query(
                    "MATCH (t:Table {domain: $domain})
                     DETACH DELETE t
                     RETURN count(t) AS cnt",
                )
                .param("domain", domain.to_string()),
            )
            .await?;

        summary.concepts = self
            .query_count(query(
                "MATCH (c:Concept)
                 WHERE NOT (c)<-[:HAS_CONCEPT]-() AND NOT (c)<-[:HAS_SEMANTIC]-()
                 DELETE c
                 RETURN count(c) AS cnt",
            ))
            .await?;

        tracing::info!(
            domain,
            tables = summary.tables,
            columns = summary.columns,
            metrics = summary.metrics,
            concepts = summary.concepts,
            "Cleared domain"
        );
        Ok(summary)
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Build the MATCH/MATCH/MERGE/SET statement for an edge.
fn edge_query(edge: &Edge) -> Query {
    let (source_pattern, source_params) = node_pattern("a", &edge.source);
    let (target_pattern, target_params) = node_pattern("b", &edge.target);
    let rel_type = edge.edge_type.as_cypher();

    let (merge_key, set_clause) = match &edge.properties {
        EdgeProperties::None => ("", ""),
        EdgeProperties::HasColumn { .. } => (
            "",
            "SET r.primary_key = $primary_key, r.time_column = $time_column",
        ),
        EdgeProperties::Join { .. } => (
            "",
            "SET r.join_type = $join_type, r.on = $on, r.description = $description",
        ),
        // A table may hold several FKs to the same target; the column tells them apart.
        EdgeProperties::Fk { .. } => (
            " {column: $column}",
            "SET r.references_column = $references_column, r.relation = $relation,
                 r.description = $description",
        ),
        EdgeProperties::HasConcept { .. } => ("", "SET r.source = $source"),
    };

    let cypher = format!(
        "MATCH {source_pattern}
         MATCH {target_pattern}
         MERGE (a)-[r:{rel_type}{merge_key}]->(b)
         {set_clause}
         RETURN count(r) AS cnt"
    );

    let mut q = query(&cypher);
    for (name, value) in source_params.into_iter().chain(target_params) {
        q = q.param(&name, value);
    }

    match &edge.properties {
        EdgeProperties::None => q,
        EdgeProperties::HasColumn {
            primary_key,
            time_column,
        } => q
            .param("primary_key", *primary_key)
            .param("time_column", *time_column),
        EdgeProperties::Join {
            join_type,
            on,
            description,
        } => q
            .param("join_type", join_type.clone())
            .param("on", on.clone())
            .param("description", description.clone()),
        EdgeProperties::Fk {
            column,
            references_column,
            relation,
            description,
        } => q
            .param("column", column.clone())
            .param("references_column", references_column.clone())
            .param("relation", relation.clone())
            .param("description", description.clone()),
        EdgeProperties::HasConcept { source } => q.param("source", source.clone()),
    }
}

/// Render `(var:Label {prop: $var_prop, ...})` plus its parameters.
fn node_pattern(var: &str, key: &NodeKey) -> (String, Vec<(String, String)>) {
    let mut props = Vec::new();
    let mut params = Vec::new();
    for (prop, value) in key.properties() {
        let param = format!("{var}_{prop}");
        props.push(format!("{prop}: ${param}"));
        params.push((param, value.to_string()));
    }
    let pattern = format!("({var}:{} {{{}}})", key.label(), props.join(", "));
    (pattern, params)
}

fn is_already_exists(err: &GraphError) -> bool {
    let msg = err.to_string();
    msg.contains("already exists") || msg.contains("EquivalentSchemaRuleAlreadyExists")
}

fn opt_string(opt: &Option<String>) -> String {
    opt.clone().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_pattern_table() {
        let (pattern, params) = node_pattern("a", &NodeKey::table("retail", "orders"));
        assert_eq!(
            pattern,
            "(a:Table {domain: $a_domain, table_name: $a_table_name})"
        );
        assert_eq!(
            params,
            vec![
                ("a_domain".to_string(), "retail".to_string()),
                ("a_table_name".to_string(), "orders".to_string()),
            ]
        );
    }

    #[test]
    fn test_node_pattern_concept() {
        let (pattern, params) = node_pattern("b", &NodeKey::concept("money"));
        assert_eq!(pattern, "(b:Concept {name: $b_name})");
        assert_eq!(params, vec![("b_name".to_string(), "money".to_string())]);
    }

    #[test]
    fn test_opt_string() {
        assert_eq!(opt_string(&Some("VND".to_string())), "VND");
        assert_eq!(opt_string(&None), "");
    }
}
