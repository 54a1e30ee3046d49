//! Graph mapping: turn loaded metadata into keyed upsert operations.
//!
//! Mapping is pure. References that cannot be resolved against the loaded
//! tables are reported as [`MappingWarning`]s and their edges are left out.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use semcat_core::types::{ColumnNode, ConceptNode, MetricNode, TableNode};
use semcat_core::{
    DomainMetadata, Edge, EdgeProperties, EdgeType, MetricDef, Node, NodeKey, TableDef, UpsertOp,
};

/// The ordered upserts for one domain, nodes first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphPlan {
    pub domain: String,
    pub ops: Vec<UpsertOp>,
    pub warnings: Vec<MappingWarning>,
}

impl GraphPlan {
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.ops.iter().filter_map(|op| match op {
            UpsertOp::Node(n) => Some(n),
            UpsertOp::Edge(_) => None,
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.ops.iter().filter_map(|op| match op {
            UpsertOp::Edge(e) => Some(e),
            UpsertOp::Node(_) => None,
        })
    }
}

/// A non-fatal problem found while mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MappingWarning {
    DanglingForeignKey {
        table: String,
        column: String,
        references_table: String,
    },
    DanglingJoin {
        from_table: String,
        to_table: String,
        missing: String,
    },
    DanglingMetricBase {
        metric: String,
        base_table: String,
    },
    UnmatchedSemantic {
        table: String,
        column: String,
        tag: String,
    },
    ConflictingConcept {
        name: String,
        table: String,
    },
}

impl MappingWarning {
    /// Dangling references skip an edge the metadata asked for; the rest
    /// are informational.
    pub fn is_dangling(&self) -> bool {
        matches!(
            self,
            Self::DanglingForeignKey { .. } | Self::DanglingJoin { .. } | Self::DanglingMetricBase { .. }
        )
    }
}

impl std::fmt::Display for MappingWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingForeignKey {
                table,
                column,
                references_table,
            } => write!(
                f,
                "FK {table}.{column} references unknown table {references_table}, skipped"
            ),
            Self::DanglingJoin {
                from_table,
                to_table,
                missing,
            } => write!(
                f,
                "JOIN {from_table} -> {to_table} names unknown table(s) {missing}, skipped"
            ),
            Self::DanglingMetricBase { metric, base_table } => write!(
                f,
                "metric {metric} has unknown base table '{base_table}', edges skipped"
            ),
            Self::UnmatchedSemantic { table, column, tag } => write!(
                f,
                "semantic tag '{tag}' on {table}.{column} matches no concept"
            ),
            Self::ConflictingConcept { name, table } => write!(
                f,
                "concept {name} redeclared by {table} with different synonyms, later declaration wins"
            ),
        }
    }
}

/// Map a domain's metadata to graph upserts.
pub fn map_domain(meta: &DomainMetadata) -> GraphPlan {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut warnings = Vec::new();

    let concepts = collect_concepts(meta, &mut warnings);
    let concept_names: HashSet<&str> = concepts.iter().map(|c| c.name.as_str()).collect();

    for table in &meta.tables {
        let table_key = NodeKey::table(&table.domain, &table.table_name);
        nodes.push(Node::Table(table_node(table)));

        for col in &table.columns {
            let column_key = NodeKey::column(&col.table_name, &col.column_name);
            nodes.push(Node::Column(ColumnNode {
                domain: table.domain.clone(),
                table_name: col.table_name.clone(),
                column_name: col.column_name.clone(),
                data_type: col.data_type.clone(),
                business_name: col.business_name.clone(),
                description: col.description.clone(),
                semantics: col.semantics.clone(),
                unit: col.unit.clone(),
                pii: col.pii,
                sensitive: col.sensitive,
            }));

            edges.push(
                Edge::new(EdgeType::HasColumn, table_key.clone(), column_key.clone())
                    .with_properties(EdgeProperties::HasColumn {
                        primary_key: table.is_primary_key(&col.column_name),
                        time_column: table.is_time_column(&col.column_name),
                    }),
            );

            let mut seen = HashSet::new();
            for tag in &col.semantics {
                if !seen.insert(tag.as_str()) {
                    continue;
                }
                if concept_names.contains(tag.as_str()) {
                    edges.push(Edge::new(
                        EdgeType::HasSemantic,
                        column_key.clone(),
                        NodeKey::concept(tag),
                    ));
                } else {
                    warnings.push(MappingWarning::UnmatchedSemantic {
                        table: table.table_name.clone(),
                        column: col.column_name.clone(),
                        tag: tag.clone(),
                    });
                }
            }
        }

        for concept in &table.concepts {
            edges.push(
                Edge::new(
                    EdgeType::HasConcept,
                    table_key.clone(),
                    NodeKey::concept(&concept.name),
                )
                .with_properties(EdgeProperties::HasConcept {
                    source: "table".to_string(),
                }),
            );
        }

        for fk in &table.foreign_keys {
            match meta.table(fk.target_table()) {
                Some(target) => edges.push(
                    Edge::new(
                        EdgeType::Fk,
                        table_key.clone(),
                        NodeKey::table(&target.domain, &target.table_name),
                    )
                    .with_properties(EdgeProperties::Fk {
                        column: fk.column.clone(),
                        references_column: fk.references_column.clone(),
                        relation: fk.relation.clone(),
                        description: fk.description.clone(),
                    }),
                ),
                None => warnings.push(MappingWarning::DanglingForeignKey {
                    table: table.table_name.clone(),
                    column: fk.column.clone(),
                    references_table: fk.references_table.clone(),
                }),
            }
        }
    }

    nodes.extend(concepts.into_iter().map(Node::Concept));

    for join in &meta.joins {
        let from = meta.table(&join.from_table);
        let to = meta.table(&join.to_table);
        match (from, to) {
            (Some(from), Some(to)) => edges.push(
                Edge::new(
                    EdgeType::Join,
                    NodeKey::table(&from.domain, &from.table_name),
                    NodeKey::table(&to.domain, &to.table_name),
                )
                .with_properties(EdgeProperties::Join {
                    join_type: join.join_type.clone(),
                    on: join.on.clone(),
                    description: join.description.clone(),
                }),
            ),
            (None, None) => warnings.push(MappingWarning::DanglingJoin {
                from_table: join.from_table.clone(),
                to_table: join.to_table.clone(),
                missing: format!("{}, {}", join.from_table, join.to_table),
            }),
            (None, Some(_)) => warnings.push(MappingWarning::DanglingJoin {
                from_table: join.from_table.clone(),
                to_table: join.to_table.clone(),
                missing: join.from_table.clone(),
            }),
            (Some(_), None) => warnings.push(MappingWarning::DanglingJoin {
                from_table: join.from_table.clone(),
                to_table: join.to_table.clone(),
                missing: join.to_table.clone(),
            }),
        }
    }

    for metric in &meta.metrics {
        let metric_key = NodeKey::metric(&metric.name);
        nodes.push(Node::Metric(metric_node(metric)));

        match meta.table(&metric.base_table) {
            Some(base) => {
                let table_key = NodeKey::table(&base.domain, &base.table_name);
                edges.push(Edge::new(
                    EdgeType::MetricBaseTable,
                    metric_key.clone(),
                    table_key.clone(),
                ));
                edges.push(Edge::new(EdgeType::HasMetric, table_key, metric_key));
            }
            None => warnings.push(MappingWarning::DanglingMetricBase {
                metric: metric.name.clone(),
                base_table: metric.base_table.clone(),
            }),
        }
    }

    let mut ops: Vec<UpsertOp> = nodes.into_iter().map(UpsertOp::Node).collect();
    ops.extend(edges.into_iter().map(UpsertOp::Edge));

    GraphPlan {
        domain: meta.domain.clone(),
        ops,
        warnings,
    }
}

/// Log warnings: dangling references at warn, the rest at debug.
pub fn log_warnings(plan: &GraphPlan) {
    for warning in &plan.warnings {
        if warning.is_dangling() {
            tracing::warn!(domain = %plan.domain, "{warning}");
        } else {
            tracing::debug!(domain = %plan.domain, "{warning}");
        }
    }
}

/// Concepts declared by tables, one per name in first-seen order.
/// A later declaration overwrites the synonyms of an earlier one.
fn collect_concepts(meta: &DomainMetadata, warnings: &mut Vec<MappingWarning>) -> Vec<ConceptNode> {
    let mut concepts: Vec<ConceptNode> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for table in &meta.tables {
        for concept in &table.concepts {
            match index.get(concept.name.as_str()) {
                Some(&i) => {
                    if !same_synonyms(&concepts[i].synonyms, &concept.synonyms) {
                        warnings.push(MappingWarning::ConflictingConcept {
                            name: concept.name.clone(),
                            table: table.table_name.clone(),
                        });
                    }
                    concepts[i].synonyms = concept.synonyms.clone();
                }
                None => {
                    index.insert(concept.name.as_str(), concepts.len());
                    concepts.push(ConceptNode {
                        name: concept.name.clone(),
                        synonyms: concept.synonyms.clone(),
                    });
                }
            }
        }
    }
    concepts
}

fn same_synonyms(a: &[String], b: &[String]) -> bool {
    let a: HashSet<&String> = a.iter().collect();
    let b: HashSet<&String> = b.iter().collect();
    a == b
}

fn table_node(table: &TableDef) -> TableNode {
    TableNode {
        domain: table.domain.clone(),
        table_name: table.table_name.clone(),
        catalog: table.catalog.clone(),
        schema: table.schema.clone(),
        table_type: table.table_type.clone(),
        business_name: table.business_name.clone(),
        grain: table.grain.clone(),
        description: table.description.clone(),
        tags: table.tags.clone(),
        primary_key: table.primary_key.clone(),
        time_columns: table.time_columns.clone(),
        recommended_filters: table.recommended_filters.clone(),
        sample_questions: table.sample_questions.clone(),
    }
}

fn metric_node(metric: &MetricDef) -> MetricNode {
    MetricNode {
        name: metric.name.clone(),
        business_name: metric.business_name.clone(),
        description: metric.description.clone(),
        expression: metric.expression.clone(),
        base_table: metric.base_table.clone(),
        grain: metric.grain.clone(),
        unit: metric.unit.clone(),
        tags: metric.tags.clone(),
    }
}
