//! Graph persistence: apply a mapped plan to Neo4j.

use serde::Serialize;

use semcat_core::UpsertOp;
use semcat_graph::{EdgeOutcome, GraphClient, GraphError};

use crate::error::{LoadError, Result};
use crate::mapper::GraphPlan;

/// What a write pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub nodes_written: usize,
    pub edges_written: usize,
    /// Edges whose endpoints were not in the graph.
    pub edges_skipped: usize,
    /// Statements that failed and were skipped.
    pub failed: usize,
}

/// Persist a full plan to Neo4j.
///
/// Verifies the connection, ensures constraints, optionally clears the
/// domain, then upserts every operation in order. Individual statement
/// failures are logged and skipped; losing the connection aborts the run.
pub async fn write_plan(graph: &GraphClient, plan: &GraphPlan, clear: bool) -> Result<WriteReport> {
    graph.verify().await.map_err(connection_error)?;
    graph.ensure_constraints().await.map_err(fatal)?;

    if clear {
        graph.clear_domain(&plan.domain).await.map_err(fatal)?;
    }

    let mut report = WriteReport::default();
    for op in &plan.ops {
        match op {
            UpsertOp::Node(node) => match graph.upsert_node(node).await {
                Ok(()) => report.nodes_written += 1,
                Err(e) if e.is_connection() => return Err(connection_error(e)),
                Err(e) => {
                    tracing::warn!(node = %node.key(), error = %e, "Node upsert failed, skipping");
                    report.failed += 1;
                }
            },
            UpsertOp::Edge(edge) => match graph.upsert_edge(edge).await {
                Ok(EdgeOutcome::Written) => report.edges_written += 1,
                Ok(EdgeOutcome::MissingEndpoint) => {
                    tracing::warn!(edge = %edge, "Edge endpoint not in graph, skipping");
                    report.edges_skipped += 1;
                }
                Err(e) if e.is_connection() => return Err(connection_error(e)),
                Err(e) => {
                    tracing::warn!(edge = %edge, error = %e, "Edge upsert failed, skipping");
                    report.failed += 1;
                }
            },
        }
    }

    tracing::info!(
        domain = %plan.domain,
        nodes = report.nodes_written,
        edges = report.edges_written,
        skipped = report.edges_skipped,
        failed = report.failed,
        "Graph build complete"
    );
    Ok(report)
}

fn connection_error(err: GraphError) -> LoadError {
    LoadError::Connection(err.to_string())
}

fn fatal(err: GraphError) -> LoadError {
    if err.is_connection() {
        connection_error(err)
    } else {
        LoadError::Graph(err)
    }
}
