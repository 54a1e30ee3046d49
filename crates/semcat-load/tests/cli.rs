//! End-to-end checks of the `semcat-load` binary that need no database.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn semcat_load(args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_semcat-load"));
    cmd.args(args)
        .env_remove("NEO4J_URI")
        .env_remove("NEO4J_USER")
        .env_remove("NEO4J_PASSWORD")
        .env_remove("NEO4J_DATABASE")
        .env("RUST_LOG", "info");
    for (k, v) in envs {
        cmd.env(k, v);
    }
    cmd.output().expect("failed to run semcat-load")
}

fn write(dir: &Path, rel: &str, contents: &str) {
    let target = dir.join(rel);
    fs::create_dir_all(target.parent().unwrap()).unwrap();
    fs::write(target, contents).unwrap();
}

fn retail_domain(root: &Path) {
    write(
        root,
        "retail/tables/orders.yaml",
        r#"
table_name: orders
domain: retail
primary_key: [order_id]
foreign_keys:
  - column: vendor_id
    references_table: lakehouse.sales.vendor
    references_column: id
  - column: customer_id
    references_table: customer
    references_column: id
columns:
  order_id: {data_type: bigint}
  vendor_id: {data_type: bigint}
"#,
    );
    write(
        root,
        "retail/tables/vendor.yaml",
        "table_name: vendor\ndomain: retail\ncolumns:\n  id: {data_type: bigint}\n",
    );
    write(
        root,
        "retail/metrics.yaml",
        "metrics:\n  - {name: order_count, expression: COUNT(*), base_table: orders}\n",
    );
}

#[test]
fn test_missing_password_fails_before_reading_metadata() {
    let root = tempfile::tempdir().unwrap();
    let missing_root = root.path().join("does-not-exist");

    let out = semcat_load(
        &["--metadata-root", missing_root.to_str().unwrap()],
        &[("NEO4J_URI", "bolt://127.0.0.1:1"), ("NEO4J_USER", "neo4j")],
    );

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("NEO4J_PASSWORD"), "stderr: {stderr}");
    assert!(!stderr.contains("metadata root not found"), "stderr: {stderr}");
}

#[test]
fn test_missing_domain_exits_non_zero() {
    let root = tempfile::tempdir().unwrap();

    let out = semcat_load(
        &[
            "--dry-run",
            "--domain",
            "retail",
            "--metadata-root",
            root.path().to_str().unwrap(),
        ],
        &[],
    );

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("domain directory not found"), "stderr: {stderr}");
}

#[test]
fn test_parse_error_exits_non_zero() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "retail/tables/broken.yaml", "domain: retail\n");

    let out = semcat_load(
        &[
            "--dry-run",
            "--domain",
            "retail",
            "--metadata-root",
            root.path().to_str().unwrap(),
        ],
        &[],
    );

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("broken.yaml"), "stderr: {stderr}");
}

#[test]
fn test_dry_run_prints_plan_without_credentials() {
    let root = tempfile::tempdir().unwrap();
    retail_domain(root.path());

    let out = semcat_load(
        &[
            "--dry-run",
            "--domain",
            "retail",
            "--metadata-root",
            root.path().to_str().unwrap(),
        ],
        &[],
    );

    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let plan: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(plan["domain"], "retail");

    let ops = plan["ops"].as_array().unwrap();
    let fks: Vec<&serde_json::Value> = ops
        .iter()
        .filter(|op| op["op"] == "edge" && op["edge_type"] == "FK")
        .collect();
    assert_eq!(fks.len(), 1);
    assert_eq!(fks[0]["properties"]["column"], "vendor_id");
    assert_eq!(fks[0]["target"]["table_name"], "vendor");

    let metric_edges = ops
        .iter()
        .filter(|op| op["edge_type"] == "METRIC_BASE_TABLE" || op["edge_type"] == "HAS_METRIC")
        .count();
    assert_eq!(metric_edges, 2);

    // The FK to `customer` is reported, not fatal.
    let warnings = plan["warnings"].as_array().unwrap();
    assert!(warnings
        .iter()
        .any(|w| w["kind"] == "dangling_foreign_key" && w["column"] == "customer_id"));
}
