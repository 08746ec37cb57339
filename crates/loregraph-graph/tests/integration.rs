//! Integration tests for loregraph-graph against a live Neo4j instance.
//!
//! These tests require a local Neo4j to be running.
//! Run with: cargo test --package loregraph-graph --test integration -- --ignored
//!
//! Skipped automatically if Neo4j is not available.

use loregraph_graph::{ErrorCategory, GraphClient, GraphConfig, GraphError};

async fn connect_or_skip() -> Option<GraphClient> {
    let config = GraphConfig::default();
    match GraphClient::connect(&config).await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test (Neo4j not available): {e}");
            None
        }
    }
}

async fn seed_lore(client: &GraphClient, marker: &str) {
    let q = neo4rs::query(
        "MERGE (a:Entity {id: $knight, seed: $marker})
         MERGE (b:Entity {id: $sword, seed: $marker})
         MERGE (a)-[:wield]->(b)",
    )
    .param("knight", "Black Knights")
    .param("sword", "Black Knight Sword")
    .param("marker", marker.to_string());
    client.run(q).await.unwrap();
}

async fn cleanup(client: &GraphClient, marker: &str) {
    let q = neo4rs::query("MATCH (n {seed: $marker}) DETACH DELETE n")
        .param("marker", marker.to_string());
    let _ = client.run(q).await;
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn execute_read_returns_ordered_rows() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    let marker = uuid_marker();
    cleanup(&client, &marker).await;
    seed_lore(&client, &marker).await;

    let rows = client
        .execute_read(&format!(
            "MATCH (a:Entity {{seed: '{marker}'}})-[r:wield]->(b:Entity)
             RETURN a.id AS source, type(r) AS relation, b.id AS target
             ORDER BY target"
        ))
        .await
        .unwrap();

    assert_eq!(rows.row_count(), 1);
    let row = &rows.rows[0];
    assert_eq!(row.get("source").and_then(|v| v.as_str()), Some("Black Knights"));
    assert_eq!(row.get("relation").and_then(|v| v.as_str()), Some("wield"));

    cleanup(&client, &marker).await;
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn execute_read_empty_result() {
    let Some(client) = connect_or_skip().await else {
        return;
    };

    let rows = client
        .execute_read("MATCH (n:Entity {id: 'no-such-entity-anywhere'}) RETURN n.id AS id")
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert_eq!(rows.row_count(), 0);
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn syntax_error_is_categorized() {
    let Some(client) = connect_or_skip().await else {
        return;
    };

    let err = client
        .execute_read("MATCH (n:Entity RETURN n")
        .await
        .unwrap_err();

    match err {
        GraphError::Execution { category, .. } => {
            assert_eq!(category, ErrorCategory::Syntax);
        }
        other => panic!("expected Execution error, got: {other}"),
    }
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn ping_succeeds() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    client.ping().await.unwrap();
}

fn uuid_marker() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    format!("it-{nanos}")
}
