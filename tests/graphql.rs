//! Integration tests for the GraphQL client

mod common;

use std::collections::HashMap;

use ghastoolkit::app::GraphQlClient;
use ghastoolkit::errors::GraphQlError;
use serde_json::json;
use tempfile::TempDir;

use common::{test_config, MockResponse, MockServer, TEST_TOKEN};

const REPOSITORY_QUERY: &str = r#"{
  repository(owner: "$owner", name: "$repo") {
    vulnerabilityAlerts(first: 100, $cursor) { totalCount }
  }
}"#;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

async fn client(server: &MockServer) -> GraphQlClient {
    let github = server.github("octo/demo", Some(TEST_TOKEN));
    let mut client = GraphQlClient::new(&github, &test_config()).unwrap();
    client.register("RepositoryAlerts", REPOSITORY_QUERY);
    client
}

#[tokio::test]
async fn test_query_substitutes_variables() {
    let server = MockServer::start(|_| {
        MockResponse::json(
            200,
            json!({"data": {"repository": {"vulnerabilityAlerts": {"totalCount": 2}}}}),
        )
    })
    .await;

    let result = client(&server)
        .await
        .query(
            "RepositoryAlerts",
            &vars(&[("owner", "octo"), ("repo", "demo"), ("cursor", "")]),
        )
        .await
        .unwrap();

    assert_eq!(
        result["data"]["repository"]["vulnerabilityAlerts"]["totalCount"],
        2
    );

    let request = &server.requests()[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/api/graphql");
    assert_eq!(
        request.header("authorization"),
        Some(format!("token {}", TEST_TOKEN).as_str())
    );

    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    let query = body["query"].as_str().unwrap();
    assert!(query.contains(r#"repository(owner: "octo", name: "demo")"#));
    assert!(query.contains("vulnerabilityAlerts(first: 100, )"));
}

#[tokio::test]
async fn test_unknown_query_returns_empty_object() {
    let server = MockServer::start(|_| MockResponse::json(200, json!({"data": {}}))).await;

    let result = client(&server)
        .await
        .query("DoesNotExist", &HashMap::new())
        .await
        .unwrap();

    assert_eq!(result, json!({}));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_graphql_errors_are_returned() {
    let server = MockServer::start(|_| {
        MockResponse::json(
            200,
            json!({"data": null, "errors": [{"message": "Could not resolve to a Repository"}]}),
        )
    })
    .await;

    let result = client(&server)
        .await
        .query(
            "RepositoryAlerts",
            &vars(&[("owner", "octo"), ("repo", "gone"), ("cursor", "")]),
        )
        .await
        .unwrap();

    assert!(result["errors"].is_array());
}

#[tokio::test]
async fn test_missing_variable_sends_nothing() {
    let server = MockServer::start(|_| MockResponse::json(200, json!({}))).await;

    let result = client(&server)
        .await
        .query("RepositoryAlerts", &vars(&[("owner", "octo")]))
        .await;

    assert!(matches!(result, Err(GraphQlError::MissingVariable { .. })));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_bad_status() {
    let server =
        MockServer::start(|_| MockResponse::json(502, json!({"message": "Bad Gateway"}))).await;

    let result = client(&server)
        .await
        .query(
            "RepositoryAlerts",
            &vars(&[("owner", "octo"), ("repo", "demo"), ("cursor", "")]),
        )
        .await;

    assert!(matches!(result, Err(GraphQlError::Status { status: 502 })));
}

#[tokio::test]
async fn test_queries_loaded_from_directory() {
    let server = MockServer::start(|_| MockResponse::json(200, json!({"data": {"viewer": {}}})))
        .await;
    let temp_dir = TempDir::new().unwrap();
    tokio::fs::write(
        temp_dir.path().join("Viewer.graphql"),
        "{ viewer { login } }",
    )
    .await
    .unwrap();
    tokio::fs::write(temp_dir.path().join("notes.txt"), "ignored")
        .await
        .unwrap();

    let mut client = client(&server).await;
    let loaded = client
        .load_queries(&[temp_dir.path(), temp_dir.path().join("missing").as_path()])
        .await
        .unwrap();

    assert_eq!(loaded, 1);
    assert!(client.query_names().contains(&"Viewer"));
    assert!(client.query_names().contains(&"GetDependencyAlerts"));

    let result = client.query("Viewer", &HashMap::new()).await.unwrap();
    assert_eq!(result, json!({"data": {"viewer": {}}}));
}
