//! Integration tests for the Code Scanning service
//!
//! A fixture server stands in for a GitHub Enterprise Server instance.

mod common;

use ghastoolkit::app::{AlertState, CodeScanning, Repository, RestClient};
use ghastoolkit::errors::{CodeScanningError, RestError};
use serde_json::json;
use tempfile::TempDir;

use common::{test_config, MockResponse, MockServer, TEST_TOKEN};

const ALERTS_PATH: &str = "/api/repos/octo/demo/code-scanning/alerts";

fn codescanning(server: &MockServer, repository: &str) -> CodeScanning {
    let github = server.github(repository, Some(TEST_TOKEN));
    CodeScanning::new(RestClient::new(&github, &test_config()).unwrap()).unwrap()
}

fn pull_request_codescanning(server: &MockServer, reference: &str) -> CodeScanning {
    let repository = Repository::new("octo", "demo").with_reference(reference);
    let github = server
        .github("octo/demo", Some(TEST_TOKEN))
        .with_repository(repository);
    CodeScanning::new(RestClient::new(&github, &test_config()).unwrap()).unwrap()
}

fn alert(number: u64) -> serde_json::Value {
    json!({
        "number": number,
        "state": "open",
        "rule": {"id": format!("js/rule-{}", number), "severity": "warning"},
        "tool": {"name": "CodeQL"}
    })
}

#[tokio::test]
async fn test_get_alerts_filters() {
    let server = MockServer::start(|_| MockResponse::json(200, json!([alert(1), alert(2)]))).await;

    let alerts = codescanning(&server, "octo/demo")
        .get_alerts(AlertState::Fixed, Some("CodeQL"), Some("refs/heads/main"))
        .await
        .unwrap();

    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].rule.id.as_deref(), Some("js/rule-1"));

    let request = &server.requests()[0];
    assert_eq!(request.path, ALERTS_PATH);
    assert_eq!(request.query_param("state"), Some("fixed"));
    assert_eq!(request.query_param("tool_name"), Some("CodeQL"));
    assert_eq!(request.query_param("ref"), Some("refs/heads/main"));
}

#[tokio::test]
async fn test_get_alerts_requires_token() {
    let server = MockServer::start(|_| MockResponse::json(200, json!([]))).await;
    let github = server.github("octo/demo", None);
    let codescanning =
        CodeScanning::new(RestClient::new(&github, &test_config()).unwrap()).unwrap();

    let result = codescanning.get_alerts(AlertState::Open, None, None).await;

    assert!(matches!(
        result,
        Err(CodeScanningError::Rest(RestError::TokenRequired))
    ));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_object_instead_of_list() {
    let server =
        MockServer::start(|_| MockResponse::json(200, json!({"message": "unexpected"}))).await;

    let result = codescanning(&server, "octo/demo")
        .get_alerts(AlertState::Open, None, None)
        .await;

    assert!(matches!(
        result,
        Err(CodeScanningError::UnexpectedShape {
            what: "alerts",
            scope: "Repository"
        })
    ));
}

#[tokio::test]
async fn test_organization_alerts() {
    let server = MockServer::start(|_| MockResponse::json(200, json!([alert(5)]))).await;

    let alerts = codescanning(&server, "octo/demo")
        .get_organization_alerts(AlertState::Open)
        .await
        .unwrap();

    assert_eq!(alerts.len(), 1);
    assert_eq!(
        server.requests()[0].path,
        "/api/orgs/octo/code-scanning/alerts"
    );
}

#[tokio::test]
async fn test_alerts_in_pull_request() {
    let server = MockServer::start(|request| {
        if request.path == ALERTS_PATH {
            return MockResponse::json(200, json!([alert(1), alert(2), alert(3)]));
        }
        // Alert 1 already exists on the base branch
        if request.path == format!("{}/1/instances", ALERTS_PATH) {
            return MockResponse::json(200, json!([{"ref": "refs/heads/main", "state": "open"}]));
        }
        MockResponse::json(200, json!([]))
    })
    .await;

    let alerts = pull_request_codescanning(&server, "refs/pull/12/merge")
        .get_alerts_in_pr("refs/heads/main")
        .await
        .unwrap();

    let numbers: Vec<u64> = alerts.iter().map(|a| a.number).collect();
    assert_eq!(numbers, vec![2, 3]);

    let requests = server.requests();
    let list = requests.iter().find(|r| r.path == ALERTS_PATH).unwrap();
    assert_eq!(list.query_param("ref"), Some("refs/pull/12/merge"));
    assert_eq!(list.query_param("state"), Some("open"));

    let lookups: Vec<_> = requests
        .iter()
        .filter(|r| r.path.ends_with("/instances"))
        .collect();
    assert_eq!(lookups.len(), 3);
    assert!(lookups
        .iter()
        .all(|r| r.query_param("ref") == Some("refs/heads/main")));
}

#[tokio::test]
async fn test_alerts_in_pr_outside_pull_request() {
    let server = MockServer::start(|_| MockResponse::json(200, json!([alert(1)]))).await;

    let alerts = codescanning(&server, "octo/demo@main")
        .get_alerts_in_pr("refs/heads/main")
        .await
        .unwrap();

    assert!(alerts.is_empty());
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_latest_analyses() {
    let server = MockServer::start(|_| {
        MockResponse::json(
            200,
            json!([
                {"id": 30, "tool": {"name": "CodeQL"}, "ref": "refs/heads/main"},
                {"id": 29, "tool": {"name": "ESLint"}, "ref": "refs/heads/main"},
                {"id": 28, "tool": {"name": "CodeQL"}, "ref": "refs/heads/main"}
            ]),
        )
    })
    .await;

    let analyses = codescanning(&server, "octo/demo@main")
        .get_latest_analyses(None, None)
        .await
        .unwrap();

    let ids: Vec<u64> = analyses.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![30, 29]);

    let request = &server.requests()[0];
    assert_eq!(request.path, "/api/repos/octo/demo/code-scanning/analyses");
    // The repository reference is used when none is given
    assert_eq!(request.query_param("ref"), Some("refs/heads/main"));
}

#[tokio::test]
async fn test_download_sarif() {
    let server = MockServer::start(|request| {
        if request.header("accept") == Some("application/sarif+json") {
            MockResponse::json(200, json!({"version": "2.1.0", "runs": []}))
        } else {
            MockResponse::json(406, json!({"message": "wrong accept"}))
        }
    })
    .await;
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out").join("results.sarif");

    codescanning(&server, "octo/demo")
        .download_sarif(&output, 201)
        .await
        .unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(saved["version"], "2.1.0");
    assert_eq!(
        server.requests()[0].path,
        "/api/repos/octo/demo/code-scanning/analyses/201"
    );
}

#[tokio::test]
async fn test_codeql_databases() {
    let server = MockServer::start(|request| {
        if request.path.ends_with("/databases") {
            MockResponse::json(
                200,
                json!([{"id": 1, "language": "java", "size": 1024, "uploader": {"login": "octocat"}}]),
            )
        } else {
            MockResponse::json(200, json!({"id": 2, "language": "python"}))
        }
    })
    .await;
    let codescanning = codescanning(&server, "octo/demo");

    let databases = codescanning.get_codeql_databases().await.unwrap();
    assert_eq!(databases.len(), 1);
    assert_eq!(databases[0].uploader.login.as_deref(), Some("octocat"));

    let database = codescanning.get_codeql_database("python").await.unwrap();
    assert_eq!(database.language.as_deref(), Some("python"));
    assert_eq!(
        server.requests()[1].path,
        "/api/repos/octo/demo/code-scanning/codeql/databases/python"
    );
}
