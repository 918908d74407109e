use jobwatch_engine::{ApiClient, FailureKind, JobLauncher, ReqwestJobLauncher, SyncSettings};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn launcher_for(server: &MockServer) -> ReqwestJobLauncher {
    let settings = SyncSettings::with_base_url(format!("{}/api", server.uri()));
    ReqwestJobLauncher::new(ApiClient::new(&settings).expect("valid base url"))
}

#[tokio::test]
async fn scan_forwards_date_filter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/scan"))
        .and(query_param("newer_than", "2024-02-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "started", "job_id": "5d1c", "newer_than": "2024-02-01"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let started = launcher_for(&server)
        .trigger_scan(Some("2024-02-01"))
        .await
        .expect("scan started");
    assert_eq!(started.status, "started");
    assert_eq!(started.job_id.as_deref(), Some("5d1c"));
}

#[tokio::test]
async fn index_without_filter_omits_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/index"))
        .and(query_param_is_missing("older_than"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "started", "job_id": "index"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let started = launcher_for(&server).trigger_index(None).await.expect("index started");
    assert_eq!(started.job_id.as_deref(), Some("index"));
}

#[tokio::test]
async fn index_already_running_is_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/index"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"detail": "Indexing already in progress"})),
        )
        .mount(&server)
        .await;

    let err = launcher_for(&server).trigger_index(None).await.expect_err("409");
    assert_eq!(err.kind, FailureKind::HttpStatus(409));
    assert_eq!(err.message, "Indexing already in progress");
}

#[tokio::test]
async fn process_documents_posts_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process-documents"))
        .and(body_json(json!({"document_ids": [3, 5, 8]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "started", "job_id": "process-aa", "document_count": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let started = launcher_for(&server)
        .process_documents(&[3, 5, 8])
        .await
        .expect("processing started");
    assert_eq!(started.job_id.as_deref(), Some("process-aa"));
}

#[tokio::test]
async fn invalid_document_ids_never_reach_the_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let launcher = launcher_for(&server);
    let empty = launcher.process_documents(&[]).await.expect_err("empty list");
    assert_eq!(empty.kind, FailureKind::Validation);
    let zero = launcher.process_documents(&[4, 0]).await.expect_err("zero id");
    assert_eq!(zero.kind, FailureKind::Validation);
}

#[tokio::test]
async fn health_check_accepts_ok_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    launcher_for(&server).health().await.expect("healthy");
}
