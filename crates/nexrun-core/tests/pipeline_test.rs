#![allow(clippy::unwrap_used)]
// End-to-end pipeline runs against a mock console.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nexrun_api::{BasicCredentials, NexposeClient};
use nexrun_core::{
    CoreError, FsArtifactStore, PipelineOptions, PollPolicy, ResourceId, Session, Stage,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Session) {
    let server = MockServer::start().await;
    let client = NexposeClient::with_client(
        &format!("{}/api/3", server.uri()),
        reqwest::Client::new(),
        BasicCredentials::new("nxadmin", SecretString::from("s3cret".to_string())),
    )
    .unwrap();
    (server, Session::from_client(client))
}

fn options() -> PipelineOptions {
    PipelineOptions {
        scan_policy: PollPolicy::every(Duration::from_millis(5)),
        report_policy: PollPolicy::every(Duration::from_millis(5)),
        save_filename: "r.pdf".into(),
        ..PipelineOptions::default()
    }
}

async fn mount_console(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/3/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "resources": [] })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3/sites"))
        .and(body_partial_json(json!({
            "name": "Web Tier",
            "scan": { "assets": { "includedTargets": { "addresses": ["10.0.0.5"] } } }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 42 })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3/sites/42/scans"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 901 })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/3/scans/901"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 901, "status": "running" })))
        .up_to_n_times(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/3/scans/901"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 901, "status": "finished" })),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/3/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "resources": [] })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3/reports"))
        .and(body_partial_json(json!({
            "name": "Web Tier report - scan ID 901",
            "scope": { "sites": [42] }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 17 })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3/reports/17/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 3 })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/3/reports/17/history/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "complete",
            "generated": "2024-01-01"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/3/reports/17/history/latest/output"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7 report".to_vec()))
        .mount(server)
        .await;
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pipeline_runs_every_stage_in_order() {
    let (server, session) = setup().await;
    mount_console(&server).await;

    let tmp = tempfile::tempdir().unwrap();
    let store = FsArtifactStore::new(tmp.path());

    let report = session
        .run_pipeline(
            "  web tier ",
            "10.0.0.5",
            &options(),
            &store,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.scan_name, "Web Tier");
    assert_eq!(report.site_id, ResourceId::Numeric(42));
    assert_eq!(report.scan_id, ResourceId::Numeric(901));
    assert_eq!(report.scan_status, "finished");
    assert_eq!(report.report_id, ResourceId::Numeric(17));
    assert_eq!(report.generated.as_deref(), Some("2024-01-01"));

    let expected = tmp.path().join("2024-01-01_10.0.0.5").join("r.pdf");
    assert_eq!(report.saved_to, expected);
    assert_eq!(std::fs::read(&expected).unwrap(), b"%PDF-1.7 report");
}

#[tokio::test]
async fn test_pipeline_stops_at_failed_generation_trigger() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/3/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [{ "id": 42, "name": "Web Tier" }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3/sites/42/scans"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 901 })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/3/scans/901"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 901, "status": "finished" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/3/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [{ "id": 17, "scope": { "sites": [42] } }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3/reports/17/generate"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/3/reports/17/history/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "complete" })))
        .expect(0)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let err = session
        .run_pipeline(
            "Web Tier",
            "10.0.0.5",
            &options(),
            &FsArtifactStore::new(tmp.path()),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        CoreError::Stage { stage, source } => {
            assert_eq!(stage, Stage::Generate);
            assert!(matches!(*source, CoreError::Rejected { status: 500, .. }));
        }
        other => panic!("expected stage error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_pipeline_without_scan_id_stops_before_waiting() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/3/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [{ "id": 42, "name": "Web Tier" }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3/sites/42/scans"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/3/scans"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "resources": [] })))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let err = session
        .run_pipeline(
            "Web Tier",
            "10.0.0.5",
            &options(),
            &FsArtifactStore::new(tmp.path()),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::Stage {
            stage: Stage::Scan,
            ..
        }
    ));
    assert!(matches!(err.root(), CoreError::NotFound { .. }));
}
