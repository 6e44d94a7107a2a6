//! API integration tests.
//!
//! Drive the control-plane router directly with `tower::ServiceExt::oneshot`
//! against a temp-dir trust store.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use snowball::api::{AppState, create_router};
use snowball::audit::AuditLogger;
use snowball::pairing::{AutoApproval, PairingCoordinator};
use snowball::policy::ResourcePolicy;
use snowball::resources::ResourceController;
use snowball::sandbox::SandboxManager;
use snowball::trust::TrustStore;
use snowball_protocol::{NodeIdentity, NodeRole};

fn test_app() -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let (store, _) = TrustStore::load(dir.path());

    let identity = NodeIdentity {
        node_id: "test-node".into(),
        hostname: "testhost".into(),
        ip: "127.0.0.1".into(),
        role: NodeRole::Host,
        fingerprint: "SHA256:test".into(),
    };
    let coordinator = Arc::new(PairingCoordinator::new(
        Arc::new(store),
        Arc::new(AutoApproval::granted()),
        AuditLogger::disabled(),
    ));
    let controller = Arc::new(ResourceController::new(
        ResourcePolicy::local(),
        AuditLogger::disabled(),
    ));
    let sandbox = Arc::new(SandboxManager::new(AuditLogger::disabled()));

    let state = AppState {
        identity,
        coordinator,
        controller,
        sandbox,
        discovery_port: 0,
        broadcast_timeout: Duration::from_millis(100),
    };
    (create_router(state), dir)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .method(Method::GET)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .method(Method::POST)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _dir) = test_app();
    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn identity_is_exposed() {
    let (app, _dir) = test_app();
    let (status, body) = get(app, "/identity").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["node_id"], "test-node");
    assert_eq!(body["role"], "host");
}

#[tokio::test]
async fn pairing_flow_over_http() {
    let (app, _dir) = test_app();

    // Request pairing with the historical loose payload shape.
    let (status, request) = post(
        app.clone(),
        "/pairing/request",
        json!({"host_id": "h1", "hostname": "Exon", "ip": "192.168.1.10"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(request["host_id"], "h1");
    assert_eq!(request["approved"], false);
    assert!(request["client_id"].as_str().is_some_and(|c| !c.is_empty()));

    // Approve it.
    let (status, body) = post(
        app.clone(),
        "/pairing/approve",
        json!({"request_id": request["request_id"]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approved"], true);
    assert!(
        body["session_token"]["token"]
            .as_str()
            .is_some_and(|t| !t.is_empty())
    );

    // Status reflects trust and selection.
    let (status, body) = get(app.clone(), "/pairing/status?host_id=h1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trusted"], true);
    assert_eq!(body["status"], "approved");
    assert_eq!(body["selected_host"]["host_id"], "h1");
    assert_eq!(body["trusted_hosts"].as_array().unwrap().len(), 1);

    // The request is retained.
    let (_, requests) = get(app, "/pairing/requests").await;
    assert_eq!(requests.as_array().unwrap().len(), 1);
    assert_eq!(requests[0]["approved"], true);
}

#[tokio::test]
async fn approving_unknown_request_answers_false() {
    let (app, _dir) = test_app();
    let (status, body) = post(
        app,
        "/pairing/approve",
        json!({"request_id": "no-such-request"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approved"], false);
    assert!(body.get("session_token").is_none());
}

#[tokio::test]
async fn status_on_empty_store_is_pending() {
    let (app, _dir) = test_app();
    let (status, body) = get(app, "/pairing/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trusted"], false);
    assert_eq!(body["status"], "pending");
    assert!(body["selected_host"].is_null());
    assert_eq!(body["trusted_hosts"], json!([]));
}

#[tokio::test]
async fn grant_mirrors_the_request() {
    let (app, _dir) = test_app();
    let (status, grant) = post(
        app,
        "/resources/grant",
        json!({"cpu_percent": 50, "ram_mb": 2048}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(grant["cpu_percent"], 50);
    assert_eq!(grant["ram_mb"], 2048);
    assert!(grant.get("gpu_layers").is_none());
    assert!(grant["granted_at"].is_string());
}

#[tokio::test]
async fn out_of_range_cpu_is_a_bad_request() {
    let (app, _dir) = test_app();
    let (status, body) = post(
        app,
        "/resources/grant",
        json!({"cpu_percent": 150, "ram_mb": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "invalid_request");
}

#[tokio::test]
async fn capabilities_report_os_family() {
    let (app, _dir) = test_app();
    let (status, caps) = get(app, "/capabilities").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(caps["os"], std::env::consts::OS);
    assert_eq!(caps["supports_cgroups"], cfg!(target_os = "linux"));
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn launch_returns_a_pid_on_linux() {
    let (app, _dir) = test_app();
    let (status, body) = post(
        app,
        "/sandbox/launch",
        json!({
            "command": ["echo", "hi"],
            "resources": {"cpu_percent": 100, "ram_mb": 0},
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["pid"].as_u64().unwrap() > 0);
}

#[cfg(not(target_os = "linux"))]
#[tokio::test]
async fn launch_is_rejected_off_linux() {
    let (app, _dir) = test_app();
    let (status, body) = post(
        app,
        "/sandbox/launch",
        json!({
            "command": ["echo", "hi"],
            "resources": {"cpu_percent": 50, "ram_mb": 2048},
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_code"], "unsupported");
}

#[tokio::test]
async fn empty_launch_command_is_a_bad_request() {
    let (app, _dir) = test_app();
    let (status, body) = post(
        app,
        "/sandbox/launch",
        json!({
            "command": [],
            "resources": {"cpu_percent": 100, "ram_mb": 0},
        }),
    )
    .await;
    if cfg!(target_os = "linux") {
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "invalid_request");
    } else {
        // Platform gating fires before command validation.
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
