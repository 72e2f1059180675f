// Integration test for the full request flow: HTTP entry -> credential file ->
// envelope sealing -> backend dispatch -> aggregated response
//
// Uses the real region table, credential store and dispatch client; only the
// backend is mocked.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use like_relay::api::{create_router, AppState, Config};
use like_relay::core::models::DispatchShape;
use like_relay::engine::{FanOutCoordinator, RandomSelector};
use like_relay::loader::credential_store::JsonCredentialStore;
use like_relay::loader::region_table::RegionTable;
use like_relay::proxy::DispatchClientImpl;
use mockito::Matcher;
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct Harness {
    app: axum::Router,
    _tokens: TempDir,
}

/// Wire the production components against `backend_url`
fn harness(backend_url: &str, shape: DispatchShape, tokens_json: Option<&str>) -> Harness {
    let yaml = format!(
        r#"
default_credential_file: token_bd.json
regions:
  bd:
    like_url: {url}/LikeProfile
    info_url: {url}/GetPlayerPersonalShow
"#,
        url = backend_url
    );
    let regions = Arc::new(RegionTable::from_yaml_str(&yaml).unwrap());

    let tokens = TempDir::new().unwrap();
    if let Some(content) = tokens_json {
        fs::write(tokens.path().join("token_bd.json"), content).unwrap();
    }

    let mut config = Config::test_config();
    config.tokens_dir = tokens.path().to_path_buf();
    config.dispatch_shape = shape;
    config.dispatch_timeout_secs = 5;

    let credentials = Arc::new(JsonCredentialStore::new(
        config.tokens_dir.clone(),
        Arc::clone(&regions),
        config.key_material.clone(),
        &config.default_user_agent,
    ));
    let client = Arc::new(DispatchClientImpl::new(config.dispatch_timeout_secs, config.tls_verify).unwrap());
    let coordinator = Arc::new(FanOutCoordinator::new(
        Arc::clone(&regions),
        credentials,
        client,
        Arc::new(RandomSelector),
    ));

    let app_state = AppState {
        coordinator,
        regions,
        config: Arc::new(config),
    };
    let app = create_router(&app_state).with_state(app_state.clone());

    Harness { app, _tokens: tokens }
}

async fn call(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_broadcast_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    let like = server
        .mock("POST", "/LikeProfile")
        .match_header("authorization", Matcher::Regex("^Bearer tok-[abc]$".to_string()))
        .match_header("content-type", "application/octet-stream")
        .with_status(200)
        .expect(3)
        .create_async()
        .await;

    let harness = harness(
        &server.url(),
        DispatchShape::Broadcast,
        Some(r#"[{"token": "tok-a"}, {"token": "tok-b"}, {"token": "tok-c"}]"#),
    );

    let (status, body) = call(harness.app, "/api/like?uid=123456789&server=bd").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"uid": 123456789, "server": "bd", "likes_sent": 3, "total_tokens": 3})
    );
    like.assert_async().await;
}

#[tokio::test]
async fn test_broadcast_partial_rejection() {
    let mut server = mockito::Server::new_async().await;
    let accepted = server
        .mock("POST", "/LikeProfile")
        .match_header("authorization", Matcher::Regex("^Bearer good-".to_string()))
        .with_status(200)
        .expect(2)
        .create_async()
        .await;
    let rejected = server
        .mock("POST", "/LikeProfile")
        .match_header("authorization", "Bearer expired-1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let harness = harness(
        &server.url(),
        DispatchShape::Broadcast,
        Some(r#"[{"token": "good-1"}, {"token": "expired-1"}, {"token": "good-2"}]"#),
    );

    let (status, body) = call(harness.app, "/api/like?uid=7&server=bd").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["likes_sent"], 2);
    assert_eq!(body["total_tokens"], 3);
    accepted.assert_async().await;
    rejected.assert_async().await;
}

#[tokio::test]
async fn test_single_account_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    let like = server
        .mock("POST", "/LikeProfile")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let count = server
        .mock("POST", "/GetPlayerPersonalShow")
        .with_status(200)
        .with_body(vec![0x08, 0x2a])
        .expect(1)
        .create_async()
        .await;

    let harness = harness(
        &server.url(),
        DispatchShape::Single,
        Some(r#"[{"token": "tok-a"}, {"token": "tok-b"}]"#),
    );

    let (status, body) = call(harness.app, "/api/like?uid=123456789&server=bd").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["uid"], "123456789");
    like.assert_async().await;
    count.assert_async().await;
}

#[tokio::test]
async fn test_missing_credential_file_sends_nothing() {
    let mut server = mockito::Server::new_async().await;
    let like = server
        .mock("POST", "/LikeProfile")
        .expect(0)
        .create_async()
        .await;

    let harness = harness(&server.url(), DispatchShape::Broadcast, None);
    let (status, body) = call(harness.app, "/api/like?uid=1&server=bd").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("not found"));
    like.assert_async().await;
}
