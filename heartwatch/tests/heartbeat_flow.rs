//! End-to-end heartbeat flow: ingress → store → sweeper → patch.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use heartwatch::notify::{Patcher, WebhookTransport, DISCONNECTED_VALUE};
use heartwatch::server::{router, AppState};
use heartwatch::store::SessionStore;
use heartwatch::sweeper::{Disconnect, ManualClock, SweepSettings, Sweeper};
use heartwatch::vault::{MemoryStore, Resolver, VaultCipher};
use reqwest::Client;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "integration-key";

struct Service {
    app: Router,
    store: Arc<SessionStore>,
    clock: Arc<ManualClock>,
    sweeper: Sweeper,
    secrets: Arc<MemoryStore>,
}

fn service(secrets: MemoryStore) -> Service {
    let store = Arc::new(SessionStore::new());
    let clock = Arc::new(ManualClock::new());
    let secrets = Arc::new(secrets);

    let client = Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let patcher = Patcher::new(
        Resolver::new(secrets.clone(), VaultCipher::from_secret(KEY)),
        Arc::new(WebhookTransport::new(client)),
    );
    let sweeper = Sweeper::new(
        store.clone(),
        Arc::new(patcher),
        clock.clone(),
        SweepSettings::with_timeout(Duration::from_millis(15_000)),
    );
    let app = router(AppState {
        store: store.clone(),
        clock: clock.clone(),
    });

    Service {
        app,
        store,
        clock,
        sweeper,
        secrets,
    }
}

async fn post(app: &Router, uri: &str, body: Value) -> StatusCode {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    to_bytes(response.into_body(), usize::MAX).await.unwrap();
    status
}

async fn sweep(sweeper: &Sweeper) -> Vec<Disconnect> {
    let mut results = Vec::new();
    for job in sweeper.sweep_once().await {
        results.push(job.wait().await.unwrap());
    }
    results
}

#[tokio::test]
async fn test_silent_session_is_patched_once_and_evicted() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/webhooks/123/tok/messages/999"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let svc = service(MemoryStore::new());
    let status = post(
        &svc.app,
        "/register",
        json!({
            "sessionId": "s1",
            "webhookUrl": format!("{}/api/webhooks/123/tok", server.uri()),
            "messageId": "999",
            "embed": { "fields": [{ "name": "Status", "value": "🟢 Connected", "inline": true }] }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    svc.clock.advance(Duration::from_secs(16));
    let results = sweep(&svc.sweeper).await;
    assert_eq!(results.len(), 1);
    assert!(results[0].error.is_none());

    // A second tick finds nothing.
    assert!(sweep(&svc.sweeper).await.is_empty());
    assert!(!svc.store.contains("s1").await);
    assert_eq!(svc.secrets.lookups(), 0);

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let fields = body["embeds"][0]["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0]["value"], DISCONNECTED_VALUE);

    assert_eq!(
        post(&svc.app, "/ping", json!({ "sessionId": "s1" })).await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_pinged_session_is_left_alone() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let svc = service(MemoryStore::new());
    post(
        &svc.app,
        "/register",
        json!({
            "sessionId": "s1",
            "webhookUrl": format!("{}/api/webhooks/1/t", server.uri()),
            "messageId": "5"
        }),
    )
    .await;

    for _ in 0..4 {
        svc.clock.advance(Duration::from_secs(10));
        assert_eq!(
            post(&svc.app, "/ping", json!({ "sessionId": "s1" })).await,
            StatusCode::OK
        );
        assert!(sweep(&svc.sweeper).await.is_empty());
    }
    assert!(svc.store.get("s1").await.is_some());
}

#[tokio::test]
async fn test_missing_status_field_is_appended() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let svc = service(MemoryStore::new());
    post(
        &svc.app,
        "/register",
        json!({
            "sessionId": "s2",
            "webhookUrl": format!("{}/api/webhooks/1/t", server.uri()),
            "messageId": "5",
            "embed": {
                "title": "Game server",
                "fields": [
                    { "name": "Player", "value": "alice", "inline": true },
                    { "name": "Place", "value": "1234", "inline": false }
                ]
            }
        }),
    )
    .await;

    svc.clock.advance(Duration::from_secs(20));
    sweep(&svc.sweeper).await;

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let embed = &body["embeds"][0];
    assert_eq!(embed["title"], "Game server");
    assert_eq!(
        embed["fields"],
        json!([
            { "name": "Player", "value": "alice", "inline": true },
            { "name": "Place", "value": "1234", "inline": false },
            { "name": "Status", "value": DISCONNECTED_VALUE, "inline": true }
        ])
    );
}

#[tokio::test]
async fn test_numeric_ids_and_values_are_tracked() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/webhooks/1/t/messages/1234567890"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let svc = service(MemoryStore::new());
    let status = post(
        &svc.app,
        "/register",
        json!({
            "sessionId": "s3",
            "webhookUrl": format!("{}/api/webhooks/1/t", server.uri()),
            "messageId": 1_234_567_890_u64,
            "embed": { "fields": [{ "name": "Players", "value": 5, "inline": true }] }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    svc.clock.advance(Duration::from_secs(16));
    let results = sweep(&svc.sweeper).await;
    assert!(results[0].error.is_none());

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body["embeds"][0]["fields"],
        json!([
            { "name": "Players", "value": 5, "inline": true },
            { "name": "Status", "value": DISCONNECTED_VALUE, "inline": true }
        ])
    );
}

#[tokio::test]
async fn test_vault_failures_are_isolated_per_session() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/webhooks/7/good/messages/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let good = VaultCipher::from_secret(KEY)
        .seal(&format!("{}/api/webhooks/7/good", server.uri()))
        .unwrap();
    let wrong_key = VaultCipher::from_secret("some-other-key")
        .seal(&format!("{}/api/webhooks/8/bad", server.uri()))
        .unwrap();
    let secrets = MemoryStore::new()
        .with_entry("wh_a1", good)
        .with_entry("wh_b2", wrong_key);

    let svc = service(secrets);
    for (id, target) in [("good", "wh_a1"), ("corrupt", "wh_b2"), ("missing", "wh_c3")] {
        let status = post(
            &svc.app,
            "/register",
            json!({ "sessionId": id, "webhookUrl": target, "messageId": "1" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    svc.clock.advance(Duration::from_secs(16));
    let results = sweep(&svc.sweeper).await;

    assert_eq!(results.len(), 3);
    for result in &results {
        assert!(result.evicted, "{} should be evicted", result.session_id);
        assert_eq!(result.error.is_none(), result.session_id == "good");
    }
    assert!(svc.store.is_empty().await);
    assert_eq!(svc.secrets.lookups(), 3);
}

#[tokio::test]
async fn test_validation_errors() {
    let svc = service(MemoryStore::new());
    assert_eq!(
        post(
            &svc.app,
            "/register",
            json!({ "sessionId": "s1", "webhookUrl": "wh_01" })
        )
        .await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        post(&svc.app, "/ping", json!({ "sessionId": "unknown" })).await,
        StatusCode::NOT_FOUND
    );
}
