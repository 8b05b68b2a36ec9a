//! E2E tests for the Gateway HTTP API over a real listener

use std::sync::Arc;

use envira_gateway::{build_app, db::Repositories, AppState, ChatSettings, JwtConfig};
use envira_runtime::MockProvider;
use serde_json::{json, Value};
use tokio::net::TcpListener;

struct Gateway {
    base: String,
    token: String,
    user_id: String,
    provider: Arc<MockProvider>,
    _handle: tokio::task::JoinHandle<()>,
}

async fn spawn_gateway_server() -> Gateway {
    let repositories = Repositories::in_memory();
    let user = repositories
        .users
        .create("Device Owner", "owner@example.com")
        .await
        .expect("create user");
    let provider = Arc::new(MockProvider::new());
    let jwt = JwtConfig::new("e2e-secret", "envira".into(), "envira".into());
    let token = jwt.generate_token(&user.id).expect("mint token");
    let state = AppState::new(repositories, provider.clone(), jwt, ChatSettings::default());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    let app = build_app(state);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve gateway app");
    });

    Gateway {
        base: format!("http://{addr}"),
        token,
        user_id: user.id,
        provider,
        _handle: handle,
    }
}

#[tokio::test]
async fn gateway_health_check() {
    let gateway = spawn_gateway_server().await;

    let response = reqwest::get(format!("{}/health", gateway.base))
        .await
        .expect("health check request");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.expect("body"), "OK");
}

#[tokio::test]
async fn device_reading_shows_up_in_dashboard() {
    let gateway = spawn_gateway_server().await;
    let http = reqwest::Client::new();

    let stored = http
        .post(format!("{}/api/v1/sensor/store", gateway.base))
        .json(&json!({
            "api_key": "owner@example.com",
            "temperature": 24.2,
            "humidity": 47.5,
            "device_id": "DHT22_042",
        }))
        .send()
        .await
        .expect("store reading");
    assert_eq!(stored.status(), reqwest::StatusCode::CREATED);

    let latest: Value = http
        .get(format!("{}/api/v1/sensor/latest", gateway.base))
        .query(&[("user_id", gateway.user_id.as_str())])
        .send()
        .await
        .expect("latest request")
        .json()
        .await
        .expect("latest body");
    assert_eq!(latest["data"][0]["device_id"], "DHT22_042");

    let dashboard: Value = http
        .get(format!("{}/dashboard", gateway.base))
        .bearer_auth(&gateway.token)
        .send()
        .await
        .expect("dashboard request")
        .json()
        .await
        .expect("dashboard body");
    assert_eq!(dashboard["total_readings"], 1);
    assert_eq!(dashboard["latest_reading"]["temperature"], 24.2);
}

#[tokio::test]
async fn chat_round_trip_feeds_next_prompt() {
    let gateway = spawn_gateway_server().await;
    let http = reqwest::Client::new();
    gateway.provider.enqueue_text("Try to sleep eight hours.");
    gateway.provider.enqueue_text("Yes, short naps help.");

    for message in ["How much sleep do I need?", "Are naps good?"] {
        let response = http
            .post(format!("{}/chat/send", gateway.base))
            .bearer_auth(&gateway.token)
            .json(&json!({ "message": message }))
            .send()
            .await
            .expect("chat request");
        assert!(response.status().is_success());
    }

    let requests = gateway.provider.requests();
    assert_eq!(requests.len(), 2);
    assert!(!requests[0].prompt.contains("Assistant:"));
    assert!(requests[1].prompt.contains(
        "User: How much sleep do I need?\nAssistant: Try to sleep eight hours.\n\n---\n"
    ));
    assert!(requests[1].prompt.ends_with("User question: Are naps good?"));
}

#[tokio::test]
async fn chat_rejects_missing_token() {
    let gateway = spawn_gateway_server().await;

    let response = reqwest::Client::new()
        .post(format!("{}/chat/send", gateway.base))
        .json(&json!({ "message": "hi" }))
        .send()
        .await
        .expect("chat request");

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}
