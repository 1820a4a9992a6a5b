use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use insight_api::{build_router, config::Config, state::AppState};
use insight_llm::{ChatClient, ChatRequest, ChatResponse, LlmError};
use insight_persist::InMemoryStore;
use insight_relay::RelayBuilder;
use insight_types::QueryQuota;

struct FixedChat {
    reply: Option<String>,
}

#[async_trait]
impl ChatClient for FixedChat {
    async fn chat(&self, _request: ChatRequest) -> insight_llm::error::Result<ChatResponse> {
        match &self.reply {
            Some(text) => Ok(ChatResponse::text(text.clone())),
            None => Err(LlmError::Status {
                status: 503,
                body: "provider overloaded".to_string(),
            }),
        }
    }
}

fn test_config() -> Config {
    Config::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml")).unwrap()
}

fn fixture_store() -> InMemoryStore {
    InMemoryStore::from_fixture_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures")).unwrap()
}

fn app_with(store: InMemoryStore, reply: Option<&str>) -> Router {
    let config = test_config();
    let store = Arc::new(store);
    let relay = RelayBuilder::new()
        .chat_client(Arc::new(FixedChat {
            reply: reply.map(str::to_string),
        }))
        .quota_store(store.clone())
        .dataset_store(store)
        .config(config.relay_config())
        .build()
        .unwrap();
    build_router(Arc::new(AppState::new(config, relay)))
}

fn analyze_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(app_with(fixture_store(), Some("ok")), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["storage"], "connected");
}

#[tokio::test]
async fn test_list_datasets() {
    let (status, body) = send(app_with(fixture_store(), Some("ok")), get("/datasets")).await;
    assert_eq!(status, StatusCode::OK);

    let datasets = body.as_array().unwrap();
    assert_eq!(datasets.len(), 3);
    assert_eq!(datasets[0]["id"], "pokemon");
    assert!(!datasets[0]["sampleQuestions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_analyze_legendary() {
    let app = app_with(fixture_store(), Some("Four legendary creatures were found."));

    let (status, body) = send(
        app.clone(),
        analyze_request(json!({
            "query": "Show me all legendary Pokemon",
            "dataset": "pokemon",
            "userId": "u1"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Four legendary creatures were found.");
    let table = body["table"].as_array().unwrap();
    assert_eq!(table.len(), 4);
    assert!(table.iter().all(|r| r["Legendary"] == true));
    assert_eq!(body["visualization"]["type"], "table");

    let (status, quota) = send(app, get("/quota/u1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quota["used"], 1);
    assert_eq!(quota["remaining"], 4);
    assert!(quota["resetsAt"].is_string());
}

#[tokio::test]
async fn test_analyze_exhausted_quota() {
    let store = fixture_store().with_quota(QueryQuota {
        count: 5,
        ..QueryQuota::first("u1", Utc::now())
    });

    let (status, body) = send(
        app_with(store, Some("unused")),
        analyze_request(json!({"query": "anything", "dataset": "pokemon", "userId": "u1"})),
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body, json!({"error": "Daily query limit reached"}));
}

#[tokio::test]
async fn test_analyze_invalid_dataset() {
    let (status, body) = send(
        app_with(fixture_store(), Some("unused")),
        analyze_request(json!({"query": "anything", "dataset": "not-a-real-dataset", "userId": "u1"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid dataset selected: not-a-real-dataset");
}

#[tokio::test]
async fn test_analyze_without_identity() {
    let (status, _) = send(
        app_with(fixture_store(), Some("unused")),
        analyze_request(json!({"query": "anything", "dataset": "pokemon"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_analyze_malformed_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(app_with(fixture_store(), Some("unused")), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request"));
}

#[tokio::test]
async fn test_inference_failure_is_generic_and_free() {
    let app = app_with(fixture_store(), None);

    let (status, body) = send(
        app.clone(),
        analyze_request(json!({"query": "anything", "dataset": "pokemon", "userId": "u1"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(!body["error"].as_str().unwrap().contains("overloaded"));

    let (_, quota) = send(app, get("/quota/u1")).await;
    assert_eq!(quota["used"], 0);
}

#[tokio::test]
async fn test_request_id_header() {
    let app = app_with(fixture_store(), Some("ok"));
    let response = app.oneshot(get("/health")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_openapi_document() {
    let (status, body) = send(
        app_with(fixture_store(), Some("ok")),
        get("/api-docs/openapi.json"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/analyze"].is_object());
}
