use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use ragchat_http::{ApiConfigBuilder, ConfigCache, HttpBackend};
use ragchat_proto::{BackendError, ChatBackend, ErrorKind};
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Mock {
    config_hits: Arc<AtomicUsize>,
    last_query: Arc<Mutex<Option<Value>>>,
}

impl Mock {
    fn config_hits(&self) -> usize {
        self.config_hits.load(Ordering::SeqCst)
    }

    fn last_query(&self) -> Value {
        self.last_query.lock().unwrap().clone().unwrap()
    }
}

async fn serve(router: Router) -> HttpBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    HttpBackend::new(
        ApiConfigBuilder::new()
            .with_base_url(format!("http://{addr}"))
            .build(),
    )
}

fn config_body() -> Value {
    json!({
        "top_k": 4,
        "max_tokens": 1024,
        "temperature": 0.3,
        "similarity_threshold": 0.65,
        "llm_provider": "ollama",
        "model": "llama3.1",
        "embedding_model": "all-MiniLM-L6-v2",
        "collection_name": "transcripts",
    })
}

async fn config_ok(State(mock): State<Mock>) -> Json<Value> {
    mock.config_hits.fetch_add(1, Ordering::SeqCst);
    Json(config_body())
}

async fn config_unavailable(State(mock): State<Mock>) -> StatusCode {
    mock.config_hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::SERVICE_UNAVAILABLE
}

async fn query_ok(
    State(mock): State<Mock>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let question = body["question"].clone();
    *mock.last_query.lock().unwrap() = Some(body);
    Json(json!({
        "answer": "**Short** answer.",
        "context": [
            {"instruction": "Q1", "output": "A1", "similarity": 0.92},
            {"instruction": "Q2", "output": "A2", "similarity": 0.81, "video_id": "v42"},
        ],
        "question": question,
    }))
}

async fn query_detail() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"detail": "model unavailable"})),
    )
}

async fn query_garbage() -> (StatusCode, &'static str) {
    (StatusCode::BAD_GATEWAY, "<html>upstream down</html>")
}

#[tokio::test]
async fn test_config_is_fetched_once() {
    let mock = Mock::default();
    let backend = serve(
        Router::new()
            .route("/config", get(config_ok))
            .with_state(mock.clone()),
    )
    .await;

    let first = backend.get_config().await.unwrap();
    let second = backend.get_config().await.unwrap();
    assert_eq!(mock.config_hits(), 1);
    assert_eq!(first, second);
    assert_eq!(first.top_k, 4);
    assert_eq!(first.collection_name, "transcripts");
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let mock = Mock::default();
    let backend = serve(
        Router::new()
            .route("/config", get(config_ok))
            .with_state(mock.clone()),
    )
    .await;

    backend.get_config().await.unwrap();
    backend.cache().invalidate();
    backend.get_config().await.unwrap();
    assert_eq!(mock.config_hits(), 2);
}

#[tokio::test]
async fn test_shared_cache_skips_network() {
    let mock = Mock::default();
    let backend = serve(
        Router::new()
            .route("/config", get(config_ok))
            .with_state(mock.clone()),
    )
    .await;
    let cache = ConfigCache::new();
    let backend = HttpBackend::with_cache(backend.config().clone(), cache.clone());

    backend.get_config().await.unwrap();
    let other = HttpBackend::with_cache(backend.config().clone(), cache);
    other.get_config().await.unwrap();
    assert_eq!(mock.config_hits(), 1);
}

#[tokio::test]
async fn test_config_error_carries_status() {
    let mock = Mock::default();
    let backend = serve(
        Router::new()
            .route("/config", get(config_unavailable))
            .with_state(mock.clone()),
    )
    .await;

    let err = backend.get_config().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Status(503));
    assert_eq!(err.message(), "HTTP error! status: 503");
    assert!(backend.cache().get().is_none());
}

#[tokio::test]
async fn test_query_uses_configured_top_k() {
    let mock = Mock::default();
    let backend = serve(
        Router::new()
            .route("/config", get(config_ok))
            .route("/query", post(query_ok))
            .with_state(mock.clone()),
    )
    .await;

    let resp = backend
        .query_chat("What is the evidence for God?", None)
        .await
        .unwrap();
    assert_eq!(
        mock.last_query(),
        json!({"question": "What is the evidence for God?", "top_k": 4})
    );
    assert_eq!(resp.question, "What is the evidence for God?");
    assert_eq!(resp.context.len(), 2);
    assert_eq!(resp.context[0].instruction, "Q1");
    assert_eq!(resp.context[0].similarity, 0.92);
    assert_eq!(resp.context[1].video_id.as_deref(), Some("v42"));
}

#[tokio::test]
async fn test_query_falls_back_when_config_fails() {
    let mock = Mock::default();
    let backend = serve(
        Router::new()
            .route("/config", get(config_unavailable))
            .route("/query", post(query_ok))
            .with_state(mock.clone()),
    )
    .await;

    backend.query_chat("Hi", None).await.unwrap();
    assert_eq!(mock.last_query()["top_k"], 10);
}

#[tokio::test]
async fn test_query_with_explicit_top_k_skips_config() {
    let mock = Mock::default();
    let backend = serve(
        Router::new()
            .route("/config", get(config_ok))
            .route("/query", post(query_ok))
            .with_state(mock.clone()),
    )
    .await;

    backend.query("Hi", Some(5)).await.unwrap();
    assert_eq!(mock.config_hits(), 0);
    assert_eq!(mock.last_query()["top_k"], 5);
}

#[tokio::test]
async fn test_query_error_detail() {
    let backend =
        serve(Router::new().route("/query", post(query_detail))).await;

    let err = backend.query_chat("Hi", Some(5)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Status(500));
    assert_eq!(err.message(), "model unavailable");
}

#[tokio::test]
async fn test_query_error_without_detail() {
    let backend =
        serve(Router::new().route("/query", post(query_garbage))).await;

    let err = backend.query_chat("Hi", Some(5)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Status(502));
    assert_eq!(err.message(), "HTTP error! status: 502");
}

#[tokio::test]
async fn test_health_and_stats() {
    let backend = serve(
        Router::new()
            .route(
                "/health",
                get(|| async {
                    Json(json!({
                        "status": "healthy",
                        "chatbot_ready": true,
                        "version": "1.2.0",
                    }))
                }),
            )
            .route(
                "/stats",
                get(|| async {
                    Json(json!({
                        "total_documents": 1532,
                        "model": "llama3.1",
                        "embedding_model": "all-MiniLM-L6-v2",
                        "max_tokens": 1024,
                        "default_top_k": 4,
                    }))
                }),
            ),
    )
    .await;

    let health = backend.check_health().await.unwrap();
    assert!(health.chatbot_ready);
    assert_eq!(health.version, "1.2.0");

    let stats = backend.get_stats().await.unwrap();
    assert_eq!(stats.total_documents, 1532);
    assert_eq!(stats.default_top_k, 4);
}

#[tokio::test]
async fn test_missing_endpoint_is_status_error() {
    let backend = serve(Router::new()).await;
    let err = backend.check_health().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Status(404));
}

#[tokio::test]
async fn test_invalid_body() {
    let backend = serve(
        Router::new().route("/stats", get(|| async { "not json" })),
    )
    .await;
    let err = backend.get_stats().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
}

#[tokio::test]
async fn test_unreachable_backend() {
    let backend = HttpBackend::new(
        ApiConfigBuilder::new()
            .with_base_url("http://127.0.0.1:1")
            .build(),
    );
    let err = backend.query_chat("Hi", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(!err.message().is_empty());
}
