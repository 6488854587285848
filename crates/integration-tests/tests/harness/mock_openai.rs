//! Mock `OpenAI` backend for integration tests
//!
//! Serves the three endpoints murmur calls. Failure modes can be switched at
//! runtime so a single test can observe a service going down and back up.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::config::TEST_API_KEY;

/// Transcript returned by the mock
pub const MOCK_TRANSCRIPT: &str = "hello from mock whisper";

/// Mock provider with request counters and switchable failures
pub struct MockOpenAi {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    transcription_count: AtomicU32,
    completion_count: AtomicU32,
    models_count: AtomicU32,
    /// Status returned instead of a normal answer (0 = answer normally)
    fail_status: AtomicU16,
    /// Remaining requests to fail; `u32::MAX` fails forever
    fail_remaining: AtomicU32,
    /// Delay before answering any request
    delay_ms: AtomicU64,
}

impl MockOpenAi {
    /// Start a mock that answers every request successfully
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/v1/audio/transcriptions", routing::post(handle_transcription))
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .route("/v1/models", routing::get(handle_models))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL including the `/v1` prefix
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Answer every following request with `status`
    pub fn fail_with(&self, status: u16) {
        self.fail_next(status, u32::MAX);
    }

    /// Answer the next `count` requests with `status`, then recover
    pub fn fail_next(&self, status: u16, count: u32) {
        self.state.fail_status.store(status, Ordering::SeqCst);
        self.state.fail_remaining.store(count, Ordering::SeqCst);
    }

    /// Stop failing
    pub fn recover(&self) {
        self.state.fail_remaining.store(0, Ordering::SeqCst);
    }

    /// Hold every response for `delay`
    pub fn delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.state.delay_ms.store(millis, Ordering::SeqCst);
    }

    pub fn transcription_count(&self) -> u32 {
        self.state.transcription_count.load(Ordering::SeqCst)
    }

    pub fn completion_count(&self) -> u32 {
        self.state.completion_count.load(Ordering::SeqCst)
    }

    pub fn models_count(&self) -> u32 {
        self.state.models_count.load(Ordering::SeqCst)
    }
}

impl Drop for MockOpenAi {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl MockState {
    /// Shared prologue: delay, auth check, injected failure
    async fn intercept(&self, headers: &HeaderMap) -> Option<Response> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let expected = format!("Bearer {TEST_API_KEY}");
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value == expected);
        if !authorized {
            return Some(error_response(StatusCode::UNAUTHORIZED, "invalid api key"));
        }

        let failing = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| match remaining {
                0 => None,
                u32::MAX => Some(u32::MAX),
                n => Some(n - 1),
            })
            .is_ok();
        if failing {
            let status = StatusCode::from_u16(self.fail_status.load(Ordering::SeqCst))
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return Some(error_response(status, "mock server intentional failure"));
        }

        None
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": {
                "message": message,
                "type": "server_error"
            }
        })),
    )
        .into_response()
}

// -- Wire types matching OpenAI format --

#[derive(Debug, Deserialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

// -- Handlers --

async fn handle_transcription(State(state): State<Arc<MockState>>, headers: HeaderMap, body: Bytes) -> Response {
    state.transcription_count.fetch_add(1, Ordering::SeqCst);

    if let Some(response) = state.intercept(&headers).await {
        return response;
    }

    if body.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "empty upload");
    }

    Json(serde_json::json!({ "text": format!("  {MOCK_TRANSCRIPT}\n") })).into_response()
}

/// Replies `echo: <last user turn>` so concurrent callers can tell answers apart
async fn handle_chat_completions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(req): Json<ChatCompletionRequest>,
) -> Response {
    state.completion_count.fetch_add(1, Ordering::SeqCst);

    if let Some(response) = state.intercept(&headers).await {
        return response;
    }

    let last_user = req
        .messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map_or("", |m| m.content.as_str());

    Json(serde_json::json!({
        "id": "chatcmpl-test-123",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": req.model,
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": format!("echo: {last_user}") },
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 5,
            "total_tokens": 15
        }
    }))
    .into_response()
}

async fn handle_models(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.models_count.fetch_add(1, Ordering::SeqCst);

    if let Some(response) = state.intercept(&headers).await {
        return response;
    }

    Json(serde_json::json!({
        "object": "list",
        "data": [{
            "id": "whisper-1",
            "object": "model",
            "created": 1_700_000_000,
            "owned_by": "mock"
        }]
    }))
    .into_response()
}
