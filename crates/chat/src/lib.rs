#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod protocol;
mod provider;
mod server;
mod types;

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use murmur_core::extract::JsonBody;
use murmur_core::{Upstream, UpstreamError};

pub use server::Server;
pub use types::{ChatBody, ChatRequest, ChatResult, Message, Role, Usage};
use server::ChatServerBuilder;

/// Registry name of the chat service
pub const SERVICE_NAME: &str = "chat";

pub type Result<T> = std::result::Result<T, UpstreamError>;

/// Build the chat server from configuration
///
/// # Errors
///
/// Returns an error if the chat settings are invalid
pub fn build_server(config: &murmur_config::Config, upstream: Upstream) -> anyhow::Result<Arc<Server>> {
    let server = ChatServerBuilder::new(&config.chat, upstream)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to initialize chat service: {e}"))?;

    Ok(Arc::new(server))
}

/// Create the endpoint router for chat
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new().route("/chat", post(chat))
}

/// Handle chat requests
async fn chat(State(server): State<Arc<Server>>, JsonBody(body): JsonBody<ChatBody>) -> Result<Json<ChatResult>> {
    tracing::debug!(
        turns = body.messages.as_ref().map_or(1, Vec::len),
        goals = body.goals.len(),
        "chat handler called"
    );

    let result = server.chat(body).await?;

    tracing::debug!(
        model = %result.model,
        total_tokens = result.usage.total_tokens,
        "chat complete"
    );

    Ok(Json(result))
}
