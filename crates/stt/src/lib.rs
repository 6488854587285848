#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod provider;
mod request;
mod server;
mod types;

use std::sync::Arc;

use axum::{Json, Router, extract::DefaultBodyLimit, extract::State, routing::post};
use murmur_core::{Upstream, UpstreamError};

pub use server::Server;
pub use types::{TranscribeBody, TranscriptionRequest, TranscriptionResult};
use request::ExtractAudio;
use server::SttServerBuilder;

/// Registry name of the transcription service
pub const SERVICE_NAME: &str = "transcription";

pub type Result<T> = std::result::Result<T, UpstreamError>;

/// Build the transcription server from configuration
///
/// # Errors
///
/// Returns an error if the transcription settings are invalid
pub fn build_server(config: &murmur_config::Config, upstream: Upstream) -> anyhow::Result<Arc<Server>> {
    let server = SttServerBuilder::new(&config.transcription, upstream)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to initialize transcription service: {e}"))?;

    Ok(Arc::new(server))
}

/// Create the endpoint router for transcription
///
/// `body_limit` replaces axum's 2 MiB default and should come from
/// [`Server::body_limit`]; the extractor also caps the audio part itself.
pub fn endpoint_router(body_limit: usize) -> Router<Arc<Server>> {
    Router::new().route("/transcribe", post(transcribe).layer(DefaultBodyLimit::max(body_limit)))
}

/// Handle transcription requests
async fn transcribe(
    State(server): State<Arc<Server>>,
    ExtractAudio(request): ExtractAudio,
) -> Result<Json<TranscriptionResult>> {
    tracing::debug!(
        bytes = request.audio.len(),
        filename = request.filename.as_deref().unwrap_or("-"),
        "transcription handler called"
    );

    let result = server.transcribe(request).await?;

    tracing::debug!(characters = result.text.chars().count(), "transcription complete");

    Ok(Json(result))
}
