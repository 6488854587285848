use std::sync::Arc;

use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{FromRequest, Multipart};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::{Bytes, BytesMut};
use murmur_core::UpstreamError;

use crate::server::Server;
use crate::types::{TranscribeBody, TranscriptionRequest};

/// Longest accepted `language` form field
const MAX_LANGUAGE_BYTES: usize = 64;

/// Extractor for `POST /transcribe`
///
/// Accepts either a JSON body with base64 audio or a multipart form with a
/// `file` part and an optional `language` field. Anything else is rejected
/// as invalid input. The whole body is capped by the route's
/// `DefaultBodyLimit`; the audio part is additionally capped at
/// `max_audio_bytes`.
pub struct ExtractAudio(pub TranscriptionRequest);

impl FromRequest<Arc<Server>> for ExtractAudio {
    type Rejection = Response;

    async fn from_request(request: http::Request<Body>, server: &Arc<Server>) -> Result<Self, Self::Rejection> {
        let content_type = request
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        let parsed = if content_type.starts_with("application/json") {
            from_json(request, server).await
        } else if content_type.starts_with("multipart/form-data") {
            from_multipart(request, server).await
        } else {
            Err(invalid(
                "expected Content-Type: application/json or multipart/form-data",
            ))
        };

        parsed.map(Self).map_err(IntoResponse::into_response)
    }
}

async fn from_json(request: http::Request<Body>, server: &Server) -> Result<TranscriptionRequest, UpstreamError> {
    let bytes = axum::body::to_bytes(request.into_body(), server.body_limit())
        .await
        .map_err(|e| invalid(format!("failed to read request body: {e}")))?;

    let body: TranscribeBody =
        serde_json::from_slice(&bytes).map_err(|e| invalid(format!("invalid JSON body: {e}")))?;

    let audio = STANDARD
        .decode(body.audio.trim())
        .map_err(|e| invalid(format!("audio is not valid base64: {e}")))?;

    Ok(TranscriptionRequest {
        audio: Bytes::from(audio),
        language: body.language,
        filename: body.filename,
        content_type: None,
    })
}

async fn from_multipart(request: http::Request<Body>, server: &Server) -> Result<TranscriptionRequest, UpstreamError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| invalid(format!("failed to parse multipart form: {e}")))?;

    let mut audio: Option<Bytes> = None;
    let mut filename = None;
    let mut content_type = None;
    let mut language = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| invalid(format!("failed to read multipart form: {e}")))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                filename = field.file_name().map(str::to_owned);
                content_type = field.content_type().map(str::to_owned);

                let mut buffer = BytesMut::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| invalid(format!("failed to read audio data: {e}")))?
                {
                    if buffer.len() + chunk.len() > server.max_audio_bytes() {
                        return Err(invalid(format!(
                            "audio payload exceeds the limit of {} bytes",
                            server.max_audio_bytes()
                        )));
                    }
                    buffer.extend_from_slice(&chunk);
                }
                audio = Some(buffer.freeze());
            }
            "language" => {
                language = Some(read_text(&mut field, MAX_LANGUAGE_BYTES, "language").await?);
            }
            _ => {}
        }
    }

    let audio = audio.ok_or_else(|| invalid("missing required 'file' field in multipart form"))?;

    Ok(TranscriptionRequest {
        audio,
        language,
        filename,
        content_type,
    })
}

/// Read a small text field, refusing anything longer than `limit` bytes
async fn read_text(field: &mut Field<'_>, limit: usize, name: &str) -> Result<String, UpstreamError> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| invalid(format!("failed to read {name} field: {e}")))?
    {
        if buffer.len() + chunk.len() > limit {
            return Err(invalid(format!("{name} field exceeds the limit of {limit} bytes")));
        }
        buffer.extend_from_slice(&chunk);
    }

    String::from_utf8(buffer.to_vec()).map_err(|_| invalid(format!("{name} field is not valid UTF-8")))
}

fn invalid(message: impl Into<String>) -> UpstreamError {
    UpstreamError::invalid_input(message)
}
