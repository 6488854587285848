use std::time::Duration;

use async_trait::async_trait;
use murmur_core::{Upstream, UpstreamError};
use reqwest::multipart::{Form, Part};

use crate::types::{TranscriptionRequest, TranscriptionResult};

use super::SttProvider;

/// Filename sent upstream when the client gave none
const FALLBACK_FILENAME: &str = "audio.wav";

/// `OpenAI`-compatible `/audio/transcriptions` provider
pub(crate) struct WhisperProvider {
    upstream: Upstream,
    model: String,
    timeout: Duration,
}

impl WhisperProvider {
    pub fn new(upstream: Upstream, model: String, timeout: Duration) -> Self {
        Self {
            upstream,
            model,
            timeout,
        }
    }

    fn form(&self, request: &TranscriptionRequest) -> Result<Form, UpstreamError> {
        let filename = request.filename.clone().unwrap_or_else(|| FALLBACK_FILENAME.to_owned());
        let content_type = request
            .content_type
            .clone()
            .unwrap_or_else(|| content_type_for(&filename).to_owned());

        let length = u64::try_from(request.audio.len()).unwrap_or(u64::MAX);
        let part = Part::stream_with_length(reqwest::Body::from(request.audio.clone()), length)
            .file_name(filename)
            .mime_str(&content_type)
            .map_err(|e| UpstreamError::invalid_input(format!("invalid audio content type '{content_type}': {e}")))?;

        let mut form = Form::new().part("file", part).text("model", self.model.clone());

        if let Some(language) = &request.language {
            form = form.text("language", language.clone());
        }

        Ok(form)
    }
}

#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

#[async_trait]
impl SttProvider for WhisperProvider {
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<TranscriptionResult, UpstreamError> {
        tracing::debug!(
            bytes = request.audio.len(),
            model = %self.model,
            language = request.language.as_deref().unwrap_or("auto"),
            "sending transcription request"
        );

        let form = self.form(request)?;
        let response: WhisperResponse = self
            .upstream
            .send_json(self.upstream.post("audio/transcriptions").multipart(form), self.timeout)
            .await?;

        Ok(TranscriptionResult {
            text: response.text.trim().to_owned(),
            language: response.language.or_else(|| request.language.clone()),
            duration: response.duration,
        })
    }

    fn name(&self) -> &str {
        "whisper"
    }
}

/// Best-effort MIME type from a filename extension
fn content_type_for(filename: &str) -> &'static str {
    let extension = filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("m4a" | "mp4") => "audio/mp4",
        Some("wav") => "audio/wav",
        Some("webm") => "audio/webm",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}
