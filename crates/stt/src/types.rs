use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Audio received from a client, validated before it is forwarded
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    /// Raw audio bytes
    pub audio: Bytes,
    /// Language hint (ISO 639-1, e.g. "cs")
    pub language: Option<String>,
    /// Original filename, used for the extension check and forwarded upstream
    pub filename: Option<String>,
    /// Content type of the uploaded file part
    pub content_type: Option<String>,
}

/// JSON form of `POST /transcribe`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranscribeBody {
    /// Base64-encoded audio
    pub audio: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Transcript returned to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Audio length in seconds, when the provider reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}
