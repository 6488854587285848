use murmur_config::TranscriptionConfig;
use murmur_core::{Upstream, UpstreamError};

use crate::{
    SERVICE_NAME,
    provider::{SttProvider, whisper::WhisperProvider},
    types::{TranscriptionRequest, TranscriptionResult},
};

/// Headroom for the JSON envelope and multipart boundaries
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Transcription service: validates audio, calls the provider under the
/// retry policy and records the outcome in the service registry
pub struct Server {
    provider: Box<dyn SttProvider>,
    upstream: Upstream,
    limits: AudioLimits,
}

/// Client-facing audio constraints
#[derive(Debug, Clone)]
pub(crate) struct AudioLimits {
    pub max_audio_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub default_language: Option<String>,
}

impl Server {
    /// Transcribe one request
    ///
    /// Validation failures return `InvalidInput` without contacting the
    /// provider. Every call that reaches the provider updates the
    /// `transcription` entry of the registry exactly once.
    pub async fn transcribe(&self, request: TranscriptionRequest) -> crate::Result<TranscriptionResult> {
        let request = self.limits.validate(request)?;

        let outcome = murmur_core::retry(self.upstream.retry_policy(), "transcribe", |attempt| {
            tracing::debug!(provider = self.provider.name(), attempt, "transcription attempt");
            self.provider.transcribe(&request)
        })
        .await;

        self.upstream.registry().record(SERVICE_NAME, &outcome);
        outcome
    }

    /// Largest request body worth reading: base64 inflates audio by 4/3
    pub fn body_limit(&self) -> usize {
        self.limits
            .max_audio_bytes
            .saturating_add(self.limits.max_audio_bytes / 3 + 4)
            .saturating_add(BODY_OVERHEAD_BYTES)
    }

    pub fn max_audio_bytes(&self) -> usize {
        self.limits.max_audio_bytes
    }
}

impl AudioLimits {
    fn validate(&self, mut request: TranscriptionRequest) -> crate::Result<TranscriptionRequest> {
        if request.audio.is_empty() {
            return Err(UpstreamError::invalid_input("audio payload is empty"));
        }

        if request.audio.len() > self.max_audio_bytes {
            return Err(UpstreamError::invalid_input(format!(
                "audio payload is {} bytes, the limit is {} bytes",
                request.audio.len(),
                self.max_audio_bytes
            )));
        }

        if let Some(filename) = &request.filename {
            self.check_extension(filename)?;
        }

        request.language = match request.language.take().map(|l| l.trim().to_owned()) {
            Some(language) if !language.is_empty() => Some(check_language(language)?),
            _ => self.default_language.clone(),
        };

        Ok(request)
    }

    fn check_extension(&self, filename: &str) -> crate::Result<()> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension {
            Some(ext) if self.allowed_extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext)) => Ok(()),
            Some(ext) => Err(UpstreamError::invalid_input(format!(
                "unsupported audio format '.{ext}', expected one of: {}",
                self.allowed_extensions.join(", ")
            ))),
            None => Err(UpstreamError::invalid_input(format!(
                "filename '{filename}' has no extension, expected one of: {}",
                self.allowed_extensions.join(", ")
            ))),
        }
    }
}

fn check_language(language: String) -> crate::Result<String> {
    let valid = (2..=8).contains(&language.len()) && language.chars().all(|c| c.is_ascii_alphabetic() || c == '-');

    if valid {
        Ok(language)
    } else {
        Err(UpstreamError::invalid_input(
            "language must be 2 to 8 ASCII letters or '-' (e.g. \"en\" or \"pt-BR\")",
        ))
    }
}

/// Builder for constructing the transcription server from configuration
pub(crate) struct SttServerBuilder<'a> {
    config: &'a TranscriptionConfig,
    upstream: Upstream,
}

impl<'a> SttServerBuilder<'a> {
    pub fn new(config: &'a TranscriptionConfig, upstream: Upstream) -> Self {
        Self { config, upstream }
    }

    pub fn build(self) -> anyhow::Result<Server> {
        let timeout = self.config.timeout()?;

        tracing::debug!(
            model = %self.config.model,
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            max_audio_bytes = self.config.max_audio_bytes,
            "initializing transcription service"
        );

        let provider = WhisperProvider::new(self.upstream.clone(), self.config.model.clone(), timeout);

        Ok(Server {
            provider: Box::new(provider),
            upstream: self.upstream,
            limits: AudioLimits {
                max_audio_bytes: self.config.max_audio_bytes,
                allowed_extensions: self.config.allowed_extensions.clone(),
                default_language: self.config.default_language.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn limits() -> AudioLimits {
        AudioLimits {
            max_audio_bytes: 16,
            allowed_extensions: vec!["wav".to_owned(), "mp3".to_owned()],
            default_language: Some("cs".to_owned()),
        }
    }

    fn request(audio: &'static [u8], filename: Option<&str>, language: Option<&str>) -> TranscriptionRequest {
        TranscriptionRequest {
            audio: Bytes::from_static(audio),
            language: language.map(str::to_owned),
            filename: filename.map(str::to_owned),
            content_type: None,
        }
    }

    fn message(result: crate::Result<TranscriptionRequest>) -> String {
        match result {
            Err(UpstreamError::InvalidInput(message)) => message,
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn empty_audio_is_rejected() {
        assert!(message(limits().validate(request(b"", None, None))).contains("empty"));
    }

    #[test]
    fn oversized_audio_is_rejected() {
        let err = message(limits().validate(request(&[0; 17], None, None)));
        assert!(err.contains("17 bytes"));
    }

    #[test]
    fn extension_must_be_allowed() {
        assert!(limits().validate(request(b"abc", Some("voice.WAV"), None)).is_ok());
        assert!(message(limits().validate(request(b"abc", Some("notes.txt"), None))).contains(".txt"));
        assert!(message(limits().validate(request(b"abc", Some("voice"), None))).contains("no extension"));
    }

    #[test]
    fn default_language_applies_when_missing() {
        let validated = limits().validate(request(b"abc", None, None)).unwrap();
        assert_eq!(validated.language.as_deref(), Some("cs"));

        let validated = limits().validate(request(b"abc", None, Some(" en "))).unwrap();
        assert_eq!(validated.language.as_deref(), Some("en"));

        let validated = limits().validate(request(b"abc", None, Some(""))).unwrap();
        assert_eq!(validated.language.as_deref(), Some("cs"));
    }

    #[test]
    fn malformed_language_is_rejected() {
        assert!(message(limits().validate(request(b"abc", None, Some("c")))).contains("language"));
        assert!(limits().validate(request(b"abc", None, Some("en;drop"))).is_err());
        assert!(limits().validate(request(b"abc", None, Some("pt-BR"))).is_ok());
    }
}
