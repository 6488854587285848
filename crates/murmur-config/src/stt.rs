use serde::Deserialize;

/// Speech-to-text configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranscriptionConfig {
    /// Upstream model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-attempt timeout (e.g. "30s")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Largest accepted audio payload in bytes
    #[serde(default = "default_max_audio_bytes")]
    pub max_audio_bytes: usize,
    /// File extensions accepted when the client supplies a filename
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Language hint used when the request carries none (ISO 639-1)
    #[serde(default)]
    pub default_language: Option<String>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            timeout: default_timeout(),
            max_audio_bytes: default_max_audio_bytes(),
            allowed_extensions: default_allowed_extensions(),
            default_language: None,
        }
    }
}

impl TranscriptionConfig {
    /// Parsed per-attempt timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the configured value is not a valid duration
    pub fn timeout(&self) -> anyhow::Result<std::time::Duration> {
        crate::parse_duration("transcription.timeout", &self.timeout)
    }
}

fn default_model() -> String {
    "whisper-1".to_string()
}

fn default_timeout() -> String {
    "30s".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_audio_bytes() -> usize {
    25 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    ["m4a", "mp3", "wav", "webm", "mp4"].into_iter().map(str::to_owned).collect()
}
