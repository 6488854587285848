#![allow(clippy::must_use_candidate)]

pub mod chat;
pub mod cors;
mod env;
pub mod health;
mod loader;
pub mod retry;
pub mod server;
pub mod stt;
pub mod telemetry;
pub mod upstream;

use std::time::Duration;

use serde::Deserialize;

pub use chat::*;
pub use cors::*;
pub use health::*;
pub use retry::*;
pub use server::*;
pub use stt::*;
pub use telemetry::{LogFormat, TelemetryConfig};
pub use upstream::*;

/// Environment variable holding the upstream API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable overriding the upstream base URL
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Environment variable overriding the listen port
pub const PORT_ENV: &str = "PORT";

/// Top-level murmur configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream provider connection
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// Speech-to-text settings
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    /// Chat completion settings
    #[serde(default)]
    pub chat: ChatConfig,
    /// Retry policy shared by all upstream calls
    #[serde(default)]
    pub retry: RetryConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}

/// Parse a human-readable duration such as `"30s"` or `"250ms"`
///
/// # Errors
///
/// Returns an error naming `field` if the value cannot be parsed
pub fn parse_duration(field: &str, value: &str) -> anyhow::Result<Duration> {
    duration_str::parse(value).map_err(|e| anyhow::anyhow!("invalid duration for {field} ('{value}'): {e}"))
}
