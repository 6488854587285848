//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use murmur_config::{
    ChatConfig, Config, CorsConfig, HealthConfig, OpenAiConfig, RetryConfig, ServerConfig, TranscriptionConfig,
};
use secrecy::SecretString;

/// Key the mock provider accepts
pub const TEST_API_KEY: &str = "test-key";

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder pointed at an upstream base URL
    ///
    /// Timeouts and backoff are short so failure scenarios finish quickly.
    pub fn new(base_url: &str) -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig {
                        probe_timeout: "1s".to_owned(),
                        ..HealthConfig::default()
                    },
                    cors: None,
                },
                openai: OpenAiConfig {
                    api_key: Some(SecretString::from(TEST_API_KEY)),
                    base_url: base_url.parse().expect("valid URL"),
                    connect_timeout: "1s".to_owned(),
                },
                transcription: TranscriptionConfig {
                    timeout: "2s".to_owned(),
                    ..TranscriptionConfig::default()
                },
                chat: ChatConfig {
                    timeout: "2s".to_owned(),
                    ..ChatConfig::default()
                },
                retry: RetryConfig {
                    max_retries: 2,
                    base_delay: "10ms".to_owned(),
                    max_delay: "50ms".to_owned(),
                    jitter: false,
                },
                telemetry: None,
            },
        }
    }

    /// Use a different API key than the one the mock accepts
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.config.openai.api_key = Some(SecretString::from(key));
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.config.retry.max_retries = max_retries;
        self
    }

    /// Per-attempt transcription timeout
    pub fn with_transcription_timeout(mut self, timeout: &str) -> Self {
        self.config.transcription.timeout = timeout.to_owned();
        self
    }

    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.config.chat.system_prompt = Some(prompt.to_owned());
        self
    }

    /// Enable background probes
    pub fn with_probe_interval(mut self, interval: &str) -> Self {
        self.config.server.health.probe_interval = Some(interval.to_owned());
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
