use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Default `OpenAI` API base URL
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection settings for the upstream provider
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key, usually taken from `OPENAI_API_KEY`
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL including the version prefix
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Timeout for establishing a TCP connection (e.g. "5s")
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl OpenAiConfig {
    /// Parsed connect timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the configured value is not a valid duration
    pub fn connect_timeout(&self) -> anyhow::Result<std::time::Duration> {
        crate::parse_duration("openai.connect_timeout", &self.connect_timeout)
    }
}

#[allow(clippy::expect_used)]
fn default_base_url() -> Url {
    Url::parse(DEFAULT_OPENAI_BASE_URL).expect("valid default URL")
}

fn default_connect_timeout() -> String {
    "5s".to_string()
}
