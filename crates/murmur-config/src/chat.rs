use serde::Deserialize;

/// Chat completion configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Upstream model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-attempt timeout (e.g. "15s")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature (0.0 to 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// System prompt prepended when the conversation has none
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            timeout: default_timeout(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            system_prompt: None,
        }
    }
}

impl ChatConfig {
    /// Parsed per-attempt timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the configured value is not a valid duration
    pub fn timeout(&self) -> anyhow::Result<std::time::Duration> {
        crate::parse_duration("chat.timeout", &self.timeout)
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout() -> String {
    "15s".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_tokens() -> u32 {
    500
}

#[allow(clippy::missing_const_for_fn)]
fn default_temperature() -> f64 {
    0.7
}
