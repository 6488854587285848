use std::time::Duration;

use serde::Deserialize;

/// Retry policy for transient upstream failures
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 disables retrying)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further retry
    #[serde(default = "default_base_delay")]
    pub base_delay: String,
    /// Upper bound for any single delay, including `Retry-After` hints
    #[serde(default = "default_max_delay")]
    pub max_delay: String,
    /// Randomize each backoff delay between half and full length
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay: default_base_delay(),
            max_delay: default_max_delay(),
            jitter: default_jitter(),
        }
    }
}

impl RetryConfig {
    /// Parsed base delay
    ///
    /// # Errors
    ///
    /// Returns an error if the configured value is not a valid duration
    pub fn base_delay(&self) -> anyhow::Result<Duration> {
        crate::parse_duration("retry.base_delay", &self.base_delay)
    }

    /// Parsed maximum delay
    ///
    /// # Errors
    ///
    /// Returns an error if the configured value is not a valid duration
    pub fn max_delay(&self) -> anyhow::Result<Duration> {
        crate::parse_duration("retry.max_delay", &self.max_delay)
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_retries() -> u32 {
    2
}

fn default_base_delay() -> String {
    "250ms".to_string()
}

fn default_max_delay() -> String {
    "4s".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_jitter() -> bool {
    true
}
