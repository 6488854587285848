use std::time::Duration;

use serde::Deserialize;

/// Upstream health probing configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    /// Interval for background reachability probes (e.g. "30s"); unset disables them
    #[serde(default)]
    pub probe_interval: Option<String>,
    /// Timeout for a single probe request
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_interval: None,
            probe_timeout: default_probe_timeout(),
        }
    }
}

impl HealthConfig {
    /// Parsed probe interval, `None` when background probing is off
    ///
    /// # Errors
    ///
    /// Returns an error if the configured value is not a valid duration
    pub fn probe_interval(&self) -> anyhow::Result<Option<Duration>> {
        self.probe_interval
            .as_deref()
            .map(|value| crate::parse_duration("server.health.probe_interval", value))
            .transpose()
    }

    /// Parsed probe timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the configured value is not a valid duration
    pub fn probe_timeout(&self) -> anyhow::Result<Duration> {
        crate::parse_duration("server.health.probe_timeout", &self.probe_timeout)
    }
}

fn default_probe_timeout() -> String {
    "5s".to_string()
}
