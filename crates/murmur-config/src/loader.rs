use std::net::SocketAddr;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};

use crate::{API_KEY_ENV, BASE_URL_ENV, Config, PORT_ENV};

impl Config {
    /// Build the effective configuration
    ///
    /// Starts from the TOML file when one is given (defaults otherwise),
    /// overlays `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `PORT`, then validates.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, an environment
    /// override is malformed, or validation fails
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env()?;
        config.validate()?;

        Ok(config)
    }

    /// Read a TOML file, expanding `{{ env.VAR }}` placeholders first
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, expansion fails, or the
    /// TOML is invalid
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse configuration text
    ///
    /// # Errors
    ///
    /// Returns an error if placeholder expansion or TOML parsing fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))
    }

    /// Apply environment overrides on top of file values
    fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Some(key) = non_empty_var(API_KEY_ENV) {
            self.openai.api_key = Some(SecretString::from(key));
        }

        if let Some(base_url) = non_empty_var(BASE_URL_ENV) {
            self.openai.base_url = base_url
                .parse()
                .map_err(|e| anyhow::anyhow!("{BASE_URL_ENV} is not a valid URL: {e}"))?;
        }

        if let Some(port) = non_empty_var(PORT_ENV) {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("{PORT_ENV} must be a port number, got '{port}': {e}"))?;

            let mut address: SocketAddr = self.server.listen_address();
            address.set_port(port);
            self.server.listen_address = Some(address);
        }

        Ok(())
    }

    /// Validate that the configuration is usable
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or any policy value is
    /// out of range
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_credentials()?;
        self.validate_transcription()?;
        self.validate_chat()?;
        self.validate_retry()?;
        self.validate_server()?;
        self.validate_telemetry()?;
        Ok(())
    }

    fn validate_credentials(&self) -> anyhow::Result<()> {
        match &self.openai.api_key {
            Some(key) if !key.expose_secret().trim().is_empty() => {}
            _ => anyhow::bail!("{API_KEY_ENV} must be set (or openai.api_key configured)"),
        }

        if self.openai.connect_timeout()?.is_zero() {
            anyhow::bail!("openai.connect_timeout must be greater than 0");
        }

        Ok(())
    }

    fn validate_transcription(&self) -> anyhow::Result<()> {
        let stt = &self.transcription;

        if stt.model.trim().is_empty() {
            anyhow::bail!("transcription.model must not be empty");
        }
        if stt.timeout()?.is_zero() {
            anyhow::bail!("transcription.timeout must be greater than 0");
        }
        if stt.max_audio_bytes == 0 {
            anyhow::bail!("transcription.max_audio_bytes must be greater than 0");
        }
        if stt.allowed_extensions.is_empty() {
            anyhow::bail!("transcription.allowed_extensions must list at least one extension");
        }

        Ok(())
    }

    fn validate_chat(&self) -> anyhow::Result<()> {
        let chat = &self.chat;

        if chat.model.trim().is_empty() {
            anyhow::bail!("chat.model must not be empty");
        }
        if chat.timeout()?.is_zero() {
            anyhow::bail!("chat.timeout must be greater than 0");
        }
        if chat.max_tokens == 0 {
            anyhow::bail!("chat.max_tokens must be greater than 0");
        }
        if !(0.0..=2.0).contains(&chat.temperature) {
            anyhow::bail!("chat.temperature must be between 0.0 and 2.0");
        }

        Ok(())
    }

    fn validate_retry(&self) -> anyhow::Result<()> {
        let base = self.retry.base_delay()?;
        let max = self.retry.max_delay()?;

        if base > max {
            anyhow::bail!("retry.base_delay must not exceed retry.max_delay");
        }

        Ok(())
    }

    fn validate_server(&self) -> anyhow::Result<()> {
        if let Some(interval) = self.server.health.probe_interval()?
            && interval.is_zero()
        {
            anyhow::bail!("server.health.probe_interval must be greater than 0");
        }

        if self.server.health.probe_timeout()?.is_zero() {
            anyhow::bail!("server.health.probe_timeout must be greater than 0");
        }

        Ok(())
    }

    fn validate_telemetry(&self) -> anyhow::Result<()> {
        if let Some(ref telemetry) = self.telemetry
            && !(0.0..=1.0).contains(&telemetry.sampling_rate)
        {
            anyhow::bail!("telemetry.sampling_rate must be between 0.0 and 1.0");
        }

        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
