use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::UpstreamError;
use crate::retry::RetryPolicy;
use crate::status::ServiceRegistry;

/// Everything a service needs to talk to the hosted provider
///
/// Cloning is cheap: the client pools connections internally and the
/// registry is shared behind an `Arc`.
#[derive(Clone)]
pub struct Upstream {
    client: Client,
    base_url: Url,
    api_key: SecretString,
    retry: RetryPolicy,
    registry: Arc<ServiceRegistry>,
}

impl Upstream {
    pub fn new(
        client: Client,
        base_url: Url,
        api_key: SecretString,
        retry: RetryPolicy,
        registry: Arc<ServiceRegistry>,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            retry,
            registry,
        }
    }

    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for `path` below the configured base
    ///
    /// Joins textually so a base path such as `/v1` is kept.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.endpoint(path)).bearer_auth(self.api_key.expose_secret())
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.endpoint(path)).bearer_auth(self.api_key.expose_secret())
    }

    /// Perform one attempt and classify anything but a 2xx
    pub async fn send(&self, request: RequestBuilder, timeout: Duration) -> Result<Response, UpstreamError> {
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| UpstreamError::from_transport(&e, timeout))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = crate::retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();

        tracing::debug!(status = status.as_u16(), body = %crate::truncate_body(&body), "upstream returned an error status");

        Err(UpstreamError::from_status(status, &body, retry_after))
    }

    /// Send one attempt and decode a JSON body
    pub async fn send_json<T>(&self, request: RequestBuilder, timeout: Duration) -> Result<T, UpstreamError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(request, timeout).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::from_transport(&e, timeout))?;

        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::MalformedResponse(format!("invalid JSON body: {e}")))
    }
}

impl std::fmt::Debug for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upstream")
            .field("base_url", &self.base_url.as_str())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
