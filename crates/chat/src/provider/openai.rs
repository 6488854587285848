//! OpenAI-compatible chat completion provider

use std::time::Duration;

use async_trait::async_trait;
use murmur_core::{Upstream, UpstreamError};

use super::ChatProvider;
use crate::protocol::{OpenAiRequest, OpenAiResponse};
use crate::types::{ChatRequest, ChatResult};

/// Generation settings applied to every completion
#[derive(Debug, Clone)]
pub(crate) struct Sampling {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

pub(crate) struct OpenAiProvider {
    upstream: Upstream,
    sampling: Sampling,
    timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(upstream: Upstream, sampling: Sampling, timeout: Duration) -> Self {
        Self {
            upstream,
            sampling,
            timeout,
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResult, UpstreamError> {
        let body = OpenAiRequest {
            model: &self.sampling.model,
            messages: &request.messages,
            max_tokens: self.sampling.max_tokens,
            temperature: self.sampling.temperature,
        };

        tracing::debug!(
            model = %self.sampling.model,
            turns = request.messages.len(),
            "sending chat completion request"
        );

        let response: OpenAiResponse = self
            .upstream
            .send_json(self.upstream.post("chat/completions").json(&body), self.timeout)
            .await?;

        let finish_reason = response
            .choices
            .first()
            .and_then(|choice| choice.finish_reason.as_deref())
            .unwrap_or("unknown");

        let Some(reply) = response.reply() else {
            return Err(UpstreamError::MalformedResponse(format!(
                "completion contained no text (finish_reason: {finish_reason})"
            )));
        };

        tracing::debug!(characters = reply.chars().count(), finish_reason, "chat completion received");

        Ok(ChatResult {
            reply: reply.to_owned(),
            model: response.model.clone().unwrap_or_else(|| self.sampling.model.clone()),
            usage: response.usage.unwrap_or_default(),
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}
