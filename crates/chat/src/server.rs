use murmur_config::ChatConfig;
use murmur_core::{Upstream, UpstreamError};

use crate::{
    SERVICE_NAME,
    provider::{
        ChatProvider,
        openai::{OpenAiProvider, Sampling},
    },
    types::{ChatBody, ChatRequest, ChatResult, Message, Role},
};

/// Chat service: shapes the conversation, calls the provider under the
/// retry policy and records the outcome in the service registry
pub struct Server {
    provider: Box<dyn ChatProvider>,
    upstream: Upstream,
    system_prompt: Option<String>,
}

impl Server {
    /// Answer one chat request
    pub async fn chat(&self, body: ChatBody) -> crate::Result<ChatResult> {
        let request = shape(body, self.system_prompt.as_deref())?;

        let outcome = murmur_core::retry(self.upstream.retry_policy(), "chat", |attempt| {
            tracing::debug!(provider = self.provider.name(), attempt, "chat attempt");
            self.provider.complete(&request)
        })
        .await;

        self.upstream.registry().record(SERVICE_NAME, &outcome);
        outcome
    }
}

/// Turn a client body into the conversation sent upstream
///
/// Resolves the single-`message` form, validates every turn, prepends the
/// configured system prompt when the client sent none and folds `goals`
/// into the system turn.
fn shape(body: ChatBody, system_prompt: Option<&str>) -> crate::Result<ChatRequest> {
    let mut messages = match (body.messages, body.message) {
        (Some(_), Some(_)) => {
            return Err(UpstreamError::invalid_input(
                "send either 'messages' or 'message', not both",
            ));
        }
        (Some(messages), None) => messages,
        (None, Some(message)) => vec![Message::user(message)],
        (None, None) => return Err(UpstreamError::invalid_input("'messages' is required")),
    };

    if messages.is_empty() {
        return Err(UpstreamError::invalid_input("'messages' must not be empty"));
    }

    if let Some(index) = messages.iter().position(|m| m.content.trim().is_empty()) {
        return Err(UpstreamError::invalid_input(format!(
            "message {index} has empty content"
        )));
    }

    if !messages.iter().any(|m| m.role == Role::User) {
        return Err(UpstreamError::invalid_input(
            "conversation needs at least one user message",
        ));
    }

    let has_system = messages.iter().any(|m| m.role == Role::System);
    if !has_system && let Some(prompt) = system_prompt.map(str::trim).filter(|p| !p.is_empty()) {
        messages.insert(0, Message::system(prompt));
    }

    let goals: Vec<&str> = body.goals.iter().map(String::as_str).map(str::trim).filter(|g| !g.is_empty()).collect();
    if !goals.is_empty() {
        let line = format!("User goals: {}", goals.join(", "));

        match messages.iter_mut().find(|m| m.role == Role::System) {
            Some(system) => {
                system.content.push_str("\n\n");
                system.content.push_str(&line);
            }
            None => messages.insert(0, Message::system(line)),
        }
    }

    Ok(ChatRequest { messages })
}

/// Builder for constructing the chat server from configuration
pub(crate) struct ChatServerBuilder<'a> {
    config: &'a ChatConfig,
    upstream: Upstream,
}

impl<'a> ChatServerBuilder<'a> {
    pub fn new(config: &'a ChatConfig, upstream: Upstream) -> Self {
        Self { config, upstream }
    }

    pub fn build(self) -> anyhow::Result<Server> {
        let timeout = self.config.timeout()?;
        let sampling = Sampling {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        tracing::debug!(
            model = %sampling.model,
            max_tokens = sampling.max_tokens,
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "initializing chat service"
        );

        Ok(Server {
            provider: Box::new(OpenAiProvider::new(self.upstream.clone(), sampling, timeout)),
            upstream: self.upstream,
            system_prompt: self.config.system_prompt.clone(),
        })
    }
}
