//! `OpenAI` chat completion API wire format types

use serde::{Deserialize, Serialize};

use crate::types::{Message, Usage};

/// `OpenAI` chat completion request
#[derive(Debug, Serialize)]
pub(crate) struct OpenAiRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub max_tokens: u32,
    pub temperature: f64,
}

/// `OpenAI` chat completion response, reduced to the fields we use
#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<OpenAiChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiChoice {
    pub message: OpenAiMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiMessage {
    /// Null when the model refused or only produced tool calls
    #[serde(default)]
    pub content: Option<String>,
}

impl OpenAiResponse {
    /// Trimmed text of the first choice, if it has any
    pub fn reply(&self) -> Option<&str> {
        self.choices
            .first()?
            .message
            .content
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}
