pub(crate) mod openai;

use async_trait::async_trait;
use murmur_core::UpstreamError;

use crate::types::{ChatRequest, ChatResult};

/// A hosted chat-completion backend; one attempt per call
#[async_trait]
pub(crate) trait ChatProvider: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResult, UpstreamError>;

    fn name(&self) -> &str;
}
