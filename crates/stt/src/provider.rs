pub(crate) mod whisper;

use async_trait::async_trait;
use murmur_core::UpstreamError;

use crate::types::{TranscriptionRequest, TranscriptionResult};

/// A hosted speech-to-text backend
///
/// Implementations make exactly one attempt per call; retries and status
/// recording happen in [`crate::Server`].
#[async_trait]
pub(crate) trait SttProvider: Send + Sync {
    /// Transcribe already-validated audio
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<TranscriptionResult, UpstreamError>;

    /// Name used in logs
    fn name(&self) -> &str;
}
