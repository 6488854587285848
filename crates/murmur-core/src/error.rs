use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, UpstreamError>;

/// Trait for domain errors that can be converted to HTTP responses
///
/// The handler layer turns these into `{ "error", "kind" }` bodies, keeping
/// domain errors decoupled from axum.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error kind (e.g. `InvalidInput`)
    fn error_type(&self) -> &str;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;
}

/// Error kinds reported to clients in the `kind` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr, strum::Display)]
pub enum ErrorKind {
    /// Client sent something we refuse to forward
    InvalidInput,
    /// Provider refused the call or answered with garbage
    UpstreamRejected,
    /// Provider unreachable after all retries
    UpstreamUnavailable,
    /// Last attempt ran into the per-call timeout
    Timeout,
    /// No route for the path
    NotFound,
    /// Route exists but not for this method
    MethodNotAllowed,
}

impl ErrorKind {
    /// HTTP status used for this kind
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::UpstreamRejected => StatusCode::BAD_GATEWAY,
            Self::UpstreamUnavailable | Self::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Errors produced while serving a proxied request
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Local validation failed; the provider was never contacted
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Provider answered with a non-retryable 4xx
    #[error("upstream rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Provider answered 2xx with a body we could not use
    #[error("upstream returned an unusable response: {0}")]
    MalformedResponse(String),

    /// Connection failure, 5xx or rate limiting
    #[error("upstream unavailable: {message}")]
    Unavailable {
        message: String,
        /// Server-provided hint from a `Retry-After` header
        retry_after: Option<Duration>,
    },

    /// A single attempt exceeded its timeout
    #[error("upstream call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl UpstreamError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Rejected { .. } | Self::MalformedResponse(_) => ErrorKind::UpstreamRejected,
            Self::Unavailable { .. } => ErrorKind::UpstreamUnavailable,
            Self::Timeout(_) => ErrorKind::Timeout,
        }
    }

    /// Whether another attempt may succeed
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout(_))
    }

    /// What this error says about upstream reachability
    ///
    /// `None` for local failures that never reached the provider.
    pub const fn reachability(&self) -> Option<bool> {
        match self {
            Self::InvalidInput(_) => None,
            Self::Rejected { .. } | Self::MalformedResponse(_) => Some(true),
            Self::Unavailable { .. } | Self::Timeout(_) => Some(false),
        }
    }

    /// Classify a non-success HTTP status from the provider
    pub fn from_status(status: StatusCode, body: &str, retry_after: Option<Duration>) -> Self {
        let message = crate::truncate_body(body);

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            Self::Unavailable {
                message: format!("provider returned {status}: {message}"),
                retry_after,
            }
        } else {
            Self::Rejected {
                status: status.as_u16(),
                message,
            }
        }
    }

    /// Classify a transport-level failure
    pub fn from_transport(error: &reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            Self::Timeout(timeout)
        } else if error.is_decode() {
            Self::MalformedResponse(error.to_string())
        } else {
            Self::Unavailable {
                message: error.to_string(),
                retry_after: None,
            }
        }
    }
}

impl HttpError for UpstreamError {
    fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    fn error_type(&self) -> &str {
        self.kind().as_str()
    }

    fn client_message(&self) -> String {
        self.to_string()
    }
}
