//! Shared building blocks for murmur's upstream proxy endpoints
//!
//! Error taxonomy, the bounded retry loop, the upstream HTTP client and the
//! process-wide service status registry live here so the transcription and
//! chat crates apply one policy.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod client;
pub mod error;
#[cfg(feature = "http")]
pub mod extract;
pub mod retry;
pub mod status;
mod upstream;

pub use client::{build_http_client, retry_after, truncate_body};
pub use error::{ErrorKind, HttpError, Result, UpstreamError};
pub use retry::{RetryPolicy, retry};
pub use status::{OverallStatus, ServiceRegistry, ServiceStatus};
pub use upstream::Upstream;
