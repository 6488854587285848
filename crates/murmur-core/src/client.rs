use std::time::Duration;

use http::{HeaderMap, HeaderValue, header};
use reqwest::Client;

/// Longest slice of an upstream error body we pass along
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Build the HTTP client shared by every upstream call
///
/// Per-call timeouts are applied on each request; the client itself only
/// bounds connection setup so one pooled client can serve both services.
pub fn build_http_client(connect_timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

    Client::builder()
        .connect_timeout(connect_timeout)
        .pool_idle_timeout(Some(Duration::from_secs(30)))
        .tcp_nodelay(true)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .user_agent(concat!("murmur/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .build()
}

/// Parse a `Retry-After` header given in seconds
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Trim an upstream error body to something fit for logs and clients
pub fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return "no response body".to_owned();
    }

    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_owned(),
    }
}
