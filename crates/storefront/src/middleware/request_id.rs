//! Request ID middleware for request tracing and correlation.
//!
//! Each request gets an ID that ties together its log lines, its Sentry
//! events and, for checkout, the gateway call it triggered. An ID supplied by
//! an upstream proxy is reused when it looks sane; otherwise a UUID v4 is
//! generated.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream ID accepted.
const MAX_REQUEST_ID_LEN: usize = 64;

/// Accept an upstream ID only if it is short and made of
/// `[A-Za-z0-9-_]`, so it is safe to log and echo back.
fn accept_upstream(id: &str) -> Option<&str> {
    let valid = !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    valid.then_some(id)
}

/// Middleware that ensures every request has a request ID.
///
/// The ID is recorded in the current span's `request_id` field, set as a
/// Sentry scope tag, and returned in the `x-request-id` response header.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(accept_upstream)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", &request_id);

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_upstream() {
        assert_eq!(accept_upstream("cf-8a1b2c3d"), Some("cf-8a1b2c3d"));
        assert_eq!(accept_upstream(""), None);
        assert_eq!(accept_upstream("has space"), None);
        assert_eq!(accept_upstream(&"a".repeat(65)), None);
    }
}
