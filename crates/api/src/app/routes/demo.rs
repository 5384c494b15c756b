//! Demo handlers served as background jobs.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::Extension,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
};

pub const SLOW_HANDLER_KIND: &str = "SLOW_HANDLER";
pub const ECHO_KIND: &str = "ECHO";

/// How long [`slow`] works before answering.
#[derive(Debug, Clone, Copy)]
pub struct SlowHandlerDelay(pub Duration);

/// GET|POST /slow
pub async fn slow(Extension(SlowHandlerDelay(delay)): Extension<SlowHandlerDelay>) -> &'static str {
    tokio::time::sleep(delay).await;
    tracing::info!(delay_ms = delay.as_millis() as u64, "slow handler completed");
    "Completed"
}

/// POST /echo
///
/// Answers with the request body under the request's content type.
pub async fn echo(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));

    ([(header::CONTENT_TYPE, content_type)], body)
}
