//! Run a handler against an in-memory sink and snapshot what it wrote.

use std::any::Any;
use std::convert::Infallible;
use std::panic::AssertUnwindSafe;

use axum::extract::Request;
use axum::response::Response;
use futures::FutureExt;
use tower::{Service, ServiceExt};

use offload_core::TerminalResult;

use super::error::CaptureError;

/// Run `handler` on `req` and capture its response.
///
/// Nothing here touches a network connection: the response is buffered in
/// memory (up to `limit` body bytes). A panicking handler is contained and
/// reported as [`CaptureError::Panicked`].
pub async fn capture<S>(handler: S, req: Request, limit: usize) -> Result<TerminalResult, CaptureError>
where
    S: Service<Request, Response = Response, Error = Infallible> + Send,
    S::Future: Send,
{
    let response = match AssertUnwindSafe(handler.oneshot(req)).catch_unwind().await {
        Ok(Ok(response)) => response,
        Ok(Err(infallible)) => match infallible {},
        Err(panic) => return Err(CaptureError::Panicked(panic_message(panic.as_ref()))),
    };

    into_terminal_result(response, limit).await
}

/// Buffer a response into an immutable [`TerminalResult`].
pub async fn into_terminal_result(
    response: Response,
    limit: usize,
) -> Result<TerminalResult, CaptureError> {
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(CaptureError::Body)?;

    let result = TerminalResult::new(
        parts.status.as_u16(),
        String::from_utf8_lossy(&bytes).into_owned(),
    );
    Ok(parts.headers.iter().fold(result, |result, (name, value)| {
        result.with_header(name.as_str(), String::from_utf8_lossy(value.as_bytes()))
    }))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
