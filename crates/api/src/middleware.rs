use std::time::Duration;

use axum::{extract::State, middleware::Next, response::Response};
use tokio_util::sync::CancellationToken;

use crate::context::RequestLifetime;

#[derive(Debug, Clone, Copy, Default)]
pub struct LifetimeState {
    /// Optional deadline applied to every request's lifetime.
    pub timeout: Option<Duration>,
}

/// Attach a [`RequestLifetime`] to the request.
///
/// The lifetime is cancelled as soon as this middleware's future finishes
/// or is dropped, which is what happens when the client disconnects.
pub async fn request_lifetime_middleware(
    State(state): State<LifetimeState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = CancellationToken::new();
    let _guard = token.clone().drop_guard();

    let mut lifetime = RequestLifetime::new(token);
    if let Some(timeout) = state.timeout {
        lifetime = lifetime.with_timeout(timeout);
    }
    req.extensions_mut().insert(lifetime);

    next.run(req).await
}
