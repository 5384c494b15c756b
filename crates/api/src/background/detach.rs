//! Copy a request so it can outlive the connection that delivered it.

use axum::body::Body;
use axum::extract::Request;

use super::error::DetachError;
use crate::context::RequestLifetime;

/// Detach `req` from its caller.
///
/// Method, URI, version, headers and every extension are carried over. The
/// [`RequestLifetime`] is replaced by a detached one, and the body is read in
/// full (up to `limit` bytes) and re-wrapped so the handler can read it
/// independently. The original request is consumed.
pub async fn detach(req: Request, limit: usize) -> Result<Request, DetachError> {
    let (mut parts, body) = req.into_parts();

    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(DetachError::Body)?;

    parts.extensions.insert(RequestLifetime::detached());

    Ok(Request::from_parts(parts, Body::from(bytes)))
}
