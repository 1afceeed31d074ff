//! Audit logging middleware.
//!
//! Logs every API request with method, path, response status and the
//! caller's user id. Runs innermost (after identity has been resolved).

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::RequestIdentity;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let user = req
        .extensions()
        .get::<RequestIdentity>()
        .and_then(|identity| identity.user_id)
        .map(|id| id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16();
    if response.status().is_server_error() {
        tracing::warn!(%method, %path, status, %user, "API request failed");
    } else {
        tracing::debug!(%method, %path, status, %user, "API request");
    }
    response
}
