//! Caller identity middleware.
//!
//! Reads the optional `X-User-Id` header and injects `RequestIdentity`
//! into request extensions. A present but malformed id is a 400.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{RequestIdentity, USER_ID_HEADER};

pub async fn resolve_identity(req: Request<axum::body::Body>, next: Next) -> Response {
    match resolve_identity_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn resolve_identity_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = match req.headers().get(USER_ID_HEADER) {
        None => None,
        Some(value) => {
            let raw = value
                .to_str()
                .map_err(|_| ApiError::BadRequest("Invalid user id header".into()))?;
            let id = Uuid::parse_str(raw.trim())
                .map_err(|_| ApiError::BadRequest(format!("Invalid user id: {raw}")))?;
            Some(id)
        }
    };

    req.extensions_mut().insert(RequestIdentity { user_id });
    Ok(next.run(req).await)
}
