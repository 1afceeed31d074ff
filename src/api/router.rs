//! Patient API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the patient API router.
pub fn patient_api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    // Layers apply bottom (innermost) to top (outermost):
    //   Identity → Audit → Handler
    // NOTE: Path params use `:param` syntax (axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route("/patients/:id", get(endpoints::patients::detail))
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::identity::resolve_identity));

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
}
