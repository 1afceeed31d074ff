//! Patient JSON API.
//!
//! Exposes the patient repository over HTTP for remote clients
//! (`HttpBackend`, browser front-ends). Routes are nested under `/api/`
//! behind a small middleware stack: Identity → Audit → Handler.
//!
//! `patient_api_router()` returns a `Router` that can be mounted on any
//! axum server; `start_api_server()` binds and serves it.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::patient_api_router;
pub use server::{start_api_server, ApiServer, ApiSession, ServerError};
pub use types::ApiContext;
