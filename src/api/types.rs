//! Shared types for the API layer.

use std::sync::Arc;

use uuid::Uuid;

use crate::core_state::CoreState;

/// Header carrying the acting user's id. New patients are stamped with it.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

/// Caller identity, injected into request extensions by the identity
/// middleware. `user_id` is `None` for anonymous requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestIdentity {
    pub user_id: Option<Uuid>,
}
