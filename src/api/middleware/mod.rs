//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Identity: parse `X-User-Id`, reject malformed ids
//! 2. Audit logger: runs after identity, so it can log the user

pub mod audit;
pub mod identity;
