//! Repository layer — entity-scoped database operations.

mod patient;

pub use patient::*;
