//! Error types for the Waypath decision engine.

use thiserror::Error;

/// Engine failure taxonomy.
///
/// The engine degrades gracefully almost everywhere — missing optional inputs
/// fall back to documented defaults rather than erroring. The one hard
/// failure is a route without steps: there is no meaningful guidance to give.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("route has no steps")]
    InvalidRoute,
}

pub type Result<T> = std::result::Result<T, EngineError>;
