//! Error types for pool construction.

use thiserror::Error;

/// Errors produced when building a [`Pool`](crate::Pool).
///
/// Submission is fire-and-forget and infallible by design, so construction is
/// the only fallible public operation.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The operating system refused to spawn a pool thread.
    #[error("failed to spawn pool thread: {0}")]
    Spawn(#[from] std::io::Error),
}
