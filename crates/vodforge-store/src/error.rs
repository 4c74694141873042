//! Store error types.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from the durable tier.
///
/// These never reach business logic: the write-through store logs them
/// at warning level and degrades to in-process-only visibility.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
