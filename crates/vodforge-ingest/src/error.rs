//! Ingestion error types.

use thiserror::Error;

use crate::probe::ProbeError;
use crate::validate::ValidationError;

pub type IngestResult<T> = Result<T, IngestError>;

/// Errors surfaced synchronously by the public operations.
///
/// Transcoding failures are not represented here: processing is
/// asynchronous, so they are recorded on the job record (`failed` +
/// `error`) and observed by polling.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Upload rejected before any job record exists.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The file passed basic checks but its contents could not be
    /// introspected.
    #[error("Metadata extraction failed: {0}")]
    Probe(#[from] ProbeError),

    /// Caller does not own the job it tried to cancel.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Invalid process-wide configuration at service construction.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IngestError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
