//! Transcoder seam.
//!
//! The actual pixel-level encode is an external collaborator. The core
//! invokes it once a job is admitted, hands it a progress sender and a
//! cooperative cancellation signal, and records the outcome on the job.

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use vodforge_models::VideoJob;

use crate::manifest::ManifestConfig;

/// Progress updates from a running transcode (0-100).
pub type ProgressSender = mpsc::Sender<u8>;

/// Cancellation signal; flips to true when the job record is cancelled.
///
/// Cancellation is cooperative: "record says cancelled" and "transcoder
/// actually stopped" are two separate facts. The transcoder is expected
/// to observe the signal and abort, but the record's terminal state is
/// committed either way.
pub type CancelSignal = watch::Receiver<bool>;

/// Errors from the external transcoder.
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("Transcode failed: {0}")]
    Failed(String),

    #[error("Transcoder aborted after cancellation")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscodeError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Produces the renditions and packaging output for one job.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(
        &self,
        job: &VideoJob,
        config: &ManifestConfig,
        progress: ProgressSender,
        cancel: CancelSignal,
    ) -> Result<(), TranscodeError>;
}
