//! Best-effort job status events.
//!
//! Published on every committed transition; lossy by design. Polling
//! the job record remains the source of truth, so a dropped event is
//! never an error.

use tokio::sync::broadcast;

use vodforge_models::{JobStatus, VideoJob, VideoJobId};

/// Channel capacity before the oldest events are dropped.
const EVENT_CAPACITY: usize = 256;

/// A committed status change.
#[derive(Debug, Clone)]
pub struct JobEvent {
    pub job_id: VideoJobId,
    pub status: JobStatus,
    pub progress: u8,
}

impl JobEvent {
    pub fn from_job(job: &VideoJob) -> Self {
        Self {
            job_id: job.id.clone(),
            status: job.status,
            progress: job.progress,
        }
    }
}

/// Broadcast bus for job events.
pub struct EventBus {
    tx: broadcast::Sender<JobEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: JobEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.tx.subscribe()
    }
}
