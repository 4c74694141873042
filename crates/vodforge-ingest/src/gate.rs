//! Concurrency admission gate.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds the number of jobs simultaneously in `processing`.
///
/// Admission is non-blocking: it succeeds iff a slot is free. The slot
/// is tied to the returned permit and released exactly once when the
/// permit drops, on every exit path including transcoder panics.
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    max_slots: usize,
}

/// A held processing slot. Dropping it releases the slot.
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyGate {
    /// Create a gate with `max_slots` processing slots.
    pub fn new(max_slots: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_slots)),
            max_slots,
        }
    }

    /// Try to claim a processing slot without waiting.
    pub fn try_admit(&self) -> Option<AdmissionPermit> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| AdmissionPermit { _permit: permit })
    }

    /// Number of jobs currently holding a slot.
    pub fn active(&self) -> usize {
        self.max_slots - self.semaphore.available_permits()
    }

    /// Configured slot count.
    pub fn max_slots(&self) -> usize {
        self.max_slots
    }
}
