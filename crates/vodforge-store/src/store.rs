//! Write-through job store.
//!
//! The in-process index is the fast path and always succeeds; the
//! durable tier is best-effort. A durable-tier failure is logged as a
//! warning and never surfaces to the caller, so the state machine on
//! top never has to know persistence can fail.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use vodforge_models::{VideoJob, VideoJobId};

use crate::error::StoreResult;
use crate::memory::InMemoryIndex;
use crate::metrics::{record_durable_op, record_index_lookup};

/// A TTL-bearing secondary store surviving process restarts.
///
/// Implemented by `RedisTier`; tests substitute their own doubles.
#[async_trait]
pub trait DurableTier: Send + Sync {
    /// Persist a job record with the given TTL.
    async fn put(&self, job: &VideoJob, ttl: Duration) -> StoreResult<()>;

    /// Fetch a job record by id.
    async fn get(&self, id: &VideoJobId) -> StoreResult<Option<VideoJob>>;

    /// Ids of a user's jobs.
    async fn list_ids_by_user(&self, user_id: &str) -> StoreResult<Vec<VideoJobId>>;

    /// Remove a job record.
    async fn delete(&self, id: &VideoJobId) -> StoreResult<()>;
}

/// Two-tier read/write-through job store.
pub struct JobStore {
    index: InMemoryIndex,
    durable: Option<Arc<dyn DurableTier>>,
    ttl: Duration,
}

impl JobStore {
    /// Store with no durable tier (tests, single-run tooling).
    pub fn in_memory() -> Self {
        Self {
            index: InMemoryIndex::new(),
            durable: None,
            ttl: Duration::ZERO,
        }
    }

    /// Store backed by a durable tier; `ttl` is the processed-artifact
    /// retention window from the storage policy.
    pub fn with_durable(durable: Arc<dyn DurableTier>, ttl: Duration) -> Self {
        Self {
            index: InMemoryIndex::new(),
            durable: Some(durable),
            ttl,
        }
    }

    /// Write a job record through both tiers.
    ///
    /// The index write always succeeds. The durable write is attempted
    /// with the configured TTL; on failure the job remains fully usable
    /// from the index for the remainder of the process lifetime.
    pub async fn put(&self, job: &VideoJob) {
        self.index.put(job.clone()).await;

        if let Some(durable) = &self.durable {
            match durable.put(job, self.ttl).await {
                Ok(()) => {
                    record_durable_op("put", true);
                    debug!(job_id = %job.id, "Persisted job record");
                }
                Err(e) => {
                    record_durable_op("put", false);
                    warn!(job_id = %job.id, "Durable write failed, serving from index only: {}", e);
                }
            }
        }
    }

    /// Look up a job: index first, durable tier on miss.
    ///
    /// A record recovered from the durable tier is promoted back into
    /// the index so later reads stay on the fast path.
    pub async fn get(&self, id: &VideoJobId) -> Option<VideoJob> {
        if let Some(job) = self.index.get(id).await {
            record_index_lookup(true);
            return Some(job);
        }
        record_index_lookup(false);

        let durable = self.durable.as_ref()?;
        match durable.get(id).await {
            Ok(Some(job)) => {
                record_durable_op("get", true);
                self.index.put(job.clone()).await;
                Some(job)
            }
            Ok(None) => {
                record_durable_op("get", true);
                None
            }
            Err(e) => {
                record_durable_op("get", false);
                warn!(job_id = %id, "Durable read failed: {}", e);
                None
            }
        }
    }

    /// Jobs for a user, newest first, truncated to `limit`.
    ///
    /// Answered from the index under normal operation; the durable tier
    /// is only consulted when the index has nothing for this user
    /// (crash recovery).
    pub async fn list_by_user(&self, user_id: &str, limit: usize) -> Vec<VideoJob> {
        let jobs = self.index.list_by_user(user_id, limit).await;
        if !jobs.is_empty() {
            return jobs;
        }

        let Some(durable) = &self.durable else {
            return jobs;
        };
        let ids = match durable.list_ids_by_user(user_id).await {
            Ok(ids) => {
                record_durable_op("list", true);
                ids
            }
            Err(e) => {
                record_durable_op("list", false);
                warn!(user_id, "Durable list failed: {}", e);
                return Vec::new();
            }
        };

        let mut recovered = Vec::new();
        for id in ids {
            if let Ok(Some(job)) = durable.get(&id).await {
                self.index.put(job.clone()).await;
                recovered.push(job);
            }
        }
        recovered.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recovered.truncate(limit);
        recovered
    }

    /// Delete a job record from both tiers.
    pub async fn delete(&self, id: &VideoJobId) {
        self.index.remove(id).await;

        if let Some(durable) = &self.durable {
            match durable.delete(id).await {
                Ok(()) => record_durable_op("delete", true),
                Err(e) => {
                    record_durable_op("delete", false);
                    warn!(job_id = %id, "Durable delete failed: {}", e);
                }
            }
        }
    }
}
