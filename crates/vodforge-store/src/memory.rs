//! In-process job index.

use std::collections::HashMap;

use tokio::sync::RwLock;

use vodforge_models::{VideoJob, VideoJobId};

#[derive(Default)]
struct IndexInner {
    jobs: HashMap<VideoJobId, VideoJob>,
    by_user: HashMap<String, Vec<VideoJobId>>,
}

/// Thread-safe in-process index of job records.
///
/// Writes replace whole records (single writer per record is enough;
/// no cross-record transactions), so readers never observe a partially
/// written job.
#[derive(Default)]
pub struct InMemoryIndex {
    inner: RwLock<IndexInner>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a job record.
    pub async fn put(&self, job: VideoJob) {
        let mut inner = self.inner.write().await;
        let ids = inner.by_user.entry(job.user_id.clone()).or_default();
        if !ids.contains(&job.id) {
            ids.push(job.id.clone());
        }
        inner.jobs.insert(job.id.clone(), job);
    }

    /// Look up a job by id.
    pub async fn get(&self, id: &VideoJobId) -> Option<VideoJob> {
        self.inner.read().await.jobs.get(id).cloned()
    }

    /// Jobs for a user, newest first, truncated to `limit`.
    pub async fn list_by_user(&self, user_id: &str, limit: usize) -> Vec<VideoJob> {
        let inner = self.inner.read().await;
        let Some(ids) = inner.by_user.get(user_id) else {
            return Vec::new();
        };
        let mut jobs: Vec<VideoJob> = ids
            .iter()
            .filter_map(|id| inner.jobs.get(id).cloned())
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs.truncate(limit);
        jobs
    }

    /// Remove a job record. Returns the removed record, if any.
    pub async fn remove(&self, id: &VideoJobId) -> Option<VideoJob> {
        let mut inner = self.inner.write().await;
        let job = inner.jobs.remove(id)?;
        if let Some(ids) = inner.by_user.get_mut(&job.user_id) {
            ids.retain(|jid| jid != id);
        }
        Some(job)
    }

    /// Number of records currently indexed.
    pub async fn len(&self) -> usize {
        self.inner.read().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
