//! Job lifecycle service.
//!
//! One service object per process, constructed explicitly by the entry
//! point and shared via `Arc` (no hidden global state). Composes the
//! validator, extractor, quality selector, store and concurrency gate
//! into the public submit/get/list/cancel operations.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use vodforge_models::{
    JobStatus, Limits, ManifestSettings, QualityCatalog, QualityLabel, StoragePolicy, UploadedFile,
    VideoJob, VideoJobId,
};
use vodforge_store::JobStore;

use crate::error::{IngestError, IngestResult};
use crate::events::{EventBus, JobEvent};
use crate::gate::ConcurrencyGate;
use crate::manifest::{build_manifest_config, ManifestConfig};
use crate::probe::MetadataExtractor;
use crate::qualities::resolve_qualities;
use crate::transcode::{CancelSignal, Transcoder};
use crate::validate::{validate_upload, ValidationError, ValidationIssue};

/// Default page size for user job listings.
pub const DEFAULT_LIST_LIMIT: usize = 20;

/// Buffer for in-flight progress updates from a transcoder.
const PROGRESS_BUFFER: usize = 32;

/// Caller options for a submission.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// Explicit rendition ladder; used verbatim after validation
    pub qualities: Option<Vec<QualityLabel>>,
}

/// Static service configuration.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub limits: Limits,
    pub policy: StoragePolicy,
    pub manifest: ManifestSettings,
    pub catalog: QualityCatalog,
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            limits: Limits::from_env(),
            policy: StoragePolicy::from_env(),
            manifest: ManifestSettings::default(),
            catalog: QualityCatalog::default(),
        }
    }

    fn validate(&self) -> IngestResult<()> {
        self.limits
            .validate()
            .map_err(|e| IngestError::config(e.to_string()))?;
        self.policy
            .validate()
            .map_err(|e| IngestError::config(e.to_string()))?;
        self.manifest
            .validate()
            .map_err(|e| IngestError::config(e.to_string()))?;
        Ok(())
    }
}

/// Outcome of an admission attempt for one job.
enum StartOutcome {
    Started,
    NoSlot,
    NotPending,
}

/// The video ingestion service.
pub struct VideoService {
    config: ServiceConfig,
    store: Arc<JobStore>,
    gate: ConcurrencyGate,
    extractor: Arc<dyn MetadataExtractor>,
    transcoder: Arc<dyn Transcoder>,
    events: EventBus,
    /// Serializes read-modify-write of job records so concurrent
    /// transitions on the same id cannot both commit.
    transitions: Mutex<()>,
    /// Pending jobs awaiting a processing slot, oldest first.
    waiting: Mutex<VecDeque<VideoJobId>>,
    /// Cancellation signals for in-flight transcodes.
    cancels: Mutex<HashMap<VideoJobId, watch::Sender<bool>>>,
}

impl VideoService {
    /// Create the service. Validates configuration up front.
    pub fn new(
        config: ServiceConfig,
        store: Arc<JobStore>,
        extractor: Arc<dyn MetadataExtractor>,
        transcoder: Arc<dyn Transcoder>,
    ) -> IngestResult<Arc<Self>> {
        config.validate()?;
        let gate = ConcurrencyGate::new(config.limits.max_concurrent_jobs);

        Ok(Arc::new(Self {
            config,
            store,
            gate,
            extractor,
            transcoder,
            events: EventBus::new(),
            transitions: Mutex::new(()),
            waiting: Mutex::new(VecDeque::new()),
            cancels: Mutex::new(HashMap::new()),
        }))
    }

    /// Submit an uploaded video for processing.
    ///
    /// Validation failures terminate the call and no job is created.
    /// Admission is best-effort and non-blocking: the job is returned
    /// in `pending` or `processing` depending on slot availability.
    pub async fn submit(
        self: &Arc<Self>,
        file: UploadedFile,
        user_id: impl Into<String>,
        course_id: Option<String>,
        options: SubmitOptions,
    ) -> IngestResult<VideoJob> {
        let user_id = user_id.into();

        validate_upload(&file, &self.config.limits)?;

        let metadata = self.extractor.extract(&file).await?;
        if metadata.duration > self.config.limits.max_duration {
            return Err(ValidationError::single(ValidationIssue::DurationTooLong {
                duration: metadata.duration,
                max: self.config.limits.max_duration,
            })
            .into());
        }

        let qualities = resolve_qualities(options.qualities, &metadata, &self.config.catalog)?;

        let job = VideoJob::new(
            user_id.as_str(),
            course_id,
            file.filename.as_str(),
            file.size_bytes,
            metadata,
            qualities,
        );
        info!(job_id = %job.id, user_id = %user_id, filename = %file.filename, "Accepted video job");

        self.store.put(&job).await;
        self.events.publish(JobEvent::from_job(&job));

        match self.try_start(&job.id).await {
            StartOutcome::Started => {}
            StartOutcome::NoSlot => {
                debug!(job_id = %job.id, "All processing slots busy, job queued");
                self.waiting.lock().await.push_back(job.id.clone());
                // A slot may have been freed between the failed
                // admission and the enqueue; re-check so the job cannot
                // sit pending next to an idle slot.
                self.admit_next().await;
            }
            StartOutcome::NotPending => {}
        }

        Ok(self.store.get(&job.id).await.unwrap_or(job))
    }

    /// Look up a job by id.
    pub async fn get(&self, id: &VideoJobId) -> Option<VideoJob> {
        self.store.get(id).await
    }

    /// A user's jobs, newest first.
    pub async fn list_for_user(&self, user_id: &str, limit: Option<usize>) -> Vec<VideoJob> {
        self.store
            .list_by_user(user_id, limit.unwrap_or(DEFAULT_LIST_LIMIT))
            .await
    }

    /// Cancel a job.
    ///
    /// Fails with `Unauthorized` if the caller does not own the job.
    /// Returns `Ok(false)` for unknown ids and jobs already in a
    /// terminal state; concurrent cancels of the same id are idempotent
    /// (only the first performs the transition).
    pub async fn cancel(&self, id: &VideoJobId, caller_id: &str) -> IngestResult<bool> {
        let guard = self.transitions.lock().await;
        let Some(mut job) = self.store.get(id).await else {
            return Ok(false);
        };
        if job.user_id != caller_id {
            return Err(IngestError::unauthorized(format!(
                "user '{}' does not own job {}",
                caller_id, id
            )));
        }
        if !job.cancel() {
            return Ok(false);
        }
        self.store.put(&job).await;
        drop(guard);

        self.events.publish(JobEvent::from_job(&job));

        // Cooperatively signal an in-flight transcode; it is the
        // transcoder's responsibility to observe this and abort.
        if let Some(tx) = self.cancels.lock().await.get(id) {
            let _ = tx.send(true);
        }

        info!(job_id = %id, "Job cancelled");
        Ok(true)
    }

    /// Packaging configuration for a job, for the external packager.
    pub fn manifest_config(&self, job: &VideoJob) -> ManifestConfig {
        build_manifest_config(
            job,
            &self.config.manifest,
            &self.config.policy,
            &self.config.catalog,
        )
    }

    /// Subscribe to best-effort job status events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Number of jobs currently in `processing`.
    pub fn active_jobs(&self) -> usize {
        self.gate.active()
    }

    /// Try to admit a job and spawn its processing task.
    ///
    /// Boxed: the spawned completion path re-enters admission through
    /// `admit_next`, so the future type must not refer to itself.
    fn try_start<'a>(
        self: &'a Arc<Self>,
        id: &'a VideoJobId,
    ) -> Pin<Box<dyn Future<Output = StartOutcome> + Send + 'a>> {
        Box::pin(async move {
            let Some(permit) = self.gate.try_admit() else {
                return StartOutcome::NoSlot;
            };

            let job = {
                let _guard = self.transitions.lock().await;
                let Some(mut job) = self.store.get(id).await else {
                    return StartOutcome::NotPending;
                };
                if !job.begin_processing() {
                    return StartOutcome::NotPending;
                }
                self.store.put(&job).await;
                job
            };
            self.events.publish(JobEvent::from_job(&job));
            info!(job_id = %job.id, "Job admitted to processing");

            let (cancel_tx, cancel_rx) = watch::channel(false);
            self.cancels.lock().await.insert(job.id.clone(), cancel_tx);

            let service = Arc::clone(self);
            tokio::spawn(async move {
                service.run_job(job, cancel_rx).await;
                // Permit dropped here releases the slot on every path.
                drop(permit);
                service.admit_next().await;
            });

            StartOutcome::Started
        })
    }

    /// Drive one admitted job to a terminal state.
    async fn run_job(self: &Arc<Self>, job: VideoJob, cancel: CancelSignal) {
        let id = job.id.clone();
        let config = self.manifest_config(&job);

        let (progress_tx, mut progress_rx) = mpsc::channel(PROGRESS_BUFFER);
        let progress_service = Arc::clone(self);
        let progress_id = id.clone();
        let progress_task = tokio::spawn(async move {
            while let Some(value) = progress_rx.recv().await {
                progress_service.record_progress(&progress_id, value).await;
            }
        });

        let outcome = timeout(
            self.config.limits.processing_timeout,
            self.transcoder.transcode(&job, &config, progress_tx, cancel),
        )
        .await;

        // The transcoder's progress sender is gone by now (returned or
        // timed out and dropped), so this drains and exits.
        let _ = progress_task.await;

        // Commit the terminal transition. If the record was cancelled
        // while the transcode ran, the cancel won and complete/fail are
        // rejected by the state machine.
        let guard = self.transitions.lock().await;
        let committed = match self.store.get(&id).await {
            Some(mut current) => {
                let committed = match &outcome {
                    Ok(Ok(())) => current.complete(),
                    Ok(Err(e)) => current.fail(e.to_string()),
                    Err(_) => current.fail(format!(
                        "Processing timed out after {}s",
                        self.config.limits.processing_timeout.as_secs()
                    )),
                };
                if committed {
                    self.store.put(&current).await;
                }
                committed.then(|| current)
            }
            None => None,
        };
        drop(guard);

        match (&outcome, &committed) {
            (Ok(Ok(())), Some(_)) => info!(job_id = %id, "Job completed"),
            (Ok(Err(e)), Some(_)) => warn!(job_id = %id, "Job failed: {}", e),
            (Err(_), Some(_)) => warn!(job_id = %id, "Job timed out"),
            _ => debug!(job_id = %id, "Transcode outcome discarded (job already terminal)"),
        }
        if let Some(current) = committed {
            self.events.publish(JobEvent::from_job(&current));
        }

        self.cancels.lock().await.remove(&id);
    }

    /// Record transcoder-reported progress on the job record.
    async fn record_progress(&self, id: &VideoJobId, value: u8) {
        let _guard = self.transitions.lock().await;
        if let Some(mut job) = self.store.get(id).await {
            if job.set_progress(value) {
                self.store.put(&job).await;
                self.events.publish(JobEvent::from_job(&job));
            }
        }
    }

    /// Offer the freed slot to the oldest still-pending queued job.
    async fn admit_next(self: &Arc<Self>) {
        loop {
            let Some(id) = self.waiting.lock().await.pop_front() else {
                return;
            };
            match self.store.get(&id).await {
                Some(job) if job.status == JobStatus::Pending => {
                    match self.try_start(&id).await {
                        StartOutcome::Started => return,
                        StartOutcome::NoSlot => {
                            // Another submission took the slot; keep
                            // this job at the head of the line.
                            self.waiting.lock().await.push_front(id);
                            return;
                        }
                        StartOutcome::NotPending => continue,
                    }
                }
                // Cancelled while queued, or no longer known: skip.
                _ => continue,
            }
        }
    }
}
