//! Service integration tests.
//!
//! Drive the full submit/get/list/cancel surface against an in-memory
//! store with controllable extractor and transcoder doubles.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use vodforge_ingest::transcode::{CancelSignal, ProgressSender};
use vodforge_ingest::{
    IngestError, ManifestConfig, MetadataExtractor, ProbeError, ServiceConfig, SubmitOptions,
    TranscodeError, Transcoder, VideoService,
};
use vodforge_models::{
    JobStatus, Limits, QualityLabel, SourceMetadata, UploadedFile, VideoJob, VideoJobId, LADDER,
};
use vodforge_store::{DurableTier, JobStore, StoreError, StoreResult};

fn upload(filename: &str, size: u64, content_type: &str) -> UploadedFile {
    UploadedFile::new(filename, size, content_type, "/tmp/vodforge-test/upload")
}

fn hd_source() -> SourceMetadata {
    SourceMetadata {
        duration: 120.5,
        width: 1920,
        height: 1080,
        fps: 30.0,
        bitrate: 4_500_000,
        codec: "h264".to_string(),
        audio_codec: "aac".to_string(),
    }
}

/// Extractor returning a fixed metadata record.
struct FixedExtractor(SourceMetadata);

#[async_trait]
impl MetadataExtractor for FixedExtractor {
    async fn extract(&self, _file: &UploadedFile) -> Result<SourceMetadata, ProbeError> {
        Ok(self.0.clone())
    }
}

/// Extractor that cannot read the file.
struct BrokenExtractor;

#[async_trait]
impl MetadataExtractor for BrokenExtractor {
    async fn extract(&self, _file: &UploadedFile) -> Result<SourceMetadata, ProbeError> {
        Err(ProbeError::InvalidVideo("no video stream found".to_string()))
    }
}

/// Transcoder that reports some progress and succeeds immediately.
struct InstantTranscoder;

#[async_trait]
impl Transcoder for InstantTranscoder {
    async fn transcode(
        &self,
        _job: &VideoJob,
        _config: &ManifestConfig,
        progress: ProgressSender,
        _cancel: CancelSignal,
    ) -> Result<(), TranscodeError> {
        let _ = progress.send(30).await;
        let _ = progress.send(10).await; // stale report, must not regress
        let _ = progress.send(60).await;
        Ok(())
    }
}

/// Transcoder that always fails.
struct FailingTranscoder;

#[async_trait]
impl Transcoder for FailingTranscoder {
    async fn transcode(
        &self,
        _job: &VideoJob,
        _config: &ManifestConfig,
        _progress: ProgressSender,
        _cancel: CancelSignal,
    ) -> Result<(), TranscodeError> {
        Err(TranscodeError::failed("encoder exploded"))
    }
}

/// Transcoder that runs until released or cancelled.
struct BlockingTranscoder {
    release: Arc<Semaphore>,
}

impl BlockingTranscoder {
    fn held() -> (Arc<Semaphore>, Arc<Self>) {
        let release = Arc::new(Semaphore::new(0));
        let transcoder = Arc::new(Self {
            release: Arc::clone(&release),
        });
        (release, transcoder)
    }
}

async fn cancel_flipped(mut cancel: CancelSignal) {
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl Transcoder for BlockingTranscoder {
    async fn transcode(
        &self,
        _job: &VideoJob,
        _config: &ManifestConfig,
        _progress: ProgressSender,
        cancel: CancelSignal,
    ) -> Result<(), TranscodeError> {
        tokio::select! {
            _ = self.release.acquire() => Ok(()),
            _ = cancel_flipped(cancel) => Err(TranscodeError::Cancelled),
        }
    }
}

/// Transcoder that never returns, for the timeout path.
struct HangingTranscoder;

#[async_trait]
impl Transcoder for HangingTranscoder {
    async fn transcode(
        &self,
        _job: &VideoJob,
        _config: &ManifestConfig,
        _progress: ProgressSender,
        _cancel: CancelSignal,
    ) -> Result<(), TranscodeError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Durable tier that always errors, simulating an unreachable backend.
struct DownTier;

#[async_trait]
impl DurableTier for DownTier {
    async fn put(&self, _job: &VideoJob, _ttl: Duration) -> StoreResult<()> {
        Err(StoreError::connection_failed("redis down"))
    }
    async fn get(&self, _id: &VideoJobId) -> StoreResult<Option<VideoJob>> {
        Err(StoreError::connection_failed("redis down"))
    }
    async fn list_ids_by_user(&self, _user_id: &str) -> StoreResult<Vec<VideoJobId>> {
        Err(StoreError::connection_failed("redis down"))
    }
    async fn delete(&self, _id: &VideoJobId) -> StoreResult<()> {
        Err(StoreError::connection_failed("redis down"))
    }
}

fn new_service(config: ServiceConfig, transcoder: Arc<dyn Transcoder>) -> Arc<VideoService> {
    VideoService::new(
        config,
        Arc::new(JobStore::in_memory()),
        Arc::new(FixedExtractor(hd_source())),
        transcoder,
    )
    .unwrap()
}

async fn wait_for_status(service: &VideoService, id: &VideoJobId, status: JobStatus) -> VideoJob {
    for _ in 0..500 {
        if let Some(job) = service.get(id).await {
            if job.status == status {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {} never reached {}", id, status);
}

#[tokio::test]
async fn test_submit_runs_to_completion() {
    let service = new_service(ServiceConfig::default(), Arc::new(InstantTranscoder));

    let job = service
        .submit(
            upload("lecture.mp4", 500 * 1024 * 1024, "video/mp4"),
            "u1",
            Some("course-42".to_string()),
            SubmitOptions::default(),
        )
        .await
        .unwrap();

    assert!(job.id.as_str().starts_with("video_"));
    assert_eq!(job.user_id, "u1");
    assert_eq!(job.course_id.as_deref(), Some("course-42"));

    let done = wait_for_status(&service, &job.id, JobStatus::Completed).await;
    assert_eq!(done.progress, 100);
    assert!(done.completed_at.is_some());
    assert!(done.error.is_none());
}

#[tokio::test]
async fn test_submit_assigns_distinct_ids() {
    let service = new_service(ServiceConfig::default(), Arc::new(InstantTranscoder));

    let mut ids = Vec::new();
    for i in 0..10 {
        let job = service
            .submit(
                upload(&format!("v{}.mp4", i), 1024, "video/mp4"),
                "u1",
                None,
                SubmitOptions::default(),
            )
            .await
            .unwrap();
        ids.push(job.id);
    }
    ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    ids.dedup();
    assert_eq!(ids.len(), 10);
}

#[tokio::test]
async fn test_rejected_upload_creates_no_job() {
    let service = new_service(ServiceConfig::default(), Arc::new(InstantTranscoder));

    let err = service
        .submit(
            upload("slides.pdf", 1024, "application/pdf"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Validation(_)));
    assert!(service.list_for_user("u1", None).await.is_empty());
}

#[tokio::test]
async fn test_oversize_upload_rejected() {
    let config = ServiceConfig {
        limits: Limits {
            max_file_size: 1024,
            ..Default::default()
        },
        ..Default::default()
    };
    let service = new_service(config, Arc::new(InstantTranscoder));

    let err = service
        .submit(
            upload("big.mp4", 4096, "video/mp4"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("exceeds maximum"));
    assert!(service.list_for_user("u1", None).await.is_empty());
}

#[tokio::test]
async fn test_probe_failure_creates_no_job() {
    let service = VideoService::new(
        ServiceConfig::default(),
        Arc::new(JobStore::in_memory()),
        Arc::new(BrokenExtractor),
        Arc::new(InstantTranscoder),
    )
    .unwrap();

    let err = service
        .submit(
            upload("corrupt.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Probe(_)));
    assert!(service.list_for_user("u1", None).await.is_empty());
}

#[tokio::test]
async fn test_duration_checked_after_probe() {
    let config = ServiceConfig {
        limits: Limits {
            max_duration: 60.0,
            ..Default::default()
        },
        ..Default::default()
    };
    // hd_source() reports 120.5s
    let service = new_service(config, Arc::new(InstantTranscoder));

    let err = service
        .submit(
            upload("long.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("duration"));
    assert!(service.list_for_user("u1", None).await.is_empty());
}

#[tokio::test]
async fn test_1080p_source_gets_full_ladder() {
    let service = new_service(ServiceConfig::default(), Arc::new(InstantTranscoder));

    let job = service
        .submit(
            upload("hd.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(job.qualities, LADDER.to_vec());
}

#[tokio::test]
async fn test_ladder_capped_by_source_height() {
    let sd = SourceMetadata {
        width: 854,
        height: 480,
        ..hd_source()
    };
    let service = VideoService::new(
        ServiceConfig::default(),
        Arc::new(JobStore::in_memory()),
        Arc::new(FixedExtractor(sd)),
        Arc::new(InstantTranscoder),
    )
    .unwrap();

    let job = service
        .submit(
            upload("sd.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(
        job.qualities,
        vec![QualityLabel::P480, QualityLabel::P360, QualityLabel::P240]
    );
}

#[tokio::test]
async fn test_quality_override_deduplicated() {
    let service = new_service(ServiceConfig::default(), Arc::new(InstantTranscoder));

    let job = service
        .submit(
            upload("hd.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions {
                qualities: Some(vec![
                    QualityLabel::P720,
                    QualityLabel::P240,
                    QualityLabel::P720,
                ]),
            },
        )
        .await
        .unwrap();

    assert_eq!(job.qualities, vec![QualityLabel::P720, QualityLabel::P240]);
}

#[tokio::test]
async fn test_empty_quality_override_rejected() {
    let service = new_service(ServiceConfig::default(), Arc::new(InstantTranscoder));

    let err = service
        .submit(
            upload("hd.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions {
                qualities: Some(vec![]),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Validation(_)));
}

#[tokio::test]
async fn test_failed_transcode_records_error() {
    let service = new_service(ServiceConfig::default(), Arc::new(FailingTranscoder));

    let job = service
        .submit(
            upload("hd.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap();

    let failed = wait_for_status(&service, &job.id, JobStatus::Failed).await;
    assert!(failed.error.as_deref().unwrap().contains("encoder exploded"));
    assert!(failed.completed_at.is_some());
}

#[tokio::test]
async fn test_timeout_marks_job_failed() {
    let config = ServiceConfig {
        limits: Limits {
            processing_timeout: Duration::from_millis(50),
            ..Default::default()
        },
        ..Default::default()
    };
    let service = new_service(config, Arc::new(HangingTranscoder));

    let job = service
        .submit(
            upload("hd.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap();

    let failed = wait_for_status(&service, &job.id, JobStatus::Failed).await;
    assert!(failed.error.as_deref().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_cancel_mid_processing() {
    let (_release, transcoder) = BlockingTranscoder::held();
    let service = new_service(ServiceConfig::default(), transcoder);

    let job = service
        .submit(
            upload("hd.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap();
    wait_for_status(&service, &job.id, JobStatus::Processing).await;

    assert!(service.cancel(&job.id, "u1").await.unwrap());
    let cancelled = wait_for_status(&service, &job.id, JobStatus::Cancelled).await;
    assert_eq!(cancelled.progress, 0);
    assert!(cancelled.completed_at.is_none());

    // The transcoder observes the signal and aborts, but the record
    // stays cancelled regardless of what the transcode returns.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let after = service.get(&job.id).await.unwrap();
    assert_eq!(after.status, JobStatus::Cancelled);
    assert_eq!(service.active_jobs(), 0);
}

#[tokio::test]
async fn test_cancel_requires_ownership() {
    let (_release, transcoder) = BlockingTranscoder::held();
    let service = new_service(ServiceConfig::default(), transcoder);

    let job = service
        .submit(
            upload("hd.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap();

    let err = service.cancel(&job.id, "intruder").await.unwrap_err();
    assert!(matches!(err, IngestError::Unauthorized(_)));

    // The job is untouched.
    let current = service.get(&job.id).await.unwrap();
    assert!(!current.status.is_terminal());
}

#[tokio::test]
async fn test_cancel_terminal_job_is_a_noop() {
    let service = new_service(ServiceConfig::default(), Arc::new(InstantTranscoder));

    let job = service
        .submit(
            upload("hd.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap();
    let done = wait_for_status(&service, &job.id, JobStatus::Completed).await;

    assert!(!service.cancel(&job.id, "u1").await.unwrap());
    let after = service.get(&job.id).await.unwrap();
    assert_eq!(after.status, JobStatus::Completed);
    assert_eq!(after.progress, done.progress);
}

#[tokio::test]
async fn test_cancel_unknown_job() {
    let service = new_service(ServiceConfig::default(), Arc::new(InstantTranscoder));
    let missing = VideoJobId::from("video_1_missing");

    assert!(!service.cancel(&missing, "u1").await.unwrap());
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let (release, transcoder) = BlockingTranscoder::held();
    let config = ServiceConfig {
        limits: Limits {
            max_concurrent_jobs: 2,
            ..Default::default()
        },
        ..Default::default()
    };
    let service = new_service(config, transcoder);

    let mut ids = Vec::new();
    for i in 0..3 {
        let job = service
            .submit(
                upload(&format!("v{}.mp4", i), 1024, "video/mp4"),
                "u1",
                None,
                SubmitOptions::default(),
            )
            .await
            .unwrap();
        ids.push(job.id);
    }

    wait_for_status(&service, &ids[0], JobStatus::Processing).await;
    wait_for_status(&service, &ids[1], JobStatus::Processing).await;
    assert_eq!(service.active_jobs(), 2);
    assert_eq!(
        service.get(&ids[2]).await.unwrap().status,
        JobStatus::Pending
    );

    // Freeing slots drains the queue.
    release.add_permits(3);
    for id in &ids {
        wait_for_status(&service, id, JobStatus::Completed).await;
    }
    assert_eq!(service.active_jobs(), 0);
}

#[tokio::test]
async fn test_concurrent_cancels_commit_once() {
    let (_release, transcoder) = BlockingTranscoder::held();
    let service = new_service(ServiceConfig::default(), transcoder);

    let job = service
        .submit(
            upload("hd.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap();
    wait_for_status(&service, &job.id, JobStatus::Processing).await;

    let (first, second) = tokio::join!(
        service.cancel(&job.id, "u1"),
        service.cancel(&job.id, "u1")
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    // Exactly one call performs the transition; the other observes the
    // already-cancelled record.
    assert!(first ^ second);
    assert_eq!(
        service.get(&job.id).await.unwrap().status,
        JobStatus::Cancelled
    );
}

#[tokio::test]
async fn test_racing_submissions_are_never_stranded() {
    let config = ServiceConfig {
        limits: Limits {
            max_concurrent_jobs: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    let service = new_service(config, Arc::new(InstantTranscoder));

    // Submissions racing against completions of earlier jobs: every
    // queued job must still reach a slot without any further traffic.
    let mut handles = Vec::new();
    for i in 0..20 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .submit(
                    upload(&format!("v{}.mp4", i), 1024, "video/mp4"),
                    "u1",
                    None,
                    SubmitOptions::default(),
                )
                .await
                .unwrap()
                .id
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    for id in &ids {
        wait_for_status(&service, id, JobStatus::Completed).await;
    }
}

#[tokio::test]
async fn test_cancelled_pending_job_is_never_started() {
    let (release, transcoder) = BlockingTranscoder::held();
    let config = ServiceConfig {
        limits: Limits {
            max_concurrent_jobs: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    let service = new_service(config, transcoder);

    let first = service
        .submit(
            upload("a.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap();
    let queued = service
        .submit(
            upload("b.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(queued.status, JobStatus::Pending);

    // Cancel while queued, then free the slot.
    assert!(service.cancel(&queued.id, "u1").await.unwrap());
    release.add_permits(2);

    wait_for_status(&service, &first.id, JobStatus::Completed).await;
    let after = service.get(&queued.id).await.unwrap();
    assert_eq!(after.status, JobStatus::Cancelled);
    assert_eq!(after.progress, 0);
}

#[tokio::test]
async fn test_list_newest_first_with_limit() {
    let service = new_service(ServiceConfig::default(), Arc::new(InstantTranscoder));

    let mut ids = Vec::new();
    for i in 0..5 {
        let job = service
            .submit(
                upload(&format!("v{}.mp4", i), 1024, "video/mp4"),
                "u1",
                None,
                SubmitOptions::default(),
            )
            .await
            .unwrap();
        ids.push(job.id);
        // Distinct creation instants keep the ordering deterministic.
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    // Another user's jobs never leak in.
    service
        .submit(
            upload("other.mp4", 1024, "video/mp4"),
            "u2",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap();

    let listed = service.list_for_user("u1", Some(3)).await;
    let listed_ids: Vec<_> = listed.iter().map(|j| j.id.clone()).collect();
    assert_eq!(listed_ids, vec![ids[4].clone(), ids[3].clone(), ids[2].clone()]);

    assert_eq!(service.list_for_user("u1", None).await.len(), 5);
    assert_eq!(service.list_for_user("u2", None).await.len(), 1);
}

#[tokio::test]
async fn test_progress_never_regresses() {
    let service = new_service(ServiceConfig::default(), Arc::new(InstantTranscoder));

    let job = service
        .submit(
            upload("hd.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap();

    // InstantTranscoder reports 30, then a stale 10, then 60; the record
    // must end at 100 with no regression having been stored.
    let done = wait_for_status(&service, &job.id, JobStatus::Completed).await;
    assert_eq!(done.progress, 100);
}

#[tokio::test]
async fn test_unreachable_durable_tier_is_survivable() {
    let store = Arc::new(JobStore::with_durable(
        Arc::new(DownTier),
        Duration::from_secs(60),
    ));
    let service = VideoService::new(
        ServiceConfig::default(),
        store,
        Arc::new(FixedExtractor(hd_source())),
        Arc::new(InstantTranscoder),
    )
    .unwrap();

    let job = service
        .submit(
            upload("hd.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap();

    wait_for_status(&service, &job.id, JobStatus::Completed).await;
    assert_eq!(service.list_for_user("u1", None).await.len(), 1);
}

#[tokio::test]
async fn test_events_follow_the_lifecycle() {
    let service = new_service(ServiceConfig::default(), Arc::new(InstantTranscoder));
    let mut events = service.subscribe();

    let job = service
        .submit(
            upload("hd.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap();
    wait_for_status(&service, &job.id, JobStatus::Completed).await;

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        if event.job_id == job.id {
            seen.push(event.status);
        }
    }
    assert_eq!(seen.first(), Some(&JobStatus::Pending));
    assert!(seen.contains(&JobStatus::Processing));
    assert_eq!(seen.last(), Some(&JobStatus::Completed));
}

#[tokio::test]
async fn test_manifest_config_covers_every_rung() {
    let service = new_service(ServiceConfig::default(), Arc::new(InstantTranscoder));

    let job = service
        .submit(
            upload("hd.mp4", 1024, "video/mp4"),
            "u1",
            None,
            SubmitOptions::default(),
        )
        .await
        .unwrap();

    let config = service.manifest_config(&job);
    assert_eq!(config.hls.variants.len(), job.qualities.len());
    assert_eq!(config.dash.representations.len(), job.qualities.len());
    assert_eq!(config.hls.playlist_type, "vod");
}
