//! Video ingestion job orchestration core.
//!
//! This crate accepts an uploaded video, validates it, derives its
//! streaming rendition plan, and manages the lifecycle of a transcoding
//! job from submission through a terminal state while bounding the
//! number of jobs processed concurrently:
//! - Upload validation against format/extension/size limits
//! - Metadata extraction via a pluggable prober
//! - Default rendition ladder selection from the source resolution
//! - A semaphore-backed admission gate for the processing slot count
//! - The job state machine and public submit/get/list/cancel operations
//! - HLS/DASH packaging configuration for the external packager

pub mod error;
pub mod events;
pub mod gate;
pub mod manifest;
pub mod probe;
pub mod qualities;
pub mod service;
pub mod transcode;
pub mod validate;

pub use error::{IngestError, IngestResult};
pub use events::{EventBus, JobEvent};
pub use gate::{AdmissionPermit, ConcurrencyGate};
pub use manifest::{build_manifest_config, DashManifest, HlsManifest, HlsVariant, ManifestConfig};
pub use probe::{FfprobeExtractor, MetadataExtractor, ProbeError};
pub use qualities::{resolve_qualities, select_qualities};
pub use service::{ServiceConfig, SubmitOptions, VideoService, DEFAULT_LIST_LIMIT};
pub use transcode::{TranscodeError, Transcoder};
pub use validate::{validate_upload, ValidationError, ValidationIssue};
