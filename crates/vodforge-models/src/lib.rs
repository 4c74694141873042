//! Shared data models for the VodForge ingestion core.
//!
//! This crate provides Serde-serializable types for:
//! - Video jobs and their lifecycle states
//! - Uploaded source files and probed metadata
//! - The rendition quality catalog
//! - Operational limits and storage policy
//! - HLS/DASH manifest settings

pub mod job;
pub mod limits;
pub mod manifest;
pub mod metadata;
pub mod quality;
pub mod upload;

// Re-export common types
pub use job::{JobStatus, VideoJob, VideoJobId};
pub use limits::{ConfigError, Limits, StoragePolicy};
pub use manifest::{
    DashSettings, HlsSettings, ManifestSettings, ManifestSettingsError, VOD_PLAYLIST_TYPE,
};
pub use metadata::{InvalidMetadata, SourceMetadata};
pub use quality::{QualityCatalog, QualityLabel, QualityProfile, UnknownQualityLabel, LADDER};
pub use upload::UploadedFile;
