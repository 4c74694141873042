//! Video job lifecycle model.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::metadata::SourceMetadata;
use crate::quality::QualityLabel;

/// Length of the random id suffix.
const ID_SUFFIX_LEN: usize = 9;

/// Unique identifier for a video job.
///
/// Format: `video_<unix_millis>_<lowercase alphanumeric suffix>`.
/// Unique for the lifetime of the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoJobId(pub String);

impl VideoJobId {
    /// Generate a new job ID.
    ///
    /// Two jobs created within the same millisecond still get distinct
    /// ids because the suffix is drawn from a fresh UUID.
    pub fn new() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "video_{}_{}",
            Utc::now().timestamp_millis(),
            &suffix[..ID_SUFFIX_LEN]
        ))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoJobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoJobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is waiting for a processing slot
    #[default]
    Pending,
    /// Job is actively being transcoded
    Processing,
    /// All renditions produced successfully
    Completed,
    /// Transcoding or extraction failed
    Failed,
    /// Cancelled by the owning user
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Check if this is a terminal state (no more transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Check whether the edge `self -> next` is legal.
    ///
    /// Each edge may be taken at most once and no state is revisited:
    /// pending may become processing or cancelled; processing may become
    /// completed, failed or cancelled; terminal states go nowhere.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Cancelled)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single request to produce streaming renditions from one uploaded
/// source video.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoJob {
    /// Unique job ID
    pub id: VideoJobId,

    /// User ID (owner; authorizes cancellation)
    pub user_id: String,

    /// Optional course association
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,

    /// Filename as uploaded
    pub original_filename: String,

    /// Upload size in bytes
    pub original_filesize: u64,

    /// Lifecycle status
    #[serde(default)]
    pub status: JobStatus,

    /// Progress (0-100); monotone until a terminal state freezes it
    #[serde(default)]
    pub progress: u8,

    /// Probed source metadata; populated once at creation
    pub metadata: SourceMetadata,

    /// Rendition ladder, highest first; non-empty
    pub qualities: Vec<QualityLabel>,

    /// Error message (only when failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Set on entering completed or failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl VideoJob {
    /// Create a new job in `pending`.
    pub fn new(
        user_id: impl Into<String>,
        course_id: Option<String>,
        original_filename: impl Into<String>,
        original_filesize: u64,
        metadata: SourceMetadata,
        qualities: Vec<QualityLabel>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: VideoJobId::new(),
            user_id: user_id.into(),
            course_id,
            original_filename: original_filename.into(),
            original_filesize,
            status: JobStatus::Pending,
            progress: 0,
            metadata,
            qualities,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move the job into `processing` after admission.
    ///
    /// Returns false (no mutation) if the job is not `pending`.
    pub fn begin_processing(&mut self) -> bool {
        if !self.status.can_transition_to(JobStatus::Processing) {
            return false;
        }
        self.status = JobStatus::Processing;
        self.updated_at = Utc::now();
        true
    }

    /// Mark the job completed; forces progress to 100.
    pub fn complete(&mut self) -> bool {
        if !self.status.can_transition_to(JobStatus::Completed) {
            return false;
        }
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
        true
    }

    /// Mark the job failed with an error message.
    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        if !self.status.can_transition_to(JobStatus::Failed) {
            return false;
        }
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
        true
    }

    /// Cancel the job; resets progress and leaves `completed_at` unset.
    pub fn cancel(&mut self) -> bool {
        if !self.status.can_transition_to(JobStatus::Cancelled) {
            return false;
        }
        self.status = JobStatus::Cancelled;
        self.progress = 0;
        self.completed_at = None;
        self.updated_at = Utc::now();
        true
    }

    /// Record reported progress.
    ///
    /// Clamped to 0-100 and monotone non-decreasing; ignored once the
    /// job is terminal. Returns true if the field changed.
    pub fn set_progress(&mut self, progress: u8) -> bool {
        if self.is_terminal() {
            return false;
        }
        let progress = progress.min(100);
        if progress <= self.progress {
            return false;
        }
        self.progress = progress;
        self.updated_at = Utc::now();
        true
    }
}
