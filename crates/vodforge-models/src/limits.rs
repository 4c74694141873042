//! Operational limits and storage policy.

use std::time::Duration;
use thiserror::Error;

/// Error for invalid process-wide configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Limit '{0}' must be strictly positive")]
    NonPositiveLimit(&'static str),

    #[error("Retention window '{0}' must be strictly positive")]
    NonPositiveRetention(&'static str),
}

/// Process-wide operational limits.
///
/// All bounds are strictly positive; `validate` enforces this for
/// values coming from the environment.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum upload size in bytes
    pub max_file_size: u64,
    /// Maximum source duration in seconds
    pub max_duration: f64,
    /// Maximum jobs simultaneously in `processing`
    pub max_concurrent_jobs: usize,
    /// Wall-clock bound on a single transcode
    pub processing_timeout: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size: 2 * 1024 * 1024 * 1024, // 2GB
            max_duration: 4.0 * 3600.0,            // 4 hours
            max_concurrent_jobs: 3,
            processing_timeout: Duration::from_secs(3600),
        }
    }
}

impl Limits {
    /// Create limits from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_file_size: std::env::var("VIDEO_MAX_FILE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_file_size),
            max_duration: std::env::var("VIDEO_MAX_DURATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_duration),
            max_concurrent_jobs: std::env::var("VIDEO_MAX_CONCURRENT_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_concurrent_jobs),
            processing_timeout: Duration::from_secs(
                std::env::var("VIDEO_PROCESSING_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.processing_timeout.as_secs()),
            ),
        }
    }

    /// Check that all bounds are strictly positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_size == 0 {
            return Err(ConfigError::NonPositiveLimit("max_file_size"));
        }
        if self.max_duration <= 0.0 {
            return Err(ConfigError::NonPositiveLimit("max_duration"));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(ConfigError::NonPositiveLimit("max_concurrent_jobs"));
        }
        if self.processing_timeout.is_zero() {
            return Err(ConfigError::NonPositiveLimit("processing_timeout"));
        }
        Ok(())
    }
}

/// Artifact placement and retention policy.
#[derive(Debug, Clone)]
pub struct StoragePolicy {
    /// Template for temporary upload paths; `{job_id}` is substituted
    pub temp_path_template: String,
    /// Template for processed rendition paths; `{job_id}` and
    /// `{quality}` are substituted
    pub output_path_template: String,
    /// Base URL renditions are served from
    pub cdn_base_url: String,
    /// How long temporary upload artifacts are kept
    pub temp_retention: Duration,
    /// How long processed artifacts (and durable job records) are kept
    pub processed_retention: Duration,
}

impl Default for StoragePolicy {
    fn default() -> Self {
        Self {
            temp_path_template: "/tmp/vodforge/uploads/{job_id}".to_string(),
            output_path_template: "/var/lib/vodforge/processed/{job_id}/{quality}".to_string(),
            cdn_base_url: "https://cdn.vodforge.dev".to_string(),
            temp_retention: Duration::from_secs(24 * 3600),
            processed_retention: Duration::from_secs(30 * 24 * 3600),
        }
    }
}

impl StoragePolicy {
    /// Create policy from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            temp_path_template: std::env::var("STORAGE_TEMP_TEMPLATE")
                .unwrap_or(defaults.temp_path_template),
            output_path_template: std::env::var("STORAGE_OUTPUT_TEMPLATE")
                .unwrap_or(defaults.output_path_template),
            cdn_base_url: std::env::var("STORAGE_CDN_BASE_URL").unwrap_or(defaults.cdn_base_url),
            temp_retention: Duration::from_secs(
                std::env::var("STORAGE_TEMP_RETENTION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.temp_retention.as_secs()),
            ),
            processed_retention: Duration::from_secs(
                std::env::var("STORAGE_PROCESSED_RETENTION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.processed_retention.as_secs()),
            ),
        }
    }

    /// Check that both retention windows are strictly positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temp_retention.is_zero() {
            return Err(ConfigError::NonPositiveRetention("temp_retention"));
        }
        if self.processed_retention.is_zero() {
            return Err(ConfigError::NonPositiveRetention("processed_retention"));
        }
        Ok(())
    }

    /// Resolve the output path for one rendition of a job.
    pub fn output_path(&self, job_id: &str, quality: &str) -> String {
        self.output_path_template
            .replace("{job_id}", job_id)
            .replace("{quality}", quality)
    }

    /// Resolve the CDN URL for one rendition of a job.
    pub fn cdn_url(&self, job_id: &str, quality: &str) -> String {
        format!(
            "{}/{}/{}",
            self.cdn_base_url.trim_end_matches('/'),
            job_id,
            quality
        )
    }
}
