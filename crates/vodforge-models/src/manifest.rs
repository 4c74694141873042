//! HLS/DASH packaging settings.
//!
//! These are the constants the external packager consumes; the core
//! only emits configuration and never performs segmenting itself.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only playlist type this core produces.
pub const VOD_PLAYLIST_TYPE: &str = "vod";

/// Error for invalid manifest settings.
#[derive(Debug, Error)]
pub enum ManifestSettingsError {
    #[error("HLS segment duration must be positive")]
    HlsSegmentDuration,

    #[error("HLS key rotation interval must be positive")]
    KeyRotationInterval,

    #[error("DASH segment duration must be positive")]
    DashSegmentDuration,

    #[error("DASH adaptation sets must be non-empty")]
    EmptyAdaptationSets,
}

/// HLS packaging settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HlsSettings {
    /// Segment duration in seconds
    pub segment_duration: u32,
    /// Playlist type; always "vod"
    pub playlist_type: String,
    /// Encrypt segments with rotating keys
    pub enable_encryption: bool,
    /// Key rotation interval in seconds
    pub key_rotation_interval: u32,
}

impl Default for HlsSettings {
    fn default() -> Self {
        Self {
            segment_duration: 6,
            playlist_type: VOD_PLAYLIST_TYPE.to_string(),
            enable_encryption: false,
            key_rotation_interval: 3600,
        }
    }
}

/// DASH packaging settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DashSettings {
    /// Segment duration in seconds
    pub segment_duration: u32,
    /// Adaptation set identifiers
    pub adaptation_sets: Vec<String>,
    /// Encrypt segments
    pub enable_encryption: bool,
}

impl Default for DashSettings {
    fn default() -> Self {
        Self {
            segment_duration: 4,
            adaptation_sets: vec!["video".to_string(), "audio".to_string()],
            enable_encryption: false,
        }
    }
}

/// Combined packaging settings for both formats.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ManifestSettings {
    pub hls: HlsSettings,
    pub dash: DashSettings,
}

impl ManifestSettings {
    /// Check segment durations, rotation interval and adaptation sets.
    pub fn validate(&self) -> Result<(), ManifestSettingsError> {
        if self.hls.segment_duration == 0 {
            return Err(ManifestSettingsError::HlsSegmentDuration);
        }
        if self.hls.key_rotation_interval == 0 {
            return Err(ManifestSettingsError::KeyRotationInterval);
        }
        if self.dash.segment_duration == 0 {
            return Err(ManifestSettingsError::DashSegmentDuration);
        }
        if self.dash.adaptation_sets.is_empty() {
            return Err(ManifestSettingsError::EmptyAdaptationSets);
        }
        Ok(())
    }
}
