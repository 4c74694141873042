//! Probed source metadata.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when probed metadata is malformed.
#[derive(Debug, Error)]
pub enum InvalidMetadata {
    #[error("Field '{0}' must be non-negative")]
    NegativeField(&'static str),

    #[error("Field '{0}' is not a finite number")]
    NonFiniteField(&'static str),
}

/// Intrinsic properties of an uploaded source video.
///
/// Populated once by the metadata extractor and immutable afterwards.
/// The core does not mandate a probing algorithm; it only requires that
/// the fields are populated and the numeric ones are non-negative.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SourceMetadata {
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    /// Overall bitrate in bits/second
    pub bitrate: u64,
    /// Video codec name (e.g. "h264")
    pub codec: String,
    /// Audio codec name (e.g. "aac")
    pub audio_codec: String,
}

impl SourceMetadata {
    /// Validate that the numeric fields are finite and non-negative.
    pub fn validate(&self) -> Result<(), InvalidMetadata> {
        if !self.duration.is_finite() {
            return Err(InvalidMetadata::NonFiniteField("duration"));
        }
        if self.duration < 0.0 {
            return Err(InvalidMetadata::NegativeField("duration"));
        }
        if !self.fps.is_finite() {
            return Err(InvalidMetadata::NonFiniteField("fps"));
        }
        if self.fps < 0.0 {
            return Err(InvalidMetadata::NegativeField("fps"));
        }
        Ok(())
    }
}
