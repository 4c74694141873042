//! Metadata extraction.
//!
//! The core does not mandate a probing algorithm; it only requires the
//! extracted struct's fields to be populated and the numeric ones to be
//! non-negative. The default implementation shells out to `ffprobe`.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use vodforge_models::{SourceMetadata, UploadedFile};

/// Errors from metadata extraction.
///
/// These surface as processing errors, never validation errors: the
/// file passed basic format/size checks but its contents could not be
/// introspected.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("ffprobe not found on PATH")]
    FfprobeNotFound,

    #[error("ffprobe failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Not a valid video: {0}")]
    InvalidVideo(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Derives the intrinsic properties of an uploaded asset.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    async fn extract(&self, file: &UploadedFile) -> Result<SourceMetadata, ProbeError>;
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Extractor that shells out to `ffprobe`.
#[derive(Debug, Clone, Default)]
pub struct FfprobeExtractor;

impl FfprobeExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetadataExtractor for FfprobeExtractor {
    async fn extract(&self, file: &UploadedFile) -> Result<SourceMetadata, ProbeError> {
        if !file.path.exists() {
            return Err(ProbeError::FileNotFound(file.path.clone()));
        }

        which::which("ffprobe").map_err(|_| ProbeError::FfprobeNotFound)?;

        let output = Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(&file.path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(ProbeError::FfprobeFailed {
                message: "ffprobe exited with an error".to_string(),
                stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
            });
        }

        let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

        let video_stream = probe
            .streams
            .iter()
            .find(|s| s.codec_type == "video")
            .ok_or_else(|| ProbeError::InvalidVideo("No video stream found".to_string()))?;

        let audio_codec = probe
            .streams
            .iter()
            .find(|s| s.codec_type == "audio")
            .and_then(|s| s.codec_name.clone())
            .unwrap_or_default();

        let duration = probe
            .format
            .duration
            .as_ref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let bitrate = probe
            .format
            .bit_rate
            .as_ref()
            .and_then(|b| b.parse::<u64>().ok())
            .unwrap_or(0);

        let fps = video_stream
            .avg_frame_rate
            .as_ref()
            .or(video_stream.r_frame_rate.as_ref())
            .and_then(|r| parse_frame_rate(r))
            .unwrap_or(30.0);

        let metadata = SourceMetadata {
            duration,
            width: video_stream.width.unwrap_or(0),
            height: video_stream.height.unwrap_or(0),
            fps,
            bitrate,
            codec: video_stream.codec_name.clone().unwrap_or_default(),
            audio_codec,
        };

        metadata
            .validate()
            .map_err(|e| ProbeError::InvalidVideo(e.to_string()))?;

        Ok(metadata)
    }
}

/// Parse a frame rate string (e.g. "30/1" or "29.97").
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    s.parse().ok()
}
