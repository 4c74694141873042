//! Rendition quality catalog.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named target encoding rung.
///
/// Exactly these five labels are supported; the ladder is ordered
/// highest resolution first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum QualityLabel {
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "240p")]
    P240,
}

/// The full ladder, highest first.
pub const LADDER: [QualityLabel; 5] = [
    QualityLabel::P1080,
    QualityLabel::P720,
    QualityLabel::P480,
    QualityLabel::P360,
    QualityLabel::P240,
];

impl QualityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLabel::P1080 => "1080p",
            QualityLabel::P720 => "720p",
            QualityLabel::P480 => "480p",
            QualityLabel::P360 => "360p",
            QualityLabel::P240 => "240p",
        }
    }

    /// Target frame height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            QualityLabel::P1080 => 1080,
            QualityLabel::P720 => 720,
            QualityLabel::P480 => 480,
            QualityLabel::P360 => 360,
            QualityLabel::P240 => 240,
        }
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QualityLabel {
    type Err = UnknownQualityLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1080p" => Ok(QualityLabel::P1080),
            "720p" => Ok(QualityLabel::P720),
            "480p" => Ok(QualityLabel::P480),
            "360p" => Ok(QualityLabel::P360),
            "240p" => Ok(QualityLabel::P240),
            _ => Err(UnknownQualityLabel(s.to_string())),
        }
    }
}

/// Error for unrecognized quality label strings.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Unknown quality label: {0}")]
pub struct UnknownQualityLabel(pub String);

/// Encoding parameters for one quality rung.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QualityProfile {
    /// Quality label
    pub label: QualityLabel,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Video bitrate (FFmpeg notation, e.g. "5000k")
    pub video_bitrate: String,
    /// Audio bitrate (FFmpeg notation, e.g. "192k")
    pub audio_bitrate: String,
    /// Frame rate
    pub fps: u32,
    /// H.264 encoder profile ("baseline", "main", "high")
    pub profile: String,
}

impl QualityProfile {
    fn new(
        label: QualityLabel,
        width: u32,
        height: u32,
        video_bitrate: &str,
        audio_bitrate: &str,
        profile: &str,
    ) -> Self {
        Self {
            label,
            width,
            height,
            video_bitrate: video_bitrate.to_string(),
            audio_bitrate: audio_bitrate.to_string(),
            fps: 30,
            profile: profile.to_string(),
        }
    }

    /// Approximate peak bandwidth in bits/second, for manifest variant
    /// entries (video + audio).
    pub fn bandwidth(&self) -> u64 {
        parse_bitrate(&self.video_bitrate) + parse_bitrate(&self.audio_bitrate)
    }
}

/// Parse an FFmpeg-style bitrate string ("5000k", "1m") into bits/second.
fn parse_bitrate(s: &str) -> u64 {
    let s = s.trim().to_lowercase();
    if let Some(v) = s.strip_suffix('k') {
        v.parse::<u64>().unwrap_or(0) * 1_000
    } else if let Some(v) = s.strip_suffix('m') {
        v.parse::<u64>().unwrap_or(0) * 1_000_000
    } else {
        s.parse::<u64>().unwrap_or(0)
    }
}

/// Static table of supported rendition profiles.
///
/// Pure data: exactly one entry per supported label, ordered highest
/// resolution first.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QualityCatalog {
    profiles: Vec<QualityProfile>,
}

impl Default for QualityCatalog {
    fn default() -> Self {
        Self {
            profiles: vec![
                QualityProfile::new(QualityLabel::P1080, 1920, 1080, "5000k", "192k", "high"),
                QualityProfile::new(QualityLabel::P720, 1280, 720, "2800k", "128k", "main"),
                QualityProfile::new(QualityLabel::P480, 854, 480, "1400k", "128k", "main"),
                QualityProfile::new(QualityLabel::P360, 640, 360, "800k", "96k", "baseline"),
                QualityProfile::new(QualityLabel::P240, 426, 240, "400k", "64k", "baseline"),
            ],
        }
    }
}

impl QualityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the profile for a label. Every label has exactly one entry.
    pub fn profile(&self, label: QualityLabel) -> &QualityProfile {
        self.profiles
            .iter()
            .find(|p| p.label == label)
            .expect("catalog holds one profile per label")
    }

    /// All profiles, highest resolution first.
    pub fn profiles(&self) -> &[QualityProfile] {
        &self.profiles
    }

    /// All labels, highest resolution first.
    pub fn labels(&self) -> impl Iterator<Item = QualityLabel> + '_ {
        self.profiles.iter().map(|p| p.label)
    }

    /// The lowest rung of the ladder.
    pub fn lowest(&self) -> QualityLabel {
        self.profiles
            .last()
            .map(|p| p.label)
            .expect("catalog is never empty")
    }
}
