//! Packaging configuration for the external packager.
//!
//! Derived purely from settings, storage policy and a job's quality
//! ladder; independent of job status. The core only emits this
//! configuration and never performs segmenting itself.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use vodforge_models::{ManifestSettings, QualityCatalog, StoragePolicy, VideoJob};

/// One HLS variant playlist entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HlsVariant {
    /// Quality label (e.g. "720p")
    pub label: String,
    /// Peak bandwidth in bits/second
    pub bandwidth: u64,
    /// Resolution as "WxH"
    pub resolution: String,
    /// Playlist URI relative to the CDN base
    pub uri: String,
}

/// HLS packaging parameters for one job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HlsManifest {
    pub segment_duration: u32,
    pub playlist_type: String,
    pub enable_encryption: bool,
    pub key_rotation_interval: u32,
    pub variants: Vec<HlsVariant>,
}

/// One DASH representation entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DashRepresentation {
    pub label: String,
    pub bandwidth: u64,
    pub width: u32,
    pub height: u32,
}

/// DASH packaging parameters for one job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DashManifest {
    pub segment_duration: u32,
    pub adaptation_sets: Vec<String>,
    pub enable_encryption: bool,
    pub representations: Vec<DashRepresentation>,
}

/// Combined packaging configuration for one job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ManifestConfig {
    pub hls: HlsManifest,
    pub dash: DashManifest,
}

/// Build the packaging configuration for a job.
pub fn build_manifest_config(
    job: &VideoJob,
    settings: &ManifestSettings,
    policy: &StoragePolicy,
    catalog: &QualityCatalog,
) -> ManifestConfig {
    let variants = job
        .qualities
        .iter()
        .map(|label| {
            let profile = catalog.profile(*label);
            HlsVariant {
                label: label.as_str().to_string(),
                bandwidth: profile.bandwidth(),
                resolution: format!("{}x{}", profile.width, profile.height),
                uri: policy.cdn_url(job.id.as_str(), label.as_str()),
            }
        })
        .collect();

    let representations = job
        .qualities
        .iter()
        .map(|label| {
            let profile = catalog.profile(*label);
            DashRepresentation {
                label: label.as_str().to_string(),
                bandwidth: profile.bandwidth(),
                width: profile.width,
                height: profile.height,
            }
        })
        .collect();

    ManifestConfig {
        hls: HlsManifest {
            segment_duration: settings.hls.segment_duration,
            playlist_type: settings.hls.playlist_type.clone(),
            enable_encryption: settings.hls.enable_encryption,
            key_rotation_interval: settings.hls.key_rotation_interval,
            variants,
        },
        dash: DashManifest {
            segment_duration: settings.dash.segment_duration,
            adaptation_sets: settings.dash.adaptation_sets.clone(),
            enable_encryption: settings.dash.enable_encryption,
            representations,
        },
    }
}
