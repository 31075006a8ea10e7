//! Domain Entities
//!
//! Artifacts written to disk, and video metadata as reported by the extractor.

use kernel::id::ArtifactId;
use serde::Deserialize;
use std::path::PathBuf;

/// A file in the output directory, exposed under `/outputs`
#[derive(Debug, Clone)]
pub struct OutputArtifact {
    pub id: ArtifactId,
    pub file_name: String,
    pub path: PathBuf,
}

impl OutputArtifact {
    /// Public URL of the artifact under `base_url`
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/outputs/{}", base_url.trim_end_matches('/'), self.file_name)
    }
}

/// A downloaded video/audio file ready to stream back
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub file_name: String,
    pub path: PathBuf,
}

/// Subset of the extractor's JSON metadata that the service uses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVideoInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub duration_string: Option<String>,
    #[serde(default)]
    pub extractor_key: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

/// One entry of the extractor's `formats` array
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFormat {
    #[serde(default)]
    pub format_id: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    /// Some extractors report sizes as floats
    #[serde(default)]
    pub filesize: Option<f64>,
    #[serde(default)]
    pub filesize_approx: Option<f64>,
    #[serde(default)]
    pub format_note: Option<String>,
}

impl RawFormat {
    /// Exact size when known, otherwise the extractor's estimate
    pub fn size_bytes(&self) -> Option<u64> {
        self.filesize
            .filter(|s| *s > 0.0)
            .or(self.filesize_approx)
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(|s| s as u64)
    }
}

/// A downloadable option offered to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOption {
    pub format_id: String,
    pub resolution: String,
    pub ext: String,
    pub size: String,
    pub note: String,
}

/// Metadata returned by the video-info endpoint
#[derive(Debug, Clone)]
pub struct VideoSummary {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<String>,
    pub source: Option<String>,
    pub formats: Vec<FormatOption>,
}
