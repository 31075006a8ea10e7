//! API DTOs (Data Transfer Objects)

use crate::domain::entities::{FormatOption, VideoSummary};
use serde::{Deserialize, Serialize};

/// Response for GET /
#[derive(Debug, Clone, Serialize)]
pub struct RootResponse {
    pub status: String,
    pub model: String,
    pub version: String,
}

/// Response for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub model_ready: bool,
    pub tracked_clients: usize,
}

/// Response for POST /api/remove-bg
#[derive(Debug, Clone, Serialize)]
pub struct RemoveBgResponse {
    pub url: String,
    pub filename: String,
    pub quality: String,
}

fn default_strength() -> i64 {
    5
}

fn default_detail() -> i64 {
    2
}

fn default_quality() -> String {
    "HD".to_string()
}

/// Request for POST /api/erase-object
#[derive(Debug, Clone, Deserialize)]
pub struct EraseRequest {
    pub image: String,
    pub mask: String,
    #[serde(default = "default_strength")]
    pub strength: i64,
    #[serde(default = "default_detail")]
    pub detail: i64,
    #[serde(default = "default_quality")]
    pub quality: String,
}

/// Response for POST /api/erase-object
#[derive(Debug, Clone, Serialize)]
pub struct EraseResponse {
    pub url: String,
}

/// Request for POST /api/video-info
#[derive(Debug, Clone, Deserialize)]
pub struct VideoInfoRequest {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormatDto {
    pub format_id: String,
    pub resolution: String,
    pub ext: String,
    pub size: String,
    pub note: String,
}

impl From<FormatOption> for FormatDto {
    fn from(option: FormatOption) -> Self {
        Self {
            format_id: option.format_id,
            resolution: option.resolution,
            ext: option.ext,
            size: option.size,
            note: option.note,
        }
    }
}

/// Response for POST /api/video-info
#[derive(Debug, Clone, Serialize)]
pub struct VideoInfoResponse {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<String>,
    pub source: Option<String>,
    pub formats: Vec<FormatDto>,
}

impl From<VideoSummary> for VideoInfoResponse {
    fn from(summary: VideoSummary) -> Self {
        Self {
            title: summary.title,
            thumbnail: summary.thumbnail,
            duration: summary.duration,
            source: summary.source,
            formats: summary.formats.into_iter().map(FormatDto::from).collect(),
        }
    }
}

/// Request for POST /api/video-download
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    pub format_id: String,
}
