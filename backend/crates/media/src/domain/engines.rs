//! Engine Traits
//!
//! Interfaces to the external tools that do the heavy lifting.
//! Implementations live in the infrastructure layer.

use crate::domain::entities::RawVideoInfo;
use crate::domain::value_objects::DownloadFormat;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Failure of an external engine call
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("{tool} did not finish within {after:?}")]
    Timeout { tool: String, after: Duration },

    #[error("Unexpected output from {tool}: {message}")]
    Output { tool: String, message: String },
}

impl EngineError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, EngineError::Timeout { .. })
    }
}

/// Everything the downloader needs for one job
#[derive(Debug, Clone)]
pub struct DownloadPlan {
    pub url: String,
    pub format: DownloadFormat,
    /// Output path template; the downloader substitutes `%(ext)s`
    pub output_template: PathBuf,
    pub max_filesize_bytes: u64,
}

/// Background removal model
#[trait_variant::make(BackgroundRemover: Send)]
pub trait LocalBackgroundRemover {
    /// Whether the model loaded at startup
    fn is_ready(&self) -> bool;

    /// Read an image from `input`, write an RGBA PNG cutout to `output`
    async fn remove_background(&self, input: &Path, output: &Path) -> Result<(), EngineError>;
}

/// Video metadata extraction and download
#[trait_variant::make(VideoExtractor: Send)]
pub trait LocalVideoExtractor {
    /// Metadata only, no download, no playlist expansion
    async fn extract_info(&self, url: &str) -> Result<RawVideoInfo, EngineError>;

    /// Download according to `plan`; the file lands next to the template
    async fn download(&self, plan: &DownloadPlan) -> Result<(), EngineError>;
}
