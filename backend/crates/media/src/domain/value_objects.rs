//! Domain Value Objects
//!
//! Immutable value types for the media domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Output quality preset chosen by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    #[serde(rename = "HD")]
    Hd,
    Medium,
    Low,
}

impl Quality {
    /// Lenient parse; anything unrecognised is treated as HD
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "medium" => Quality::Medium,
            "low" => Quality::Low,
            _ => Quality::Hd,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Hd => "HD",
            Quality::Medium => "Medium",
            Quality::Low => "Low",
        }
    }

    /// Longest edge allowed in the saved artifact
    pub fn max_dimension(&self) -> u32 {
        match self {
            Quality::Hd => 4096,
            Quality::Medium => 2048,
            Quality::Low => 1280,
        }
    }

    pub fn jpeg_quality(&self) -> u8 {
        match self {
            Quality::Hd => 95,
            Quality::Medium => 85,
            Quality::Low => 70,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with a video URL whose host is not allow-listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyMode {
    Enforce,
    #[default]
    LogOnly,
}

impl FromStr for PolicyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enforce" => Ok(PolicyMode::Enforce),
            "log_only" | "log-only" | "log" => Ok(PolicyMode::LogOnly),
            other => Err(format!("unknown domain policy mode: {other}")),
        }
    }
}

/// Outcome of checking a URL against the allow-list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainVerdict {
    Allowed,
    /// Not allow-listed, but the policy only logs
    Flagged { host: String },
    Rejected { host: String },
    /// Not an http(s) URL with a host
    Invalid,
}

/// Host allow-list for the video endpoints
#[derive(Debug, Clone)]
pub struct DomainPolicy {
    allowed: Vec<String>,
    mode: PolicyMode,
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HOSTS.iter().copied(), PolicyMode::default())
    }
}

impl DomainPolicy {
    pub const DEFAULT_HOSTS: &'static [&'static str] = &[
        "youtube.com",
        "youtu.be",
        "tiktok.com",
        "instagram.com",
        "twitter.com",
        "x.com",
        "facebook.com",
        "fb.watch",
    ];

    pub fn new<I, S>(hosts: I, mode: PolicyMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: hosts
                .into_iter()
                .map(|h| h.as_ref().trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            mode,
        }
    }

    pub fn mode(&self) -> PolicyMode {
        self.mode
    }

    pub fn with_mode(mut self, mode: PolicyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Exact host or any subdomain of an allow-listed host
    pub fn host_allowed(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.allowed.iter().any(|allowed| {
            host == *allowed
                || host
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    pub fn check(&self, raw_url: &str) -> DomainVerdict {
        let Ok(url) = Url::parse(raw_url.trim()) else {
            return DomainVerdict::Invalid;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return DomainVerdict::Invalid;
        }
        let Some(host) = url.host_str() else {
            return DomainVerdict::Invalid;
        };

        if self.host_allowed(host) {
            DomainVerdict::Allowed
        } else {
            let host = host.to_string();
            match self.mode {
                PolicyMode::Enforce => DomainVerdict::Rejected { host },
                PolicyMode::LogOnly => DomainVerdict::Flagged { host },
            }
        }
    }
}

/// Format selection for a video download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadFormat {
    /// Best audio, converted to mp3
    Mp3,
    /// Best video + best audio, merged to mp4
    Best,
    /// A specific extractor format id plus best audio, merged to mp4
    Id(String),
}

impl DownloadFormat {
    /// Parse a client-supplied format id; `None` if it contains characters
    /// that could be read as a downloader option or selector expression
    pub fn parse(format_id: &str) -> Option<Self> {
        let format_id = format_id.trim();
        match format_id {
            "" => None,
            "mp3" => Some(DownloadFormat::Mp3),
            "best" => Some(DownloadFormat::Best),
            id if !id.starts_with('-')
                && id.len() <= 64
                && id
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')) =>
            {
                Some(DownloadFormat::Id(id.to_string()))
            }
            _ => None,
        }
    }

    /// Format selector handed to the downloader
    pub fn selector(&self) -> String {
        match self {
            DownloadFormat::Mp3 => "bestaudio/best".to_string(),
            DownloadFormat::Best => "bestvideo+bestaudio/best".to_string(),
            DownloadFormat::Id(id) => format!("{id}+bestaudio/best"),
        }
    }

    /// Extension of the file the downloader should end up producing
    pub fn final_extension(&self) -> &'static str {
        match self {
            DownloadFormat::Mp3 => "mp3",
            DownloadFormat::Best | DownloadFormat::Id(_) => "mp4",
        }
    }
}

/// Tuning knobs for object erasure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EraseParams {
    /// Mask growth multiplier (1..=20)
    pub strength: u32,
    /// Sharpen the result when > 0
    pub detail: u32,
}

impl EraseParams {
    pub const MAX_STRENGTH: u32 = 20;

    pub fn new(strength: i64, detail: i64) -> Self {
        Self {
            strength: strength.clamp(1, Self::MAX_STRENGTH as i64) as u32,
            detail: detail.max(0) as u32,
        }
    }
}

impl Default for EraseParams {
    fn default() -> Self {
        Self::new(5, 2)
    }
}
