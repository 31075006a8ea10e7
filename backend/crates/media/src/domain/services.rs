//! Domain Services
//!
//! Pure logic shared by the use cases.

use crate::domain::entities::{FormatOption, RawVideoInfo, VideoSummary};
use platform::format::format_bytes;
use std::collections::HashSet;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm"];

/// Synthetic audio-only option offered ahead of the real formats
pub fn mp3_option() -> FormatOption {
    FormatOption {
        format_id: "mp3".to_string(),
        resolution: "Audio MP3".to_string(),
        ext: "mp3".to_string(),
        size: "~3MB".to_string(),
        note: "High Quality Audio".to_string(),
    }
}

/// Collapse the extractor's format list into one option per resolution
///
/// Formats are visited from last to first (the extractor lists best last),
/// keeping only video formats in a web-friendly container.
pub fn build_format_list(info: &RawVideoInfo) -> Vec<FormatOption> {
    let mut options = vec![mp3_option()];
    let mut seen = HashSet::new();

    for format in info.formats.iter().rev() {
        let resolution = match (&format.resolution, format.height) {
            (Some(res), _) if !res.is_empty() => res.clone(),
            (_, Some(height)) => format!("{height}p"),
            _ => continue,
        };
        let Some(ext) = format.ext.as_deref() else {
            continue;
        };
        if format.vcodec.as_deref() == Some("none") || !VIDEO_EXTENSIONS.contains(&ext) {
            continue;
        }
        if !seen.insert(resolution.clone()) {
            continue;
        }

        options.push(FormatOption {
            format_id: format.format_id.clone().unwrap_or_default(),
            resolution,
            ext: ext.to_string(),
            size: format_bytes(format.size_bytes()),
            note: format.format_note.clone().unwrap_or_default(),
        });
    }

    options
}

pub fn summarize(info: RawVideoInfo) -> VideoSummary {
    let formats = build_format_list(&info);
    VideoSummary {
        title: info.title,
        thumbnail: info.thumbnail,
        duration: info.duration_string,
        source: info.extractor_key,
        formats,
    }
}

/// Scale `(width, height)` down so the longest edge is at most `max_dim`,
/// keeping the aspect ratio. Never scales up.
pub fn fit_dimensions(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dim || longest == 0 {
        return (width, height);
    }
    let scale = |v: u32| ((v as u64 * max_dim as u64 / longest as u64) as u32).max(1);
    (scale(width), scale(height))
}
