//! `yt-dlp` command line adapter

use crate::domain::engines::{DownloadPlan, EngineError};
use crate::domain::entities::RawVideoInfo;
use crate::domain::value_objects::DownloadFormat;
use crate::infra::process::run_tool;
use std::ffi::OsString;
use std::time::Duration;
use tokio::process::Command;

const TOOL: &str = "yt-dlp";

/// Network retries handed to the downloader
const RETRIES: &str = "3";

const MP3_BITRATE: &str = "192K";

#[derive(Debug, Clone)]
pub struct YtDlpCli {
    bin: String,
    timeout: Duration,
}

impl YtDlpCli {
    pub fn new(bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }

    pub async fn extract_info(&self, url: &str) -> Result<RawVideoInfo, EngineError> {
        let mut cmd = Command::new(&self.bin);
        cmd.args(info_args(url));

        let stdout = run_tool(cmd, TOOL, self.timeout).await?;
        serde_json::from_slice(&stdout).map_err(|e| EngineError::Output {
            tool: TOOL.to_string(),
            message: format!("invalid metadata JSON: {e}"),
        })
    }

    pub async fn download(&self, plan: &DownloadPlan) -> Result<(), EngineError> {
        let mut cmd = Command::new(&self.bin);
        cmd.args(download_args(plan));

        run_tool(cmd, TOOL, self.timeout).await?;
        Ok(())
    }
}

fn info_args(url: &str) -> Vec<OsString> {
    ["-J", "--no-playlist", "--no-warnings", "-q", "--skip-download", "--", url]
        .into_iter()
        .map(OsString::from)
        .collect()
}

fn download_args(plan: &DownloadPlan) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "--no-playlist",
        "--no-warnings",
        "-q",
        "--retries",
        RETRIES,
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    args.push("--max-filesize".into());
    args.push(plan.max_filesize_bytes.to_string().into());
    args.push("-o".into());
    args.push(plan.output_template.clone().into_os_string());
    args.push("-f".into());
    args.push(plan.format.selector().into());

    match &plan.format {
        DownloadFormat::Mp3 => {
            for arg in ["-x", "--audio-format", "mp3", "--audio-quality", MP3_BITRATE] {
                args.push(arg.into());
            }
        }
        DownloadFormat::Best | DownloadFormat::Id(_) => {
            args.push("--merge-output-format".into());
            args.push("mp4".into());
        }
    }

    args.push("--".into());
    args.push(plan.url.clone().into());
    args
}
