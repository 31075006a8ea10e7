//! Engine implementations backed by command line tools

use crate::application::config::MediaConfig;
use crate::domain::engines::{BackgroundRemover, DownloadPlan, EngineError, VideoExtractor};
use crate::domain::entities::RawVideoInfo;
use crate::infra::rembg::RembgCli;
use crate::infra::ytdlp::YtDlpCli;
use std::path::Path;

/// `rembg` + `yt-dlp`
#[derive(Debug, Clone)]
pub struct CliEngines {
    rembg: RembgCli,
    ytdlp: YtDlpCli,
}

impl CliEngines {
    pub fn new(rembg: RembgCli, ytdlp: YtDlpCli) -> Self {
        Self { rembg, ytdlp }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(
            RembgCli::new(&config.rembg_bin, &config.rembg_model, config.engine_timeout),
            YtDlpCli::new(&config.ytdlp_bin, config.engine_timeout),
        )
    }

    /// See [`RembgCli::warm_up`]
    pub async fn warm_up(&self) -> Result<(), EngineError> {
        self.rembg.warm_up().await
    }
}

impl BackgroundRemover for CliEngines {
    fn is_ready(&self) -> bool {
        self.rembg.is_ready()
    }

    async fn remove_background(&self, input: &Path, output: &Path) -> Result<(), EngineError> {
        self.rembg.remove_background(input, output).await
    }
}

impl VideoExtractor for CliEngines {
    async fn extract_info(&self, url: &str) -> Result<RawVideoInfo, EngineError> {
        self.ytdlp.extract_info(url).await
    }

    async fn download(&self, plan: &DownloadPlan) -> Result<(), EngineError> {
        self.ytdlp.download(plan).await
    }
}
