//! Video Info Use Case

use crate::application::config::MediaConfig;
use crate::domain::engines::VideoExtractor;
use crate::domain::entities::VideoSummary;
use crate::domain::services::summarize;
use crate::domain::value_objects::DomainVerdict;
use crate::error::{MediaError, MediaResult};
use std::sync::Arc;

pub struct VideoInfoUseCase<E>
where
    E: VideoExtractor,
{
    engine: Arc<E>,
    config: Arc<MediaConfig>,
}

impl<E> VideoInfoUseCase<E>
where
    E: VideoExtractor,
{
    pub fn new(engine: Arc<E>, config: Arc<MediaConfig>) -> Self {
        Self { engine, config }
    }

    pub async fn execute(&self, url: &str) -> MediaResult<VideoSummary> {
        check_domain(&self.config, url)?;

        let info = self.engine.extract_info(url.trim()).await.map_err(|e| {
            if e.is_timeout() {
                MediaError::EngineTimeout(e)
            } else {
                MediaError::VideoInfo(e)
            }
        })?;

        let summary = summarize(info);
        tracing::info!(
            source = summary.source.as_deref().unwrap_or("unknown"),
            formats = summary.formats.len(),
            "Video info fetched"
        );
        Ok(summary)
    }
}

/// Apply the domain policy to a client-supplied URL
pub(crate) fn check_domain(config: &MediaConfig, url: &str) -> MediaResult<()> {
    match config.domain_policy.check(url) {
        DomainVerdict::Allowed => Ok(()),
        DomainVerdict::Flagged { host } => {
            tracing::warn!(host = %host, "Suspicious domain");
            Ok(())
        }
        DomainVerdict::Rejected { host } => Err(MediaError::UnsupportedDomain(host)),
        DomainVerdict::Invalid => Err(MediaError::InvalidPayload("Invalid URL".to_string())),
    }
}
