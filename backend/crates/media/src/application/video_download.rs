//! Video Download Use Case

use crate::application::config::MediaConfig;
use crate::application::video_info::check_domain;
use crate::domain::engines::{DownloadPlan, VideoExtractor};
use crate::domain::entities::DownloadedFile;
use crate::domain::value_objects::DownloadFormat;
use crate::error::{MediaError, MediaResult};
use crate::infra::artifact_store::ArtifactStore;
use kernel::id::ArtifactId;
use std::sync::Arc;

const ARTIFACT_PREFIX: &str = "dl";

#[derive(Debug, Clone)]
pub struct VideoDownloadInput {
    pub url: String,
    pub format_id: String,
}

pub struct VideoDownloadUseCase<E>
where
    E: VideoExtractor,
{
    engine: Arc<E>,
    store: Arc<ArtifactStore>,
    config: Arc<MediaConfig>,
}

impl<E> VideoDownloadUseCase<E>
where
    E: VideoExtractor,
{
    pub fn new(engine: Arc<E>, store: Arc<ArtifactStore>, config: Arc<MediaConfig>) -> Self {
        Self {
            engine,
            store,
            config,
        }
    }

    pub async fn execute(&self, input: VideoDownloadInput) -> MediaResult<DownloadedFile> {
        check_domain(&self.config, &input.url)?;
        let format = DownloadFormat::parse(&input.format_id)
            .ok_or_else(|| MediaError::InvalidPayload("Invalid format_id".to_string()))?;

        let stem = ArtifactId::new().stem(ARTIFACT_PREFIX);
        let plan = DownloadPlan {
            url: input.url.trim().to_string(),
            output_template: self.store.output_dir().join(format!("{stem}.%(ext)s")),
            max_filesize_bytes: self.config.max_video_bytes,
            format,
        };

        self.engine.download(&plan).await.map_err(|e| {
            if e.is_timeout() {
                MediaError::EngineTimeout(e)
            } else {
                self.failed(e.to_string())
            }
        })?;

        // Post-processing may change the extension, so fall back to the stem.
        let expected = self
            .store
            .output_dir()
            .join(format!("{stem}.{}", plan.format.final_extension()));
        let path = if tokio::fs::try_exists(&expected).await.unwrap_or(false) {
            expected
        } else {
            self.store
                .find_by_stem(&stem)
                .await?
                .ok_or_else(|| self.failed(format!("no file produced for {stem}")))?
        };

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| self.failed(format!("unusable file name for {stem}")))?;

        tracing::info!(filename = %file_name, format = %input.format_id, "Video downloaded");
        Ok(DownloadedFile { file_name, path })
    }

    fn failed(&self, reason: String) -> MediaError {
        MediaError::Download {
            reason,
            max_mb: self.config.max_video_mb(),
        }
    }
}
