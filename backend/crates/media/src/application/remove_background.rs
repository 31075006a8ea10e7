//! Remove Background Use Case

use crate::application::config::MediaConfig;
use crate::domain::engines::BackgroundRemover;
use crate::domain::entities::OutputArtifact;
use crate::domain::value_objects::Quality;
use crate::error::{MediaError, MediaResult};
use crate::infra::artifact_store::ArtifactStore;
use crate::infra::image_store::{ArtifactFormat, decode_image, encode, fit_within};
use platform::validate::is_supported_image;
use std::path::Path;
use std::sync::Arc;

const ARTIFACT_PREFIX: &str = "rbg";

#[derive(Debug, Clone)]
pub struct RemoveBackgroundInput {
    pub bytes: Vec<u8>,
    pub quality: Quality,
}

#[derive(Debug, Clone)]
pub struct RemoveBackgroundOutput {
    pub artifact: OutputArtifact,
    pub quality: Quality,
}

pub struct RemoveBackgroundUseCase<E>
where
    E: BackgroundRemover,
{
    engine: Arc<E>,
    store: Arc<ArtifactStore>,
    config: Arc<MediaConfig>,
}

impl<E> RemoveBackgroundUseCase<E>
where
    E: BackgroundRemover,
{
    pub fn new(engine: Arc<E>, store: Arc<ArtifactStore>, config: Arc<MediaConfig>) -> Self {
        Self {
            engine,
            store,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: RemoveBackgroundInput,
    ) -> MediaResult<RemoveBackgroundOutput> {
        if !is_supported_image(&input.bytes) {
            return Err(MediaError::InvalidImage("unrecognised file header".to_string()));
        }
        if !self.engine.is_ready() {
            return Err(MediaError::EngineUnavailable);
        }

        // Upright, capped, metadata-free PNG for the model
        let max_dim = self.config.server_max_dimension;
        let bytes = input.bytes;
        let prepared = tokio::task::spawn_blocking(move || -> MediaResult<Vec<u8>> {
            let image = decode_image(&bytes).map_err(|e| MediaError::InvalidImage(e.to_string()))?;
            let image = fit_within(image, max_dim);
            encode(&image, ArtifactFormat::Png, Quality::Hd)
                .map_err(|e| MediaError::Processing(format!("staging encode failed: {e}")))
        })
        .await
        .map_err(|e| MediaError::Processing(format!("prepare task failed: {e}")))??;

        let staged_in = self.store.stage_upload(&prepared, "png").await?;
        let staged_out = self.store.staging_path("out", "png");

        let result = self.cut_out(&staged_in, &staged_out).await;
        self.store.discard(&staged_in).await;
        self.store.discard(&staged_out).await;
        let cutout = result?;

        let artifact = self
            .store
            .save_image(cutout, ARTIFACT_PREFIX, ArtifactFormat::Png, input.quality)
            .await?;

        tracing::info!(
            filename = %artifact.file_name,
            quality = %input.quality,
            "Background removed"
        );

        Ok(RemoveBackgroundOutput {
            artifact,
            quality: input.quality,
        })
    }

    async fn cut_out(&self, input: &Path, output: &Path) -> MediaResult<image::DynamicImage> {
        self.engine
            .remove_background(input, output)
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MediaError::EngineTimeout(e)
                } else {
                    MediaError::Processing(e.to_string())
                }
            })?;

        let bytes = tokio::fs::read(output).await?;
        tokio::task::spawn_blocking(move || decode_image(&bytes))
            .await
            .map_err(|e| MediaError::Processing(format!("decode task failed: {e}")))?
            .map_err(|e| MediaError::Processing(format!("engine output unreadable: {e}")))
    }
}
