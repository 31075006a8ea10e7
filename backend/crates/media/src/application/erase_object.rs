//! Erase Object Use Case

use crate::application::config::MediaConfig;
use crate::domain::engines::EngineError;
use crate::domain::entities::OutputArtifact;
use crate::domain::inpaint::erase_object;
use crate::domain::services::fit_dimensions;
use crate::domain::value_objects::{EraseParams, Quality};
use crate::error::{MediaError, MediaResult};
use crate::infra::artifact_store::ArtifactStore;
use crate::infra::image_store::{ArtifactFormat, decode_image};
use image::DynamicImage;
use image::imageops::{self, FilterType};
use platform::encoding::decode_data_url;
use std::sync::Arc;

const ARTIFACT_PREFIX: &str = "magic";

#[derive(Debug, Clone)]
pub struct EraseObjectInput {
    /// Data URL or bare base64
    pub image: String,
    /// Data URL or bare base64; bright pixels mark what to erase
    pub mask: String,
    pub params: EraseParams,
    pub quality: Quality,
}

pub struct EraseObjectUseCase {
    store: Arc<ArtifactStore>,
    config: Arc<MediaConfig>,
}

impl EraseObjectUseCase {
    pub fn new(store: Arc<ArtifactStore>, config: Arc<MediaConfig>) -> Self {
        Self { store, config }
    }

    pub async fn execute(&self, input: EraseObjectInput) -> MediaResult<OutputArtifact> {
        let image_bytes = decode_data_url(&input.image)?;
        let mask_bytes = decode_data_url(&input.mask)?;
        let max_dim = self.config.erase_max_dimension;
        let params = input.params;

        let task = tokio::task::spawn_blocking(move || -> MediaResult<DynamicImage> {
            let image = decode_image(&image_bytes)
                .map_err(|e| MediaError::InvalidImage(format!("image: {e}")))?
                .to_rgb8();
            let mask = decode_image(&mask_bytes)
                .map_err(|e| MediaError::InvalidImage(format!("mask: {e}")))?
                .to_luma8();

            let (w, h) = fit_dimensions(image.width(), image.height(), max_dim);
            let image = if (w, h) == image.dimensions() {
                image
            } else {
                imageops::resize(&image, w, h, FilterType::Triangle)
            };
            // Nearest keeps the mask binary after thresholding
            let mask = if mask.dimensions() == (w, h) {
                mask
            } else {
                imageops::resize(&mask, w, h, FilterType::Nearest)
            };

            Ok(DynamicImage::ImageRgb8(erase_object(&image, &mask, params)))
        });

        let timeout = self.config.engine_timeout;
        let result = tokio::time::timeout(timeout, task)
            .await
            .map_err(|_| {
                MediaError::EngineTimeout(EngineError::Timeout {
                    tool: "eraser".to_string(),
                    after: timeout,
                })
            })?
            .map_err(|e| MediaError::Erase(format!("erase task failed: {e}")))??;

        let artifact = self
            .store
            .save_image(result, ARTIFACT_PREFIX, ArtifactFormat::Jpeg, input.quality)
            .await
            .map_err(|e| match e {
                MediaError::Processing(msg) => MediaError::Erase(msg),
                other => other,
            })?;

        tracing::info!(
            filename = %artifact.file_name,
            strength = params.strength,
            detail = params.detail,
            "Object erased"
        );
        Ok(artifact)
    }
}
