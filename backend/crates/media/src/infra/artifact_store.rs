//! Artifact Store
//!
//! Owns the upload staging directory and the public output directory.

use crate::domain::entities::OutputArtifact;
use crate::domain::value_objects::Quality;
use crate::error::{MediaError, MediaResult};
use crate::infra::image_store::{ArtifactFormat, render};
use image::DynamicImage;
use kernel::id::{ArtifactId, StagingId};
use std::io;
use std::path::{Path, PathBuf};

const STAGING_PREFIX: &str = "in";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(upload_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub async fn ensure_dirs(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::create_dir_all(&self.output_dir).await
    }

    /// Fresh `{prefix}_{id}.{ext}` path in the upload directory
    pub fn staging_path(&self, prefix: &str, ext: &str) -> PathBuf {
        self.upload_dir.join(StagingId::new().file_name(prefix, ext))
    }

    /// Write `bytes` to a fresh `in_{id}.{ext}` staging file
    pub async fn stage_upload(&self, bytes: &[u8], ext: &str) -> io::Result<PathBuf> {
        let path = self.staging_path(STAGING_PREFIX, ext);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Fresh artifact name in the output directory; nothing is written yet
    pub fn reserve(&self, prefix: &str, ext: &str) -> OutputArtifact {
        let id = ArtifactId::new();
        let file_name = id.file_name(prefix, ext);
        OutputArtifact {
            path: self.output_dir.join(&file_name),
            id,
            file_name,
        }
    }

    /// Render `image` with the quality preset and store it as a new artifact
    pub async fn save_image(
        &self,
        image: DynamicImage,
        prefix: &str,
        format: ArtifactFormat,
        quality: Quality,
    ) -> MediaResult<OutputArtifact> {
        let bytes = tokio::task::spawn_blocking(move || render(image, format, quality))
            .await
            .map_err(|e| MediaError::Processing(format!("encode task failed: {e}")))?
            .map_err(|e| MediaError::Processing(format!("encode failed: {e}")))?;

        let artifact = self.reserve(prefix, format.extension());
        tokio::fs::write(&artifact.path, &bytes).await?;

        tracing::debug!(
            filename = %artifact.file_name,
            bytes = bytes.len(),
            quality = %quality,
            "Artifact written"
        );
        Ok(artifact)
    }

    /// First output file whose name starts with `stem`
    pub async fn find_by_stem(&self, stem: &str) -> io::Result<Option<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.output_dir).await?;
        let mut matches = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with(stem) && entry.file_type().await?.is_file() {
                matches.push(entry.path());
            }
        }
        // Directory order is unspecified; keep the choice stable.
        matches.sort();
        Ok(matches.into_iter().next())
    }

    /// Remove a staging or output file, ignoring files that are already gone
    pub async fn discard(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Discarded file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to discard file"),
        }
    }
}
