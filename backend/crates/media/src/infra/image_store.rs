//! Image decode / encode
//!
//! Decoding honours EXIF orientation. Encoding always re-encodes from pixels,
//! so no metadata from the upload survives into an artifact.

use crate::domain::services::fit_dimensions;
use crate::domain::value_objects::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageReader, ImageResult};
use std::io::Cursor;

/// Container written for an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// Keeps alpha
    Png,
    /// Alpha dropped
    Jpeg,
}

impl ArtifactFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactFormat::Png => "png",
            ArtifactFormat::Jpeg => "jpg",
        }
    }
}

/// Decode any supported image and rotate it upright
pub fn decode_image(bytes: &[u8]) -> ImageResult<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Downscale so the longest edge is at most `max_dim` (Lanczos3)
pub fn fit_within(image: DynamicImage, max_dim: u32) -> DynamicImage {
    let (w, h) = (image.width(), image.height());
    let (nw, nh) = fit_dimensions(w, h, max_dim);
    if (nw, nh) == (w, h) {
        return image;
    }
    image.resize_exact(nw, nh, FilterType::Lanczos3)
}

pub fn encode(
    image: &DynamicImage,
    format: ArtifactFormat,
    quality: Quality,
) -> ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        ArtifactFormat::Png => {
            let encoder =
                PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive);
            image.write_with_encoder(encoder)?;
        }
        ArtifactFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality.jpeg_quality());
            DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
        }
    }
    Ok(buf)
}

/// Quality-aware render: size cap from the preset, then encode
pub fn render(
    image: DynamicImage,
    format: ArtifactFormat,
    quality: Quality,
) -> ImageResult<Vec<u8>> {
    let image = fit_within(image, quality.max_dimension());
    encode(&image, format, quality)
}
