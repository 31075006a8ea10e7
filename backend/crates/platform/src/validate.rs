//! Upload Validation
//!
//! Magic-byte checks so a renamed file cannot pass as an image.

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const RIFF_MAGIC: &[u8] = b"RIFF";
const WEBP_FOURCC: &[u8] = b"WEBP";

/// Image containers accepted for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

/// Identify the container from its leading bytes
fn sniff_image_format(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(JPEG_MAGIC) {
        return Some(ImageFormat::Jpeg);
    }
    if bytes.starts_with(PNG_MAGIC) {
        return Some(ImageFormat::Png);
    }
    // RIFF <u32 size> WEBP
    if bytes.starts_with(RIFF_MAGIC) && bytes.get(8..12) == Some(WEBP_FOURCC) {
        return Some(ImageFormat::Webp);
    }
    None
}

/// True if the buffer starts like a JPEG, PNG or WEBP file
pub fn is_supported_image(bytes: &[u8]) -> bool {
    sniff_image_format(bytes).is_some()
}
