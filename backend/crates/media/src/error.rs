//! Media Error Types
//!
//! Domain failures of the media endpoints. Each variant maps to an HTTP
//! status and renders through `kernel::error::AppError`, so clients always
//! see a generic Problem Details body while the cause goes to the log.

use crate::domain::engines::EngineError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use std::time::Duration;
use thiserror::Error;

/// Media-specific result type alias
pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    /// Admission controller turned the request away
    #[error("Too many requests")]
    RateLimited { retry_after: Duration },

    /// Upload is not a JPEG/PNG/WEBP or cannot be decoded
    #[error("Invalid image file: {0}")]
    InvalidImage(String),

    /// Malformed request body or field
    #[error("Invalid request: {0}")]
    InvalidPayload(String),

    /// Video host not on the allow-list (enforce mode)
    #[error("Unsupported domain: {0}")]
    UnsupportedDomain(String),

    /// Extractor rejection from axum, already classified
    #[error("{0}")]
    Rejected(AppError),

    /// Background removal model failed to load
    #[error("Model unavailable")]
    EngineUnavailable,

    #[error("Engine timed out: {0}")]
    EngineTimeout(#[source] EngineError),

    /// Background removal or image re-encoding failed
    #[error("Processing failed: {0}")]
    Processing(String),

    /// Object erasure failed
    #[error("Erase failed: {0}")]
    Erase(String),

    #[error("Video info failed: {0}")]
    VideoInfo(#[source] EngineError),

    /// Downloader failed; `max_mb` is the configured size cap
    #[error("Download failed: {reason}")]
    Download { reason: String, max_mb: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MediaError::Rejected(err) => {
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_REQUEST)
            }
            _ => StatusCode::from_u16(self.kind().status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MediaError::RateLimited { .. } => ErrorKind::TooManyRequests,
            MediaError::InvalidImage(_)
            | MediaError::InvalidPayload(_)
            | MediaError::UnsupportedDomain(_)
            | MediaError::VideoInfo(_) => ErrorKind::BadRequest,
            MediaError::Rejected(err) => err.kind(),
            MediaError::EngineUnavailable | MediaError::EngineTimeout(_) => {
                ErrorKind::ServiceUnavailable
            }
            MediaError::Processing(_)
            | MediaError::Erase(_)
            | MediaError::Download { .. }
            | MediaError::Io(_) => ErrorKind::InternalServerError,
        }
    }

    /// Message safe to show to the client
    pub fn public_message(&self) -> String {
        match self {
            MediaError::RateLimited { .. } => "Too many requests".to_string(),
            MediaError::InvalidImage(_) => "Invalid image file".to_string(),
            MediaError::InvalidPayload(msg) => msg.clone(),
            MediaError::UnsupportedDomain(_) => "Unsupported domain".to_string(),
            MediaError::Rejected(err) => err.message().to_string(),
            MediaError::EngineUnavailable => "Model unavailable".to_string(),
            MediaError::EngineTimeout(_) => "Processing timed out".to_string(),
            MediaError::Processing(_) | MediaError::Io(_) => "Processing Failed".to_string(),
            MediaError::Erase(_) => "Magic Eraser Failed".to_string(),
            MediaError::VideoInfo(_) => "Failed to fetch video info".to_string(),
            MediaError::Download { max_mb, .. } => {
                format!("Download failed (file may exceed {max_mb}MB)")
            }
        }
    }

    fn log(&self) {
        match self {
            MediaError::Processing(_)
            | MediaError::Erase(_)
            | MediaError::Download { .. }
            | MediaError::Io(_)
            | MediaError::EngineTimeout(_) => {
                tracing::error!(error = %self, "Media request failed");
            }
            MediaError::EngineUnavailable => {
                tracing::warn!("Background removal model unavailable");
            }
            MediaError::RateLimited { retry_after } => {
                tracing::warn!(
                    retry_after_ms = retry_after.as_millis() as u64,
                    "Rate limit exceeded"
                );
            }
            MediaError::VideoInfo(err) => {
                tracing::warn!(error = %err, "Video info lookup failed");
            }
            _ => {
                tracing::debug!(error = %self, "Media request rejected");
            }
        }
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Rejected(inner) => inner,
            MediaError::RateLimited { retry_after } => {
                AppError::too_many_requests("Too many requests")
                    .with_action("Slow down and retry later")
                    .with_retry_after(retry_after)
            }
            other => AppError::new(other.kind(), other.public_message()),
        }
    }
}

impl IntoResponse for MediaError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}

impl From<AppError> for MediaError {
    fn from(err: AppError) -> Self {
        MediaError::Rejected(err)
    }
}

impl From<axum::extract::rejection::JsonRejection> for MediaError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        MediaError::Rejected(rejection.into())
    }
}

impl From<axum::extract::multipart::MultipartRejection> for MediaError {
    fn from(rejection: axum::extract::multipart::MultipartRejection) -> Self {
        MediaError::Rejected(rejection.into())
    }
}

impl From<axum::extract::multipart::MultipartError> for MediaError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        MediaError::Rejected(err.into())
    }
}

impl From<platform::encoding::DataUrlError> for MediaError {
    fn from(err: platform::encoding::DataUrlError) -> Self {
        MediaError::InvalidPayload(format!("Invalid base64 image data: {err}"))
    }
}
