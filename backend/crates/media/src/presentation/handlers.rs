//! HTTP Handlers

use crate::application::config::MediaConfig;
use crate::application::erase_object::{EraseObjectInput, EraseObjectUseCase};
use crate::application::remove_background::{RemoveBackgroundInput, RemoveBackgroundUseCase};
use crate::application::video_download::{VideoDownloadInput, VideoDownloadUseCase};
use crate::application::video_info::VideoInfoUseCase;
use crate::domain::engines::{BackgroundRemover, VideoExtractor};
use crate::domain::value_objects::{EraseParams, Quality};
use crate::error::{MediaError, MediaResult};
use crate::infra::artifact_store::ArtifactStore;
use crate::infra::reaper::Reaper;
use crate::presentation::dto::{
    DownloadRequest, EraseRequest, EraseResponse, HealthResponse, RemoveBgResponse, RootResponse,
    VideoInfoRequest, VideoInfoResponse,
};
use axum::Json;
use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, HeaderValue, Request, header};
use axum::response::{IntoResponse, Response};
use platform::rate_limit::AdmissionController;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared state for media handlers
#[derive(Clone)]
pub struct MediaAppState<E>
where
    E: BackgroundRemover + VideoExtractor + Clone + Send + Sync + 'static,
{
    pub engines: Arc<E>,
    pub admission: Arc<AdmissionController>,
    pub store: Arc<ArtifactStore>,
    pub reaper: Arc<Reaper>,
    pub config: Arc<MediaConfig>,
}

/// Base URL for artifact links: configured, else taken from the request
fn base_url(config: &MediaConfig, headers: &HeaderMap) -> String {
    if let Some(base) = &config.public_base_url {
        return base.clone();
    }

    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let scheme = if config.trust_forwarded_for {
        header_str("x-forwarded-proto")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| matches!(*v, "http" | "https"))
            .unwrap_or("http")
    } else {
        "http"
    };
    let host = header_str(header::HOST.as_str()).unwrap_or("localhost");
    format!("{scheme}://{host}")
}

/// GET /
pub async fn root<E>(State(state): State<MediaAppState<E>>) -> Json<RootResponse>
where
    E: BackgroundRemover + VideoExtractor + Clone + Send + Sync + 'static,
{
    Json(RootResponse {
        status: format!("Azura Engine v{VERSION} Ready"),
        model: state.config.rembg_model.clone(),
        version: VERSION.to_string(),
    })
}

/// GET /health
pub async fn health<E>(State(state): State<MediaAppState<E>>) -> Json<HealthResponse>
where
    E: BackgroundRemover + VideoExtractor + Clone + Send + Sync + 'static,
{
    Json(HealthResponse {
        status: "healthy",
        version: VERSION.to_string(),
        model_ready: state.engines.is_ready(),
        tracked_clients: state.admission.len(),
    })
}

/// POST /api/remove-bg
pub async fn remove_bg<E>(
    State(state): State<MediaAppState<E>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> MediaResult<Json<RemoveBgResponse>>
where
    E: BackgroundRemover + VideoExtractor + Clone + Send + Sync + 'static,
{
    let mut multipart = multipart?;
    let mut file = None;
    let mut quality = Quality::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => file = Some(field.bytes().await?.to_vec()),
            Some("quality") => quality = Quality::parse(&field.text().await?),
            _ => {}
        }
    }
    let bytes = file.ok_or_else(|| MediaError::InvalidPayload("Missing file field".to_string()))?;

    let use_case = RemoveBackgroundUseCase::new(
        state.engines.clone(),
        state.store.clone(),
        state.config.clone(),
    );
    let output = use_case
        .execute(RemoveBackgroundInput { bytes, quality })
        .await?;
    state.reaper.nudge();

    Ok(Json(RemoveBgResponse {
        url: output.artifact.url(&base_url(&state.config, &headers)),
        filename: output.artifact.file_name,
        quality: output.quality.to_string(),
    }))
}

/// POST /api/erase-object
pub async fn erase_object<E>(
    State(state): State<MediaAppState<E>>,
    headers: HeaderMap,
    body: Result<Json<EraseRequest>, JsonRejection>,
) -> MediaResult<Json<EraseResponse>>
where
    E: BackgroundRemover + VideoExtractor + Clone + Send + Sync + 'static,
{
    let Json(req) = body?;

    let use_case = EraseObjectUseCase::new(state.store.clone(), state.config.clone());
    let artifact = use_case
        .execute(EraseObjectInput {
            image: req.image,
            mask: req.mask,
            params: EraseParams::new(req.strength, req.detail),
            quality: Quality::parse(&req.quality),
        })
        .await?;
    state.reaper.nudge();

    Ok(Json(EraseResponse {
        url: artifact.url(&base_url(&state.config, &headers)),
    }))
}

/// POST /api/video-info
pub async fn video_info<E>(
    State(state): State<MediaAppState<E>>,
    body: Result<Json<VideoInfoRequest>, JsonRejection>,
) -> MediaResult<Json<VideoInfoResponse>>
where
    E: BackgroundRemover + VideoExtractor + Clone + Send + Sync + 'static,
{
    let Json(req) = body?;

    let use_case = VideoInfoUseCase::new(state.engines.clone(), state.config.clone());
    let summary = use_case.execute(&req.url).await?;
    state.reaper.nudge();

    Ok(Json(summary.into()))
}

/// POST /api/video-download
///
/// Streams the downloaded file as an attachment.
pub async fn video_download<E>(
    State(state): State<MediaAppState<E>>,
    body: Result<Json<DownloadRequest>, JsonRejection>,
) -> MediaResult<Response>
where
    E: BackgroundRemover + VideoExtractor + Clone + Send + Sync + 'static,
{
    let Json(req) = body?;

    let use_case = VideoDownloadUseCase::new(
        state.engines.clone(),
        state.store.clone(),
        state.config.clone(),
    );
    let file = use_case
        .execute(VideoDownloadInput {
            url: req.url,
            format_id: req.format_id,
        })
        .await?;
    state.reaper.nudge();

    let response = match ServeFile::new(&file.path)
        .oneshot(Request::new(Body::empty()))
        .await
    {
        Ok(response) => response,
        Err(never) => match never {},
    };
    let mut response = response.map(Body::new).into_response();

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    // File names are `dl_{hex}.{ext}`, always a valid header value
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}
