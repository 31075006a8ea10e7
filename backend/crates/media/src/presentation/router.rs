//! Media Router

use crate::domain::engines::{BackgroundRemover, VideoExtractor};
use crate::presentation::handlers::{self, MediaAppState};
use crate::presentation::middleware::{AdmissionMiddlewareState, require_admission};
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::services::ServeDir;

/// Create the media router for any engine implementation
///
/// `/api/*` routes go through the admission controller; `/`, `/health` and
/// the static `/outputs` tree do not.
pub fn media_router<E>(state: MediaAppState<E>) -> Router
where
    E: BackgroundRemover + VideoExtractor + Clone + Send + Sync + 'static,
{
    let admission_state = AdmissionMiddlewareState {
        admission: state.admission.clone(),
        trust_forwarded_for: state.config.trust_forwarded_for,
    };

    let api = Router::new()
        .route("/remove-bg", post(handlers::remove_bg::<E>))
        .route("/erase-object", post(handlers::erase_object::<E>))
        .route("/video-info", post(handlers::video_info::<E>))
        .route("/video-download", post(handlers::video_download::<E>))
        .route_layer(middleware::from_fn(move |req: Request<Body>, next: Next| {
            require_admission(admission_state.clone(), req, next)
        }))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    let outputs = ServeDir::new(state.store.output_dir());

    Router::new()
        .route("/", get(handlers::root::<E>))
        .route("/health", get(handlers::health::<E>))
        .nest("/api", api)
        .nest_service("/outputs", outputs)
        .with_state(state)
}
