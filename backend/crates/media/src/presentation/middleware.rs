//! Admission Middleware

use crate::error::MediaError;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::client::{client_key, extract_client_ip};
use platform::rate_limit::AdmissionController;
use std::net::SocketAddr;
use std::sync::Arc;

/// Middleware state
#[derive(Clone)]
pub struct AdmissionMiddlewareState {
    pub admission: Arc<AdmissionController>,
    pub trust_forwarded_for: bool,
}

/// Middleware that throttles each client through the admission controller
pub async fn require_admission(
    state: AdmissionMiddlewareState,
    req: Request<Body>,
    next: Next,
) -> Response {
    let direct_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    let client_ip = extract_client_ip(req.headers(), direct_ip, state.trust_forwarded_for);
    let client = client_key(client_ip);

    let decision = state.admission.check(&client);
    if !decision.allowed {
        tracing::debug!(
            client = %client,
            rejection = ?decision.rejection,
            path = %req.uri().path(),
            "Request throttled"
        );
        return MediaError::RateLimited {
            retry_after: decision.retry_after,
        }
        .into_response();
    }

    next.run(req).await
}
