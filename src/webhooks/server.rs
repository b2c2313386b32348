//! HTTPS admission endpoint.
//!
//! One route per validated kind plus a plaintext health route. Request
//! validation is tiered: a wrong content type, an unreadable body, and an
//! empty body are plain 400s; an envelope that does not decode as an
//! AdmissionReview is a plain 500. Everything past the envelope is answered
//! with a 200 carrying an allow or deny verdict, so a broken resource can
//! never fail open.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use kube::core::admission::{AdmissionRequest, AdmissionReview};
use kube::core::DynamicObject;
use rustls::ServerConfig;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::inspect::SecretInspector;
use crate::tls::CertificateStore;

use super::policies;

/// Fixed listen port for the admission endpoint
pub const WEBHOOK_PORT: u16 = 8443;

/// Shared state handed to every admission handler
#[derive(Clone)]
pub struct WebhookState {
    pub settings: Settings,
    pub inspector: Arc<dyn SecretInspector>,
}

/// Build the admission router
pub fn create_router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/pods/check", post(check_pod))
        .route("/deployments/check", post(check_deployment))
        .route("/configmaps/check", post(check_configmap))
        .with_state(state)
}

/// Serve the router over TLS, resolving certificates from the store on
/// every handshake so rotations apply without a restart.
pub async fn run_webhook_server(
    state: WebhookState,
    store: Arc<CertificateStore>,
    handle: Handle,
) -> Result<()> {
    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_cert_resolver(store);
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], WEBHOOK_PORT));
    info!(%addr, "admission webhook listening");

    axum_server::bind_rustls(addr, RustlsConfig::from_config(Arc::new(config)))
        .handle(handle)
        .serve(create_router(state).into_make_service())
        .await
        .map_err(|e| Error::Server(e.to_string()))
}

async fn health() -> &'static str {
    "healthy"
}

async fn check_pod(State(state): State<WebhookState>, headers: HeaderMap, body: Bytes) -> Response {
    let request = match validate_request(&headers, &body) {
        Ok(request) => request,
        Err(rejection) => return rejection.into_response(),
    };
    debug!(uid = %request.uid, "checking pod admission request");
    admission_reply(policies::pod::check(&request, &state.settings))
}

async fn check_deployment(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match validate_request(&headers, &body) {
        Ok(request) => request,
        Err(rejection) => return rejection.into_response(),
    };
    debug!(uid = %request.uid, "checking deployment admission request");
    admission_reply(policies::deployment::check(&request, &state.settings))
}

async fn check_configmap(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match validate_request(&headers, &body) {
        Ok(request) => request,
        Err(rejection) => return rejection.into_response(),
    };
    debug!(uid = %request.uid, "checking configmap admission request");
    admission_reply(policies::configmap::check(&request, state.inspector.as_ref()).await)
}

/// Validate the transport tier of an admission call.
///
/// Failures here are plain HTTP errors, not admission verdicts, because
/// there is no usable request UID to answer with.
fn validate_request(
    headers: &HeaderMap,
    body: &Bytes,
) -> std::result::Result<AdmissionRequest<DynamicObject>, (StatusCode, String)> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type != "application/json" {
        warn!(content_type, "rejecting request with unsupported content type");
        return Err((
            StatusCode::BAD_REQUEST,
            format!("expected content type application/json, got {content_type}"),
        ));
    }

    if body.is_empty() {
        warn!("rejecting request with empty body");
        return Err((StatusCode::BAD_REQUEST, "request body is empty".to_string()));
    }

    let review: AdmissionReview<DynamicObject> = serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "could not decode admission review envelope");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("could not decode admission review: {e}"),
        )
    })?;

    review.try_into().map_err(|e| {
        warn!(error = %e, "admission review carries no request");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("invalid admission review: {e}"),
        )
    })
}

/// Wrap a verdict back into the review envelope the API server expects
fn admission_reply(response: kube::core::admission::AdmissionResponse) -> Response {
    (StatusCode::OK, Json(response.into_review())).into_response()
}
