//! HTTP surface of the backend.
//!
//! | Route | Handler |
//! |---|---|
//! | `POST /extract` | [`Backend::extract_text`] |
//! | `POST /process` | same as `/extract`; the route older clients call |
//! | `GET /health` | [`Backend::health`], always 200 |
//! | `GET /test` | [`Backend::info`] |
//!
//! Failed extractions answer with `{"error": <kind>, "message": <text>}`
//! and the status from [`status_for`].

use crate::backend::Backend;
use crate::error::Doc2TxtError;
use crate::types::{ErrorBody, Extraction, HealthStatus, ServiceInfo, UploadRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<Backend>,
}

/// HTTP status for each error kind.
pub fn status_for(e: &Doc2TxtError) -> StatusCode {
    match e {
        Doc2TxtError::Decode { .. } | Doc2TxtError::EmptyPayload => StatusCode::BAD_REQUEST,
        Doc2TxtError::EngineUnavailable { .. } | Doc2TxtError::EngineTimeout { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        Doc2TxtError::UnsupportedFormat { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Doc2TxtError::BackendUnreachable { .. } => StatusCode::BAD_GATEWAY,
        Doc2TxtError::InvalidConfig(_) | Doc2TxtError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for Doc2TxtError {
    fn into_response(self) -> Response {
        match &self {
            Doc2TxtError::InvalidConfig(_) | Doc2TxtError::Internal(_) => {
                error!("Internal service error: {}", self);
            }
            Doc2TxtError::EngineUnavailable { .. }
            | Doc2TxtError::EngineTimeout { .. }
            | Doc2TxtError::BackendUnreachable { .. } => {
                warn!("Engine error: {}", self);
            }
            Doc2TxtError::Decode { .. }
            | Doc2TxtError::EmptyPayload
            | Doc2TxtError::UnsupportedFormat { .. } => {
                debug!("Client error: {}", self);
            }
        }
        (status_for(&self), Json(ErrorBody::from(&self))).into_response()
    }
}

/// Build the router around a shared backend.
pub fn build_router(backend: Arc<Backend>) -> Router {
    let body_limit = backend.config().max_request_bytes;

    // Browser clients call the backend from a different origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/extract", post(extract))
        .route("/process", post(extract))
        .route("/health", get(health))
        .route("/test", get(test_info))
        .with_state(AppState { backend })
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, backend: Arc<Backend>, shutdown: F) -> Result<(), Doc2TxtError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| Doc2TxtError::Internal(format!("listener has no address: {e}")))?;
    info!("doc2txt backend listening on http://{}", addr);

    axum::serve(listener, build_router(backend))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Doc2TxtError::Internal(format!("server error: {e}")))?;

    info!("doc2txt backend stopped");
    Ok(())
}

async fn extract(
    State(state): State<AppState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection.body_text());
            let body = ErrorBody {
                error: "invalid_request".into(),
                message: rejection.body_text(),
            };
            return (rejection.status(), Json(body)).into_response();
        }
    };

    match state.backend.extract_text(&request).await {
        Ok(extraction) => Json::<Extraction>(extraction).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.backend.health().await)
}

async fn test_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(state.backend.info())
}
