//! HTTP client for a running doc2txt backend.

use crate::client::Extractor;
use crate::config::ClientConfig;
use crate::error::Doc2TxtError;
use crate::types::{ErrorBody, Extraction, HealthStatus, UploadRequest};
use reqwest::Response;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Talks to `POST /extract` and `GET /health` on a backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: ClientConfig) -> Result<Self, Doc2TxtError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Doc2TxtError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.backend_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one upload and wait for the extracted text.
    ///
    /// Error bodies from the backend are mapped back onto the matching
    /// [`Doc2TxtError`] variant; transport failures become
    /// [`Doc2TxtError::BackendUnreachable`].
    pub async fn extract_text(&self, request: &UploadRequest) -> Result<Extraction, Doc2TxtError> {
        let url = format!("{}/extract", self.base_url);
        debug!("POST {} ({} base64 chars)", url, request.file_content.len());

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        response
            .json::<Extraction>()
            .await
            .map_err(|e| Doc2TxtError::Internal(format!("unreadable extraction response: {e}")))
    }

    /// Fetch the backend's health report.
    pub async fn health(&self) -> Result<HealthStatus, Doc2TxtError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        response
            .json::<HealthStatus>()
            .await
            .map_err(|e| Doc2TxtError::Internal(format!("unreadable health response: {e}")))
    }

    fn unreachable(&self, e: reqwest::Error) -> Doc2TxtError {
        warn!("Backend request to {} failed: {}", self.base_url, e);
        Doc2TxtError::BackendUnreachable {
            url: self.base_url.clone(),
            reason: if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            },
        }
    }
}

impl Extractor for BackendClient {
    fn extract(
        &self,
        request: &UploadRequest,
    ) -> impl Future<Output = Result<Extraction, Doc2TxtError>> + Send {
        self.extract_text(request)
    }
}

/// Rebuild the backend's error from a non-success response.
///
/// Bodies that are not the structured `{error, message}` shape (a proxy's
/// HTML page, axum's own body-limit text) fall back to `Internal` with the
/// status code.
async fn error_from_response(response: Response) -> Doc2TxtError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody { error, message }) => Doc2TxtError::from_wire(&error, message),
        Err(_) => {
            let body = body.trim();
            Doc2TxtError::Internal(if body.is_empty() {
                format!("backend answered HTTP {status}")
            } else {
                format!("backend answered HTTP {status}: {body}")
            })
        }
    }
}
