//! The parsing backend: one request in, extracted text out.
//!
//! [`Backend`] owns the engine clients and the configuration it was built
//! with. It holds no per-request state, so a single instance behind an
//! `Arc` serves any number of concurrent requests.

use crate::config::BackendConfig;
use crate::error::Doc2TxtError;
use crate::pipeline::tika::TikaClient;
use crate::pipeline::{decode, markdown, postprocess};
use crate::types::{EngineKind, Extraction, HealthStatus, ServiceInfo, UploadRequest};
use std::time::Instant;
use tracing::{info, warn};

/// Name the backend reports in health and info responses.
pub const SERVICE_NAME: &str = "doc2txt-backend";

/// Dispatches decoded uploads to the selected engine.
#[derive(Debug, Clone)]
pub struct Backend {
    config: BackendConfig,
    tika: TikaClient,
}

impl Backend {
    /// Build a backend from an explicit configuration.
    pub fn new(config: BackendConfig) -> Result<Self, Doc2TxtError> {
        let tika = TikaClient::new(
            config.tika_endpoint.clone(),
            config.tika_timeout_secs,
            config.health_timeout_secs,
        )?;
        info!("Using Tika server at: {}", config.tika_endpoint);
        if let Some(ref path) = config.tika_path {
            warn!(
                "TIKA_PATH is set to {} but is not used; extraction goes through {}",
                path.display(),
                config.tika_endpoint
            );
        }
        Ok(Self { config, tika })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Decode the payload and extract its text with the selected engine.
    ///
    /// # Errors
    /// - [`Doc2TxtError::Decode`] / [`Doc2TxtError::EmptyPayload`] for bad
    ///   payloads; no engine is contacted in that case
    /// - [`Doc2TxtError::EngineUnavailable`] / [`Doc2TxtError::EngineTimeout`]
    ///   when Tika cannot be reached or fails
    /// - [`Doc2TxtError::UnsupportedFormat`] when the engine rejects the content
    pub async fn extract_text(&self, request: &UploadRequest) -> Result<Extraction, Doc2TxtError> {
        let start = Instant::now();
        let engine = request.engine();
        let filename = request.filename.as_deref();

        // ── Step 1: Decode ───────────────────────────────────────────────
        let bytes = decode::decode_payload(&request.file_content)?;
        info!(
            "Extracting {} ({} bytes) with {}",
            filename.unwrap_or("<unnamed>"),
            bytes.len(),
            engine
        );

        // ── Step 2: Dispatch ─────────────────────────────────────────────
        let (raw, metadata) = match engine {
            EngineKind::Tika => self.tika.extract(bytes, filename).await?,
            EngineKind::MarkItDown => markdown::extract(&bytes, filename)?,
        };

        // ── Step 3: Clean up ─────────────────────────────────────────────
        let text = if self.config.normalize_output {
            postprocess::clean_text(&raw)
        } else {
            raw
        };

        info!(
            "Extracted {} chars with {} in {}ms",
            text.chars().count(),
            engine,
            start.elapsed().as_millis()
        );

        Ok(Extraction {
            text,
            metadata,
            filename: request.filename.clone(),
            parser_used: engine,
        })
    }

    /// Report backend and Tika availability. Never fails.
    pub async fn health(&self) -> HealthStatus {
        let tika = self.tika.ping().await;
        HealthStatus {
            status: "healthy".into(),
            service: SERVICE_NAME.into(),
            backend_up: true,
            tika_up: tika.up,
            tika_server: tika.detail,
            markitdown: "available".into(),
        }
    }

    /// Static description of this service, for smoke tests.
    pub fn info(&self) -> ServiceInfo {
        ServiceInfo {
            status: "ok".into(),
            message: "Test endpoint is working!".into(),
            service: SERVICE_NAME.into(),
            tika_server: self.tika.endpoint().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::decode::encode_payload;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(endpoint: &str) -> Backend {
        Backend::new(
            BackendConfig::builder()
                .tika_endpoint(endpoint)
                .tika_timeout_secs(5)
                .health_timeout_secs(1)
                .build()
                .unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn malformed_base64_never_reaches_tika() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{}])))
            .expect(0)
            .mount(&server)
            .await;

        let backend = backend_for(&server.uri());
        let req = UploadRequest::new("%%% not base64 %%%", EngineKind::Tika);
        let err = backend.extract_text(&req).await.unwrap_err();
        assert!(matches!(err, Doc2TxtError::Decode { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn tika_text_is_cleaned() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/rmeta/text"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "Content-Type": "application/pdf", "X-TIKA:content": "\n\n\n\nHello World   \n\n\n\n\n" }
            ])))
            .mount(&server)
            .await;

        let backend = backend_for(&server.uri());
        let req = UploadRequest::new(encode_payload(b"%PDF-1.4 fake"), EngineKind::Tika)
            .with_filename("hello.pdf");
        let out = backend.extract_text(&req).await.unwrap();
        assert_eq!(out.text, "Hello World\n");
        assert_eq!(out.parser_used, EngineKind::Tika);
        assert_eq!(out.filename.as_deref(), Some("hello.pdf"));
        assert_eq!(out.metadata["Content-Type"], "application/pdf");
    }

    #[tokio::test]
    async fn raw_output_when_normalisation_disabled() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "X-TIKA:content": "\n raw \n" }])))
            .mount(&server)
            .await;

        let backend = Backend::new(
            BackendConfig::builder()
                .tika_endpoint(server.uri())
                .normalize_output(false)
                .build()
                .unwrap(),
        )
        .unwrap();
        let req = UploadRequest::new(encode_payload(b"x"), EngineKind::Tika);
        assert_eq!(backend.extract_text(&req).await.unwrap().text, "\n raw \n");
    }

    #[tokio::test]
    async fn markdown_never_touches_tika() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let backend = backend_for(&server.uri());
        let req = UploadRequest::new(encode_payload(b"# Hello\n\nSome *text*."), EngineKind::MarkItDown)
            .with_filename("notes.md");
        let out = backend.extract_text(&req).await.unwrap();
        assert_eq!(out.text, "Hello\n\nSome text.\n");
        assert_eq!(out.parser_used, EngineKind::MarkItDown);
        assert_eq!(out.metadata["file_type"], ".md");
    }

    #[tokio::test]
    async fn markdown_engine_rejects_binary_without_crashing() {
        let backend = backend_for("http://127.0.0.1:1");
        let req = UploadRequest::new(encode_payload(&[0xFF, 0xD8, 0xFF, 0xE0]), EngineKind::MarkItDown)
            .with_filename("photo.jpg");
        let err = backend.extract_text(&req).await.unwrap_err();
        assert_eq!(err.kind(), "unsupported_format");
    }

    #[tokio::test]
    async fn tika_down_is_engine_unavailable() {
        let backend = backend_for("http://127.0.0.1:1");
        let req = UploadRequest::new(encode_payload(b"%PDF"), EngineKind::Tika);
        let err = backend.extract_text(&req).await.unwrap_err();
        assert!(err.is_retryable(), "got: {err:?}");
    }

    #[tokio::test]
    async fn health_reports_tika_down_without_failing() {
        let health = backend_for("http://127.0.0.1:1").health().await;
        assert!(health.backend_up);
        assert!(!health.tika_up);
        assert_eq!(health.service, SERVICE_NAME);
        assert_eq!(health.markitdown, "available");
    }

    #[tokio::test]
    async fn health_reports_tika_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tika"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let health = backend_for(&server.uri()).health().await;
        assert!(health.tika_up);
        assert_eq!(health.tika_server, "available");
    }

    /// Shared buffer the test subscriber writes log lines into.
    #[derive(Clone, Default)]
    struct LogBuf(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuf {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn completion_log_counts_characters_not_bytes() {
        let logs = LogBuf::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let backend = backend_for("http://127.0.0.1:1");
        // "héllo wörld\n": 12 chars, 14 bytes
        let req = UploadRequest::new(encode_payload("héllo wörld".as_bytes()), EngineKind::MarkItDown);
        let out = backend.extract_text(&req).await.unwrap();
        assert_eq!(out.text.chars().count(), 12);
        assert_eq!(out.text.len(), 14);

        let logged = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("Extracted 12 chars"), "got: {logged}");
    }

    #[test]
    fn info_names_the_endpoint() {
        let info = backend_for("http://tika:9998").info();
        assert_eq!(info.status, "ok");
        assert_eq!(info.tika_server, "http://tika:9998");
    }
}
