//! Tika engine: forward raw document bytes to a Tika server over HTTP.
//!
//! Extraction uses the recursive-metadata endpoint, `PUT /rmeta/text`, which
//! answers with a JSON array holding one object per (embedded) document.
//! The first object is the container document: its `X-TIKA:content` key is
//! the extracted plain text and every other key is metadata. Tika sniffs the
//! content type itself; the original file name, when known, is passed as a
//! `Content-Disposition` hint to help detection.
//!
//! ## Status mapping
//!
//! | Tika answer | Result |
//! |---|---|
//! | 200 | text + metadata |
//! | 415 Unsupported Media Type | [`Doc2TxtError::UnsupportedFormat`] |
//! | 422 Unprocessable Entity (parse exception, encrypted file) | [`Doc2TxtError::UnsupportedFormat`] |
//! | any other status, connect error | [`Doc2TxtError::EngineUnavailable`] |
//! | no answer within the timeout | [`Doc2TxtError::EngineTimeout`] |

use crate::error::Doc2TxtError;
use crate::types::{EngineKind, Metadata};
use reqwest::header::{ACCEPT, CONTENT_DISPOSITION};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

const CONTENT_KEY: &str = "X-TIKA:content";

/// Longest Tika error body echoed back to the caller.
const MAX_DETAIL_CHARS: usize = 300;

/// Client for one Tika server.
#[derive(Debug, Clone)]
pub struct TikaClient {
    http: reqwest::Client,
    endpoint: String,
    timeout_secs: u64,
    health_timeout: Duration,
}

/// Outcome of a status ping against Tika.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TikaStatus {
    pub up: bool,
    /// `available`, `error (<status>)` or `error (connection error: …)`.
    pub detail: String,
}

impl TikaClient {
    /// Build a client for the Tika server at `endpoint`.
    pub fn new(
        endpoint: impl Into<String>,
        timeout_secs: u64,
        health_timeout_secs: u64,
    ) -> Result<Self, Doc2TxtError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Doc2TxtError::Internal(format!("failed to build HTTP client: {e}")))?;
        let endpoint: String = endpoint.into();
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout_secs,
            health_timeout: Duration::from_secs(health_timeout_secs),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Extract text and metadata from `bytes`.
    pub async fn extract(
        &self,
        bytes: Vec<u8>,
        filename: Option<&str>,
    ) -> Result<(String, Metadata), Doc2TxtError> {
        let url = format!("{}/rmeta/text", self.endpoint);
        info!("Sending {} bytes to Tika at {}", bytes.len(), url);

        let mut request = self
            .http
            .put(&url)
            .header(ACCEPT, "application/json")
            .body(bytes);
        if let Some(name) = filename.and_then(disposition_filename) {
            request = request.header(CONTENT_DISPOSITION, format!("attachment; filename=\"{name}\""));
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let documents: Vec<Metadata> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.timeout_error()
            } else {
                Doc2TxtError::EngineUnavailable {
                    engine: EngineKind::Tika.to_string(),
                    reason: format!("unreadable /rmeta response: {e}"),
                }
            }
        })?;

        let (text, metadata) = split_container(documents);
        debug!(
            "Tika returned {} chars of text and {} metadata keys",
            text.len(),
            metadata.len()
        );
        Ok((text, metadata))
    }

    /// Ping `GET /tika`. Never fails: problems are reported in the status.
    pub async fn ping(&self) -> TikaStatus {
        let url = format!("{}/tika", self.endpoint);
        match self.http.get(&url).timeout(self.health_timeout).send().await {
            Ok(resp) if resp.status() == StatusCode::OK => TikaStatus {
                up: true,
                detail: "available".into(),
            },
            Ok(resp) => TikaStatus {
                up: false,
                detail: format!("error ({})", resp.status().as_u16()),
            },
            Err(e) => {
                debug!("Tika ping failed: {}", e);
                TikaStatus {
                    up: false,
                    detail: format!("error (connection error: {e})"),
                }
            }
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> Doc2TxtError {
        if e.is_timeout() {
            warn!("Tika timed out after {}s", self.timeout_secs);
            self.timeout_error()
        } else {
            warn!("Tika connection error: {}", e);
            Doc2TxtError::EngineUnavailable {
                engine: EngineKind::Tika.to_string(),
                reason: format!("connection error: {e}"),
            }
        }
    }

    fn timeout_error(&self) -> Doc2TxtError {
        Doc2TxtError::EngineTimeout {
            engine: EngineKind::Tika.to_string(),
            secs: self.timeout_secs,
        }
    }
}

/// Map a non-success Tika status onto the error taxonomy.
fn status_error(status: StatusCode, body: &str) -> Doc2TxtError {
    let detail = summarise_body(body);
    match status {
        StatusCode::UNSUPPORTED_MEDIA_TYPE | StatusCode::UNPROCESSABLE_ENTITY => {
            warn!("Tika rejected the document: HTTP {}", status);
            Doc2TxtError::UnsupportedFormat {
                engine: EngineKind::Tika.to_string(),
                detail: if detail.is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {detail}")
                },
            }
        }
        _ => {
            warn!("Tika answered HTTP {}", status);
            Doc2TxtError::EngineUnavailable {
                engine: EngineKind::Tika.to_string(),
                reason: if detail.is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {detail}")
                },
            }
        }
    }
}

/// First line of an error body, capped in length. Tika error bodies are
/// often full Java stack traces.
fn summarise_body(body: &str) -> String {
    let first = body.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    if first.chars().count() > MAX_DETAIL_CHARS {
        let cut: String = first.chars().take(MAX_DETAIL_CHARS).collect();
        format!("{cut}\u{2026}")
    } else {
        first.to_string()
    }
}

/// Pull the container document's text out of an `/rmeta` response.
///
/// A missing or null content key means Tika found no text layer; that is
/// an empty result, not an error.
fn split_container(documents: Vec<Metadata>) -> (String, Metadata) {
    let Some(mut container) = documents.into_iter().next() else {
        return (String::new(), Metadata::new());
    };
    let text = match container.remove(CONTENT_KEY) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };
    (text, container)
}

/// Sanitise a file name for a quoted `Content-Disposition` parameter.
fn disposition_filename(name: &str) -> Option<String> {
    let base = name.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(name);
    let clean: String = base
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control() && *c != '"')
        .collect();
    let clean = clean.trim().to_string();
    (!clean.is_empty()).then_some(clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TikaClient {
        TikaClient::new(server.uri(), 5, 1).unwrap()
    }

    #[tokio::test]
    async fn extract_reads_container_content() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/rmeta/text"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "Content-Type": "application/pdf",
                    "xmpTPg:NPages": "1",
                    "X-TIKA:content": "\nHello World\n"
                },
                { "X-TIKA:content": "embedded attachment" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let (text, meta) = client(&server)
            .extract(b"%PDF-1.4".to_vec(), Some("hello.pdf"))
            .await
            .unwrap();
        assert_eq!(text, "\nHello World\n");
        assert_eq!(meta["Content-Type"], "application/pdf");
        assert!(!meta.contains_key(CONTENT_KEY));
    }

    #[tokio::test]
    async fn extract_sends_filename_hint() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/rmeta/text"))
            .and(header("content-disposition", "attachment; filename=\"report.docx\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "X-TIKA:content": "ok" }])))
            .expect(1)
            .mount(&server)
            .await;

        let (text, _) = client(&server)
            .extract(b"PK\x03\x04".to_vec(), Some("C:\\Users\\me\\report.docx"))
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn missing_content_is_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "Content-Type": "image/png" }])))
            .mount(&server)
            .await;

        let (text, meta) = client(&server).extract(vec![0x89, 0x50], None).await.unwrap();
        assert!(text.is_empty());
        assert_eq!(meta["Content-Type"], "image/png");
    }

    #[tokio::test]
    async fn unprocessable_maps_to_unsupported_format() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_string("org.apache.tika.exception.EncryptedDocumentException\n\tat ..."),
            )
            .mount(&server)
            .await;

        let err = client(&server).extract(vec![1, 2, 3], None).await.unwrap_err();
        match err {
            Doc2TxtError::UnsupportedFormat { engine, detail } => {
                assert_eq!(engine, "tika");
                assert!(detail.contains("EncryptedDocumentException"), "got: {detail}");
                assert!(!detail.contains("at ..."), "got: {detail}");
            }
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unsupported_media_type_maps_to_unsupported_format() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(415))
            .mount(&server)
            .await;

        let err = client(&server).extract(vec![1], None).await.unwrap_err();
        assert_eq!(err.kind(), "unsupported_format");
    }

    #[tokio::test]
    async fn server_error_maps_to_engine_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client(&server).extract(vec![1], None).await.unwrap_err();
        assert!(matches!(err, Doc2TxtError::EngineUnavailable { .. }), "got: {err:?}");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn slow_tika_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "X-TIKA:content": "late" }]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let tika = TikaClient::new(server.uri(), 1, 1).unwrap();
        let err = tika.extract(vec![1], None).await.unwrap_err();
        assert!(
            matches!(err, Doc2TxtError::EngineTimeout { secs: 1, .. }),
            "got: {err:?}"
        );
    }

    #[tokio::test]
    async fn unreachable_tika_is_engine_unavailable() {
        let tika = TikaClient::new("http://127.0.0.1:1", 2, 1).unwrap();
        let err = tika.extract(vec![1], None).await.unwrap_err();
        assert_eq!(err.kind(), "engine_unavailable");
    }

    #[tokio::test]
    async fn ping_reports_available() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tika"))
            .respond_with(ResponseTemplate::new(200).set_body_string("This is Tika Server."))
            .mount(&server)
            .await;

        let status = client(&server).ping().await;
        assert!(status.up);
        assert_eq!(status.detail, "available");
    }

    #[tokio::test]
    async fn ping_reports_status_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tika"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let status = client(&server).ping().await;
        assert!(!status.up);
        assert_eq!(status.detail, "error (503)");
    }

    #[tokio::test]
    async fn ping_unreachable_does_not_fail() {
        let status = TikaClient::new("http://127.0.0.1:1", 2, 1).unwrap().ping().await;
        assert!(!status.up);
        assert!(status.detail.starts_with("error (connection error"), "got: {}", status.detail);
    }

    #[test]
    fn summarise_body_caps_length() {
        let long = "x".repeat(1000);
        let s = summarise_body(&long);
        assert_eq!(s.chars().count(), MAX_DETAIL_CHARS + 1);
        assert_eq!(summarise_body("\n\n  first\nsecond"), "first");
    }

    #[test]
    fn disposition_filename_sanitises() {
        assert_eq!(disposition_filename("a/b/\"q\".pdf").as_deref(), Some("q.pdf"));
        assert_eq!(disposition_filename("   "), None);
    }
}
