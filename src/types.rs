//! Wire and result types shared by the backend, the server and the client.

use crate::error::Doc2TxtError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Free-form document metadata as reported by the engine.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Which engine extracts the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// The external Tika server. (default)
    #[default]
    Tika,
    /// The in-process Markdown engine.
    #[serde(rename = "markitdown")]
    MarkItDown,
}

impl EngineKind {
    pub fn from_flag(use_markitdown: bool) -> Self {
        if use_markitdown {
            EngineKind::MarkItDown
        } else {
            EngineKind::Tika
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Tika => "tika",
            EngineKind::MarkItDown => "markitdown",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /extract`.
///
/// Accepts both snake_case and the camelCase names browser clients tend
/// to send, plus the short `file` name older clients use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Base64-encoded file content.
    #[serde(alias = "file", alias = "fileContent")]
    pub file_content: String,

    /// Route the payload to the Markdown engine instead of Tika.
    #[serde(default, alias = "useMarkItDown")]
    pub use_markitdown: bool,

    /// Original file name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl UploadRequest {
    pub fn new(file_content: impl Into<String>, engine: EngineKind) -> Self {
        Self {
            file_content: file_content.into(),
            use_markitdown: engine == EngineKind::MarkItDown,
            filename: None,
        }
    }

    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        self.filename = Some(name.into());
        self
    }

    pub fn engine(&self) -> EngineKind {
        EngineKind::from_flag(self.use_markitdown)
    }
}

/// Successful response of `POST /extract`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// Extracted plain text. May be empty when the document has no text layer.
    pub text: String,

    /// Engine-reported metadata.
    #[serde(default)]
    pub metadata: Metadata,

    /// Echo of the request's file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Which engine produced `text`.
    pub parser_used: EngineKind,
}

/// Error body emitted by the server for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable tag, see [`Doc2TxtError::kind`].
    pub error: String,
    /// Human-readable message suitable for display.
    pub message: String,
}

impl From<&Doc2TxtError> for ErrorBody {
    fn from(e: &Doc2TxtError) -> Self {
        Self {
            error: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

/// Outcome of one extraction as the client stores it.
///
/// Exactly one of text or message is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessingResult {
    Extracted {
        #[serde(rename = "extractedText")]
        text: String,
    },
    Failed {
        #[serde(rename = "errorMessage")]
        message: String,
    },
}

impl ProcessingResult {
    pub fn text(&self) -> Option<&str> {
        match self {
            ProcessingResult::Extracted { text } => Some(text),
            ProcessingResult::Failed { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ProcessingResult::Extracted { .. } => None,
            ProcessingResult::Failed { message } => Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingResult::Extracted { .. })
    }
}

impl From<Result<Extraction, Doc2TxtError>> for ProcessingResult {
    fn from(result: Result<Extraction, Doc2TxtError>) -> Self {
        match result {
            Ok(extraction) => ProcessingResult::Extracted {
                text: extraction.text,
            },
            Err(e) => ProcessingResult::Failed {
                message: e.to_string(),
            },
        }
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    /// Always true: the process answering is itself up.
    pub backend_up: bool,
    /// True only when Tika answered its status endpoint with 200.
    pub tika_up: bool,
    /// `available`, `error (<status>)` or `error (connection error: …)`.
    pub tika_server: String,
    pub markitdown: String,
}

/// Response of `GET /test`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub status: String,
    pub message: String,
    pub service: String,
    pub tika_server: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_request_accepts_camel_case() {
        let req: UploadRequest = serde_json::from_str(
            r#"{"fileContent":"aGk=","useMarkItDown":true}"#,
        )
        .unwrap();
        assert_eq!(req.file_content, "aGk=");
        assert_eq!(req.engine(), EngineKind::MarkItDown);
        assert!(req.filename.is_none());
    }

    #[test]
    fn upload_request_accepts_legacy_field_names() {
        let req: UploadRequest = serde_json::from_str(
            r#"{"filename":"a.pdf","file":"aGk=","use_markitdown":false}"#,
        )
        .unwrap();
        assert_eq!(req.file_content, "aGk=");
        assert_eq!(req.engine(), EngineKind::Tika);
        assert_eq!(req.filename.as_deref(), Some("a.pdf"));
    }

    #[test]
    fn engine_flag_defaults_to_tika() {
        let req: UploadRequest = serde_json::from_str(r#"{"file_content":"aGk="}"#).unwrap();
        assert_eq!(req.engine(), EngineKind::Tika);
    }

    #[test]
    fn engine_kind_serialises_lowercase() {
        assert_eq!(
            serde_json::to_string(&EngineKind::MarkItDown).unwrap(),
            r#""markitdown""#
        );
        assert_eq!(serde_json::to_string(&EngineKind::Tika).unwrap(), r#""tika""#);
    }

    #[test]
    fn processing_result_has_exactly_one_side() {
        let ok: ProcessingResult = Ok(Extraction {
            text: "hello".into(),
            metadata: Metadata::new(),
            filename: None,
            parser_used: EngineKind::Tika,
        })
        .into();
        assert_eq!(ok.text(), Some("hello"));
        assert_eq!(ok.error_message(), None);

        let failed: ProcessingResult = Err(Doc2TxtError::EmptyPayload).into();
        assert!(!failed.is_success());
        assert!(failed.error_message().unwrap().contains("empty"));
        assert_eq!(failed.text(), None);
    }

    #[test]
    fn processing_result_wire_names() {
        let json = serde_json::to_value(ProcessingResult::Failed {
            message: "nope".into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "errorMessage": "nope" }));
    }
}
