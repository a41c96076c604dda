//! Error types for the doc2txt library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Doc2TxtError`]: an extraction could not produce text (bad payload,
//!   engine down, format rejected). Returned from [`crate::Backend`] and from
//!   [`crate::client::BackendClient`], and mapped onto HTTP responses by the
//!   server.
//!
//! * [`SessionError`]: the caller drove an [`crate::client::UploadSession`]
//!   through a transition its current state does not allow. These never
//!   reach the backend and never change session state.

use crate::client::UploadStatus;
use thiserror::Error;

/// All extraction errors returned by the doc2txt library.
#[derive(Debug, Error)]
pub enum Doc2TxtError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The payload is not valid base64.
    #[error("Failed to decode base64 payload: {reason}")]
    Decode { reason: String },

    /// The payload decoded cleanly but contains no bytes.
    #[error("Failed to decode base64 payload: the file is empty")]
    EmptyPayload,

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The engine could not be reached or answered with a server error.
    #[error("Extraction engine '{engine}' is unavailable: {reason}")]
    EngineUnavailable { engine: String, reason: String },

    /// The engine did not answer within the configured timeout.
    #[error("Extraction engine '{engine}' timed out after {secs}s")]
    EngineTimeout { engine: String, secs: u64 },

    /// The engine understood the request but cannot parse this content.
    #[error("Format not supported by '{engine}': {detail}")]
    UnsupportedFormat { engine: String, detail: String },

    // ── Client errors ─────────────────────────────────────────────────────
    /// The backend service itself could not be reached.
    #[error("Failed to reach backend at '{url}': {reason}\nCheck that `doc2txt serve` is running.")]
    BackendUnreachable { url: String, reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Doc2TxtError {
    /// Stable machine-readable tag used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Doc2TxtError::Decode { .. } | Doc2TxtError::EmptyPayload => "decode_error",
            Doc2TxtError::EngineUnavailable { .. } | Doc2TxtError::EngineTimeout { .. } => {
                "engine_unavailable"
            }
            Doc2TxtError::UnsupportedFormat { .. } => "unsupported_format",
            Doc2TxtError::BackendUnreachable { .. } => "backend_unreachable",
            Doc2TxtError::InvalidConfig(_) => "invalid_config",
            Doc2TxtError::Internal(_) => "internal",
        }
    }

    /// Whether retrying the same request later could succeed.
    ///
    /// Input and format errors are permanent; engine and network errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Doc2TxtError::EngineUnavailable { .. }
                | Doc2TxtError::EngineTimeout { .. }
                | Doc2TxtError::BackendUnreachable { .. }
        )
    }

    /// Rebuild an error from the `{error, message}` body the server emits.
    ///
    /// Used by the HTTP client so callers can match on the same variants
    /// whether they run the backend in-process or over the network.
    pub fn from_wire(kind: &str, message: String) -> Self {
        match kind {
            "decode_error" => Doc2TxtError::Decode { reason: message },
            "engine_unavailable" => Doc2TxtError::EngineUnavailable {
                engine: "backend".into(),
                reason: message,
            },
            "unsupported_format" => Doc2TxtError::UnsupportedFormat {
                engine: "backend".into(),
                detail: message,
            },
            "invalid_config" => Doc2TxtError::InvalidConfig(message),
            _ => Doc2TxtError::Internal(message),
        }
    }
}

/// A transition the session's current state does not permit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} while {from:?}")]
    InvalidTransition {
        from: UploadStatus,
        action: &'static str,
    },
}
