//! Payload decoding: base64 text → raw file bytes.
//!
//! Browsers hand uploads to JavaScript either as raw base64 or as a
//! `data:<mime>;base64,<payload>` URI (`FileReader.readAsDataURL`). Both are
//! accepted; anything else that is not strict standard-alphabet base64 is
//! rejected before an engine ever sees it.

use crate::error::Doc2TxtError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Decode an uploaded payload.
///
/// Leading/trailing whitespace and line breaks inside the payload are
/// ignored (MIME-style wrapped base64 is common). An optional data-URI
/// prefix is stripped.
///
/// # Errors
/// - [`Doc2TxtError::Decode`] when the payload is not valid base64
/// - [`Doc2TxtError::EmptyPayload`] when it decodes to zero bytes
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, Doc2TxtError> {
    let body = strip_data_uri(payload.trim());

    let compact: String = if body.contains(['\n', '\r', ' ', '\t']) {
        body.chars().filter(|c| !c.is_ascii_whitespace()).collect()
    } else {
        body.to_string()
    };

    let bytes = STANDARD.decode(compact.as_bytes()).map_err(|e| Doc2TxtError::Decode {
        reason: e.to_string(),
    })?;

    if bytes.is_empty() {
        return Err(Doc2TxtError::EmptyPayload);
    }

    debug!("Decoded payload: {} base64 chars → {} bytes", compact.len(), bytes.len());
    Ok(bytes)
}

/// Encode file bytes for an [`crate::UploadRequest`].
pub fn encode_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

fn strip_data_uri(payload: &str) -> &str {
    if !payload.starts_with("data:") {
        return payload;
    }
    match payload.find(";base64,") {
        Some(idx) => &payload[idx + ";base64,".len()..],
        None => payload,
    }
}
