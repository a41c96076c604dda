//! The upload client: an explicit state machine over one upload at a time.
//!
//! ```text
//!            select_file          submit            ok
//!   Idle ─────────────▶ Uploading ──────▶ Processing ───▶ Done
//!    ▲                                        │ err         │
//!    │                                        ▼             │
//!    └──────────────── reset ─────────────── Error ◀────────┘
//! ```
//!
//! [`UploadSession`] owns the state, the encoded payload and the outcome.
//! Every transition takes `&mut self`, so a session can never have two
//! submissions in flight. Renderers subscribe via [`SessionObserver`].
//!
//! The session talks to a backend through the [`Extractor`] seam:
//! [`BackendClient`] over HTTP, or [`crate::Backend`] in-process.

pub mod clipboard;
pub mod http;
pub mod observer;
pub mod output;

pub use clipboard::{Clipboard, MemoryClipboard, Osc52Clipboard};
pub use http::BackendClient;
pub use observer::{NoopObserver, Observer, SessionObserver};
pub use output::write_atomic;

use crate::backend::Backend;
use crate::error::{Doc2TxtError, SessionError};
use crate::pipeline::decode::encode_payload;
use crate::types::{EngineKind, Extraction, ProcessingResult, UploadRequest};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::io;
use tracing::debug;

/// Where a session is in its upload cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UploadStatus {
    /// Nothing chosen yet. (default)
    #[default]
    Idle,
    /// A file is chosen and encoded, not yet sent.
    Uploading,
    /// The payload is with the backend.
    Processing,
    /// Text received.
    Done,
    /// Extraction failed; the message is stored.
    Error,
}

impl UploadStatus {
    /// `Done` or `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Done | UploadStatus::Error)
    }
}

/// Something that can turn an [`UploadRequest`] into an [`Extraction`].
pub trait Extractor: Send + Sync {
    fn extract(
        &self,
        request: &UploadRequest,
    ) -> impl Future<Output = Result<Extraction, Doc2TxtError>> + Send;
}

impl Extractor for Backend {
    fn extract(
        &self,
        request: &UploadRequest,
    ) -> impl Future<Output = Result<Extraction, Doc2TxtError>> + Send {
        self.extract_text(request)
    }
}

/// A chosen file, already encoded for the wire.
#[derive(Debug, Clone)]
struct PendingUpload {
    filename: String,
    payload: String,
}

/// One user's upload cycle.
#[derive(Default)]
pub struct UploadSession {
    status: UploadStatus,
    engine: EngineKind,
    pending: Option<PendingUpload>,
    /// Name of the file behind `result`, kept for status messages.
    last_filename: Option<String>,
    result: Option<ProcessingResult>,
    observers: Vec<Observer>,
}

impl std::fmt::Debug for UploadSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSession")
            .field("status", &self.status)
            .field("engine", &self.engine)
            .field("filename", &self.filename())
            .field("result", &self.result)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for every future transition.
    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    /// Extracted text, present only in `Done`.
    pub fn text(&self) -> Option<&str> {
        self.result.as_ref().and_then(ProcessingResult::text)
    }

    /// Error message, present only in `Error`.
    pub fn error(&self) -> Option<&str> {
        self.result.as_ref().and_then(ProcessingResult::error_message)
    }

    pub fn result(&self) -> Option<&ProcessingResult> {
        self.result.as_ref()
    }

    /// Name of the file currently chosen or last processed.
    pub fn filename(&self) -> Option<&str> {
        self.pending
            .as_ref()
            .map(|p| p.filename.as_str())
            .or(self.last_filename.as_deref())
    }

    /// One-line status for display, if there is anything to say.
    pub fn status_message(&self) -> Option<String> {
        let name = self.filename().unwrap_or("file");
        match self.status {
            UploadStatus::Idle => None,
            UploadStatus::Uploading | UploadStatus::Processing => {
                Some(format!("Processing {name}..."))
            }
            UploadStatus::Done => Some(format!("File uploaded: {name}")),
            UploadStatus::Error => Some("Upload failed. Please try again.".to_string()),
        }
    }

    /// Choose which engine the next submission uses.
    pub fn set_use_markitdown(&mut self, use_markitdown: bool) -> Result<(), SessionError> {
        if self.status == UploadStatus::Processing {
            return Err(self.invalid("change engine"));
        }
        self.engine = EngineKind::from_flag(use_markitdown);
        Ok(())
    }

    /// Choose a file: `Idle` → `Uploading`. The content is base64-encoded here.
    pub fn select_file(
        &mut self,
        filename: impl Into<String>,
        bytes: impl AsRef<[u8]>,
    ) -> Result<(), SessionError> {
        if self.status != UploadStatus::Idle {
            return Err(self.invalid("select a file"));
        }
        let filename = filename.into();
        let bytes = bytes.as_ref();
        let payload = encode_payload(bytes);
        debug!("Selected {} ({} bytes → {} base64 chars)", filename, bytes.len(), payload.len());

        for o in &self.observers {
            o.on_file_selected(&filename, bytes.len());
        }
        self.pending = Some(PendingUpload { filename, payload });
        self.transition(UploadStatus::Uploading);
        Ok(())
    }

    /// Send the chosen file: `Uploading` → `Processing` → `Done` | `Error`.
    ///
    /// Extraction failures are not returned as `Err`; they move the session
    /// to `Error` and are available from [`UploadSession::error`]. `Err` means
    /// the session was not in `Uploading`.
    ///
    /// Dropping the returned future before it completes (a timeout, a
    /// `select!` branch) leaves the session in `Error` with a cancellation
    /// message, so it can be reset.
    pub async fn submit<E: Extractor>(&mut self, extractor: &E) -> Result<UploadStatus, SessionError> {
        if self.status != UploadStatus::Uploading {
            return Err(self.invalid("submit"));
        }
        let Some(pending) = self.pending.take() else {
            return Err(self.invalid("submit"));
        };

        let request =
            UploadRequest::new(pending.payload, self.engine).with_filename(pending.filename.clone());
        self.last_filename = Some(pending.filename);
        self.transition(UploadStatus::Processing);

        let mut guard = InFlight {
            session: self,
            finished: false,
        };
        let result = ProcessingResult::from(extractor.extract(&request).await);
        guard.finished = true;
        Ok(guard.session.finish(result))
    }

    /// Store the outcome of a submission and notify observers.
    fn finish(&mut self, result: ProcessingResult) -> UploadStatus {
        let next = if result.is_success() {
            UploadStatus::Done
        } else {
            UploadStatus::Error
        };
        self.result = Some(result);
        self.transition(next);

        match &self.result {
            Some(ProcessingResult::Extracted { text }) => {
                for o in &self.observers {
                    o.on_done(text.len());
                }
            }
            Some(ProcessingResult::Failed { message }) => {
                for o in &self.observers {
                    o.on_error(message);
                }
            }
            None => {}
        }
        next
    }

    /// Return to `Idle`, clearing text, error, any chosen file and the
    /// engine choice.
    ///
    /// Allowed from `Done`, `Error` and `Uploading` (abandoning the chosen
    /// file); a no-op from `Idle`; refused while `Processing`.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        match self.status {
            UploadStatus::Processing => Err(self.invalid("reset")),
            UploadStatus::Idle => Ok(()),
            UploadStatus::Uploading | UploadStatus::Done | UploadStatus::Error => {
                self.pending = None;
                self.last_filename = None;
                self.result = None;
                self.engine = EngineKind::default();
                self.transition(UploadStatus::Idle);
                Ok(())
            }
        }
    }

    /// Copy the extracted text. Returns `Ok(false)` when there is nothing to
    /// copy. Does not change state.
    pub fn copy_to_clipboard<C: Clipboard + ?Sized>(&self, clipboard: &mut C) -> io::Result<bool> {
        match self.text() {
            Some(text) => {
                clipboard.set_text(text)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn transition(&mut self, to: UploadStatus) {
        let from = std::mem::replace(&mut self.status, to);
        debug!("Upload session: {:?} → {:?}", from, to);
        for o in &self.observers {
            o.on_transition(from, to);
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            from: self.status,
            action,
        }
    }
}

/// Held across the extractor call; fails the session if the submit future
/// is dropped before the call returns.
struct InFlight<'a> {
    session: &'a mut UploadSession,
    finished: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!("Upload cancelled while processing");
            self.session.finish(ProcessingResult::Failed {
                message: CANCELLED_MESSAGE.to_string(),
            });
        }
    }
}

/// Error message stored when a submission is abandoned mid-flight.
pub const CANCELLED_MESSAGE: &str = "Upload cancelled before the backend answered";
