//! Observer trait for upload-session state changes.
//!
//! Attach an [`Arc<dyn SessionObserver>`] with
//! [`crate::client::UploadSession::subscribe`] to be told about every
//! transition. A renderer (terminal spinner, web socket, log line) subscribes
//! and redraws on each call; the session itself knows nothing about output.
//!
//! # Example
//!
//! ```rust
//! use doc2txt::client::{SessionObserver, UploadSession, UploadStatus};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct History(Mutex<Vec<UploadStatus>>);
//!
//! impl SessionObserver for History {
//!     fn on_transition(&self, _from: UploadStatus, to: UploadStatus) {
//!         self.0.lock().unwrap().push(to);
//!     }
//! }
//!
//! let history = Arc::new(History::default());
//! let mut session = UploadSession::new();
//! session.subscribe(history.clone());
//! session.select_file("notes.md", b"# hi".to_vec()).unwrap();
//! assert_eq!(*history.0.lock().unwrap(), vec![UploadStatus::Uploading]);
//! ```

use crate::client::UploadStatus;
use std::sync::Arc;

/// Called by [`crate::client::UploadSession`] as it changes state.
///
/// Implementations must be `Send + Sync` so a session can move across
/// tasks. All methods have default no-op implementations so callers only
/// override what they care about.
pub trait SessionObserver: Send + Sync {
    /// Called after every state change.
    ///
    /// # Arguments
    /// * `from` — state before the change
    /// * `to`   — state after the change
    fn on_transition(&self, from: UploadStatus, to: UploadStatus) {
        let _ = (from, to);
    }

    /// Called when a file has been chosen and encoded.
    ///
    /// # Arguments
    /// * `filename` — name of the chosen file
    /// * `size`     — raw size in bytes, before base64
    fn on_file_selected(&self, filename: &str, size: usize) {
        let _ = (filename, size);
    }

    /// Called when extraction succeeded, after the transition to `Done`.
    ///
    /// # Arguments
    /// * `text_len` — byte length of the extracted text
    fn on_done(&self, text_len: usize) {
        let _ = text_len;
    }

    /// Called when extraction failed, after the transition to `Error`.
    ///
    /// # Arguments
    /// * `message` — human-readable error description
    fn on_error(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op implementation for callers that don't need notifications.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Convenience alias for the type stored by the session.
pub type Observer = Arc<dyn SessionObserver>;
