//! # doc2txt
//!
//! Upload a document, get its plain text back.
//!
//! ## Why this crate?
//!
//! Parsing PDFs, Office files and friends is a solved problem, and Apache
//! Tika solves it. What is left is plumbing: getting bytes from a user to
//! Tika, mapping Tika's failures onto something a client can act on, and
//! tracking an upload from "file chosen" to "text on screen". This crate is
//! that plumbing, plus a small in-process Markdown engine for `.md` files
//! that do not need a round-trip to Tika.
//!
//! ## Architecture
//!
//! ```text
//!  UploadSession ──(Extractor)──▶ BackendClient ──HTTP──▶ server ─┐
//!   Idle → Uploading →                                            │
//!   Processing → Done | Error      Backend (in-process) ◀─────────┘
//!                                     │
//!                                     ├─ 1. Decode   base64 / data URI → bytes
//!                                     ├─ 2. Extract  Tika (HTTP) or Markdown
//!                                     └─ 3. Clean    whitespace normalisation
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc2txt::{Backend, BackendConfig, EngineKind, UploadRequest};
//! use doc2txt::pipeline::decode::encode_payload;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // TIKA_SERVER_ENDPOINT, default http://localhost:9998
//!     let backend = Backend::new(BackendConfig::from_env()?)?;
//!     let bytes = std::fs::read("report.pdf")?;
//!     let request = UploadRequest::new(encode_payload(&bytes), EngineKind::Tika)
//!         .with_filename("report.pdf");
//!     let extraction = backend.extract_text(&request).await?;
//!     println!("{}", extraction.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum router and [`server::serve`] |
//! | `cli`    | on      | The `doc2txt` binary (clap + anyhow + tracing-subscriber + indicatif); implies `server` |
//!
//! Disable both when embedding only the backend or the client:
//! ```toml
//! doc2txt = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod pipeline;
#[cfg(feature = "server")]
pub mod server;
pub mod types;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::Backend;
pub use client::{BackendClient, Extractor, UploadSession, UploadStatus};
pub use config::{BackendConfig, BackendConfigBuilder, ClientConfig};
pub use error::{Doc2TxtError, SessionError};
pub use types::{
    EngineKind, ErrorBody, Extraction, HealthStatus, Metadata, ProcessingResult, ServiceInfo,
    UploadRequest,
};
