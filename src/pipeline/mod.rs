//! Pipeline stages for one extraction request.
//!
//! Each submodule implements exactly one transformation step, so each can
//! be tested without the others and the engines can change without
//! touching decoding or cleanup.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌──▶ tika ─────┐
//! decode ──▶ │              ├──▶ postprocess
//! (base64)   └──▶ markdown ─┘     (cleanup)
//! ```
//!
//! 1. [`decode`]      — base64 (or data-URI) payload to raw bytes; the only
//!    stage that rejects user input
//! 2. [`tika`]        — `PUT` the bytes to a Tika server; the only stage with
//!    network I/O
//! 3. [`markdown`]    — in-process Markdown-to-text via `pulldown-cmark`
//! 4. [`postprocess`] — deterministic whitespace and invisible-character
//!    cleanup

pub mod decode;
pub mod markdown;
pub mod postprocess;
pub mod tika;
