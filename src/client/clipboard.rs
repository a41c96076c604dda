//! Clipboard targets for [`crate::client::UploadSession::copy_to_clipboard`].

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::{self, Write};

/// Somewhere copied text can go.
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> io::Result<()>;
}

/// Keeps the last copied text in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    contents: Option<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> io::Result<()> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}

/// Sets the system clipboard through the terminal with an OSC 52 escape
/// sequence. Works over SSH in terminals that support it (kitty, iTerm2,
/// WezTerm, tmux with `set-clipboard on`); others ignore the sequence.
pub struct Osc52Clipboard<W: Write> {
    out: W,
}

impl<W: Write> Osc52Clipboard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl Osc52Clipboard<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> Clipboard for Osc52Clipboard<W> {
    fn set_text(&mut self, text: &str) -> io::Result<()> {
        write!(self.out, "\x1b]52;c;{}\x07", STANDARD.encode(text.as_bytes()))?;
        self.out.flush()
    }
}
