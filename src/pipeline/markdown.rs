//! The in-process Markdown engine: Markdown source → readable plain text.
//!
//! The document is walked as a `pulldown-cmark` event stream and re-emitted
//! without markup: headings and paragraphs become blank-line separated
//! blocks, list items keep a `- ` / `N. ` marker, code blocks are copied
//! verbatim, links keep their text, table cells are tab separated and raw
//! HTML is dropped.
//!
//! Input that is not UTF-8 is not Markdown; it is rejected with
//! [`Doc2TxtError::UnsupportedFormat`] instead of being decoded lossily.
//! Any UTF-8 text is accepted, since every string is valid CommonMark.

use crate::error::Doc2TxtError;
use crate::types::{EngineKind, Metadata};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use serde_json::Value;
use tracing::debug;

/// Convert Markdown bytes to plain text plus a small metadata map.
pub fn extract(bytes: &[u8], filename: Option<&str>) -> Result<(String, Metadata), Doc2TxtError> {
    let source = std::str::from_utf8(bytes).map_err(|e| Doc2TxtError::UnsupportedFormat {
        engine: EngineKind::MarkItDown.to_string(),
        detail: format!(
            "content is not UTF-8 text (invalid byte at offset {}); use the Tika engine for binary documents",
            e.valid_up_to()
        ),
    })?;
    let source = source.strip_prefix('\u{FEFF}').unwrap_or(source);

    let text = markdown_to_text(source);
    debug!(
        "Markdown engine: {} bytes in → {} chars out",
        bytes.len(),
        text.chars().count()
    );

    let mut metadata = Metadata::new();
    metadata.insert("converter".into(), Value::from("pulldown-cmark"));
    metadata.insert(
        "file_type".into(),
        Value::from(filename.and_then(extension).unwrap_or_default()),
    );
    Ok((text, metadata))
}

/// Render Markdown source as plain text.
pub fn markdown_to_text(source: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES;

    let mut w = TextWriter::default();
    for event in Parser::new_ext(source, options) {
        match event {
            Event::Start(tag) => w.start(tag),
            Event::End(tag) => w.end(tag),
            Event::Text(t) | Event::Code(t) => w.push(&t),
            Event::SoftBreak | Event::HardBreak => w.newline(),
            Event::Rule => w.block_break(),
            Event::TaskListMarker(done) => w.push(if done { "[x] " } else { "[ ] " }),
            Event::FootnoteReference(label) => w.push(&format!("[{label}]")),
            // Raw HTML carries no text we can trust to render.
            _ => {}
        }
    }
    w.finish()
}

/// File extension (with leading dot) of `name`, lowercased.
fn extension(name: &str) -> Option<String> {
    let base = name.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_lowercase()))
}

/// Accumulates plain text while tracking just enough block structure to
/// place line breaks.
#[derive(Default)]
struct TextWriter {
    out: String,
    /// One entry per open list: the next ordinal, or `None` for bullets.
    lists: Vec<Option<u64>>,
    /// Cells emitted in the current table row.
    cell: usize,
    /// A footnote label was just written; its first block continues the line.
    after_label: bool,
}

impl TextWriter {
    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::CodeBlock(_) => self.line_start(),
            Tag::List(first) => {
                self.line_start();
                self.lists.push(first);
            }
            Tag::Item => {
                self.line_start();
                let depth = self.lists.len().saturating_sub(1);
                self.out.push_str(&"  ".repeat(depth));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let m = format!("{n}. ");
                        *n += 1;
                        m
                    }
                    _ => "- ".to_string(),
                };
                self.out.push_str(&marker);
            }
            Tag::TableRow | Tag::TableHead => self.cell = 0,
            Tag::TableCell => {
                if self.cell > 0 {
                    self.out.push('\t');
                }
                self.cell += 1;
            }
            Tag::FootnoteDefinition(label) => {
                self.line_start();
                self.out.push_str(&format!("[{label}]: "));
                self.after_label = true;
            }
            Tag::Paragraph | Tag::Heading { .. } => {
                if std::mem::take(&mut self.after_label) {
                    return;
                }
                if self.lists.is_empty() {
                    self.line_start();
                } else if self.out.ends_with('\n') {
                    // A later block in the same item lines up under its text.
                    self.out.push_str(&"  ".repeat(self.lists.len()));
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Heading(_) => {
                if self.lists.is_empty() {
                    self.block_break();
                } else {
                    self.line_start();
                }
            }
            TagEnd::CodeBlock | TagEnd::FootnoteDefinition => self.block_break(),
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.block_break();
                }
            }
            TagEnd::Item => self.line_start(),
            TagEnd::TableHead | TagEnd::TableRow => self.newline(),
            TagEnd::Table => self.block_break(),
            _ => {}
        }
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        self.out.push('\n');
    }

    /// Make sure the next output starts on a fresh line.
    fn line_start(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    /// End the current block with exactly one blank line.
    fn block_break(&mut self) {
        if self.out.is_empty() {
            return;
        }
        let kept = self.out.trim_end_matches('\n').len();
        self.out.truncate(kept);
        self.out.push_str("\n\n");
    }

    fn finish(self) -> String {
        let trimmed = self.out.trim_end();
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}\n")
        }
    }
}
