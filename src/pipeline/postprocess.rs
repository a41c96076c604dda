//! Post-processing: deterministic cleanup of engine output.
//!
//! Tika's text handler emits one blank line per XHTML block, so a PDF page
//! with a dozen empty layout boxes comes back as a wall of newlines with
//! trailing spaces and the odd zero-width character from the source font.
//! The rules here are cheap, order-dependent string passes that fix layout
//! noise without touching content.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so later passes only ever see `\n`;
//! trailing whitespace is trimmed before blank-line collapsing so lines of
//! spaces count as blank.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to raw engine output.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, …)
/// 3. Replace form feeds (Tika's page breaks) with blank lines
/// 4. Trim trailing whitespace per line
/// 5. Collapse 3+ consecutive blank lines down to 2
/// 6. Drop leading blank lines
/// 7. Ensure the text ends with exactly one newline
///
/// Text that is empty after cleanup stays empty rather than becoming `"\n"`.
pub fn clean_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = replace_form_feeds(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = s.trim_start_matches('\n');
    ensure_final_newline(s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ──────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Form feeds ───────────────────────────────────────────────────────

fn replace_form_feeds(input: &str) -> String {
    input.replace('\u{000C}', "\n\n")
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Rule 7: Ensure text ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_crlf() {
        assert_eq!(clean_text("a\r\nb\rc"), "a\nb\nc\n");
    }

    #[test]
    fn trims_trailing_spaces() {
        assert_eq!(clean_text("line one   \nline two\t\n"), "line one\nline two\n");
    }

    #[test]
    fn collapses_blank_runs() {
        let out = clean_text("title\n\n\n\n\n\n\nbody");
        assert_eq!(out, "title\n\n\nbody\n");
    }

    #[test]
    fn whitespace_only_lines_count_as_blank() {
        let out = clean_text("a\n   \n \n\t\n  \nb");
        assert_eq!(out, "a\n\n\nb\n");
    }

    #[test]
    fn strips_leading_blank_lines() {
        assert_eq!(clean_text("\n\n\n  \nHello"), "Hello\n");
    }

    #[test]
    fn removes_invisible_chars() {
        assert_eq!(clean_text("\u{FEFF}he\u{200B}llo"), "hello\n");
    }

    #[test]
    fn form_feed_becomes_paragraph_break() {
        assert_eq!(clean_text("page one\u{000C}page two"), "page one\n\npage two\n");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("\n\n \n"), "");
    }

    #[test]
    fn single_final_newline() {
        assert_eq!(clean_text("done\n\n\n"), "done\n");
    }
}
