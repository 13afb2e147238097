//! Post-processing: deterministic text cleanup around the Markdown renderer.
//!
//! Two levels of cleanup:
//!
//! - [`clean_line`] runs on every reconstructed line before classification.
//!   The scans encode some spaces as underscores, and the extractor leaves
//!   double-escaped quotes behind as the literal entity `&quot;`.
//! - [`tidy_document`] runs once on each assembled language document, after
//!   pages and separators are joined.
//!
//! ## Rule Order
//!
//! Line endings are normalised before trimming, and trimming happens before
//! blank-line collapsing so whitespace-only lines count as blank.

use once_cell::sync::Lazy;
use regex::Regex;

/// Clean one line of reconstructed text.
///
/// Rules (applied in order):
/// 1. Underscore → space
/// 2. Literal `&quot;` → `"`
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
pub fn clean_line(text: &str) -> String {
    let s = text.replace('_', " ").replace("&quot;", "\"");
    remove_invisible_chars(&s)
}

/// Normalise an assembled Markdown document.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Trim trailing whitespace per line
/// 3. Collapse runs of blank lines to one
/// 4. Ensure the document ends with exactly one newline
///
/// A document without any text stays empty.
pub fn tidy_document(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    ensure_final_newline(&s)
}

// ── Rule: Normalise line endings ─────────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule: Trim trailing whitespace per line ──────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule: Collapse blank lines ───────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Rule: Ensure the document ends with a single newline ─────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Rule: Remove invisible Unicode characters ────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Tests ────────────────────────────────────────────────────────────────────
