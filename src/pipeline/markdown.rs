//! Markdown rendering of reconstructed lines.
//!
//! Statute typography carries the structure: headings are set in capitals
//! at a larger size, sections open with `N.` and lettered sub-paragraphs
//! with `(a) `. Each line is classified on its own, in priority order:
//!
//! | Kind           | Test                                                | Output            |
//! |----------------|-----------------------------------------------------|-------------------|
//! | `Heading1`     | every word ≥ 90% capitals, mean size ≥ 7.5          | `# text`          |
//! | `Heading2`     | every word ≥ 90% capitals, mean size ≥ 4.9          | `## text`         |
//! | `Section`      | `^<digits>.<rest>`                                  | `**N.**rest`      |
//! | `SubParagraph` | `^(<lowercase>) <rest>`                             | `  * (_a_) rest`  |
//! | `Text`         | anything else                                       | text unchanged    |
//!
//! An all-capitals line too small for a heading falls through to the
//! section and sub-paragraph tests.

use super::glyph::EPSILON;
use super::lines::Line;
use super::postprocess::clean_line;
use crate::config::LayoutConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static RE_SECTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.(.*)$").unwrap());

static RE_SUBPARAGRAPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\(([a-z]+)\) (.*)$").unwrap());

/// Structural role inferred for a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Heading1,
    Heading2,
    Section,
    SubParagraph,
    Text,
}

impl BlockKind {
    pub fn is_heading(self) -> bool {
        matches!(self, BlockKind::Heading1 | BlockKind::Heading2)
    }

    /// Kinds that open a new block and are set off by a blank line.
    fn starts_block(self) -> bool {
        matches!(self, BlockKind::Heading1 | BlockKind::Heading2 | BlockKind::Section)
    }
}

/// One line after classification, without its trailing newline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedLine {
    pub kind: BlockKind,
    pub markdown: String,
}

/// Classify and format a single line.
pub fn render_line(line: &Line<'_>, config: &LayoutConfig) -> RenderedLine {
    let text = clean_line(&line.text());

    let capitalized = line
        .words()
        .iter()
        .all(|w| w.fraction_capitalized() >= config.heading_min_capitalized - EPSILON);
    if capitalized {
        let size = line.mean_size();
        if size >= config.heading1_min_size - EPSILON {
            return RenderedLine {
                kind: BlockKind::Heading1,
                markdown: format!("# {text}"),
            };
        }
        if size >= config.heading2_min_size - EPSILON {
            return RenderedLine {
                kind: BlockKind::Heading2,
                markdown: format!("## {text}"),
            };
        }
    }

    if let Some(caps) = RE_SECTION.captures(&text) {
        return RenderedLine {
            kind: BlockKind::Section,
            markdown: format!("**{}.**{}", &caps[1], &caps[2]),
        };
    }

    if let Some(caps) = RE_SUBPARAGRAPH.captures(&text) {
        return RenderedLine {
            kind: BlockKind::SubParagraph,
            markdown: format!("  * (_{}_) {}", &caps[1], &caps[2]),
        };
    }

    RenderedLine {
        kind: BlockKind::Text,
        markdown: text,
    }
}

/// Render a column's lines as Markdown, one paragraph line per input line.
///
/// Headings and sections are preceded by a blank line, except at the very
/// start of the output and directly after a heading.
pub fn convert_to_markdown(lines: &[Line<'_>], config: &LayoutConfig) -> String {
    let mut out = String::new();
    let mut previous: Option<BlockKind> = None;

    for line in lines {
        let rendered = render_line(line, config);
        let separated = previous.is_some_and(|p| !p.is_heading());
        if rendered.kind.starts_block() && separated {
            out.push('\n');
        }
        out.push_str(&rendered.markdown);
        out.push('\n');
        previous = Some(rendered.kind);
    }
    out
}
