//! Line assembly and the positional language split.
//!
//! The left column is English and the right column French; no language
//! identification happens. Each column's words are visited top to bottom,
//! left to right, and grouped greedily into lines by vertical overlap.

use super::columns::ColumnMargins;
use super::glyph::{dominant_font, VerticalSpan, EPSILON};
use super::page::Page;
use super::words::Word;
use crate::config::LayoutConfig;
use tracing::debug;

/// A sealed line: words borrowed from their page, sorted left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Line<'a> {
    words: Vec<&'a Word>,
    left: f64,
    right: f64,
    bottom: f64,
    top: f64,
}

impl<'a> Line<'a> {
    pub fn words(&self) -> &[&'a Word] {
        &self.words
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn right(&self) -> f64 {
        self.right
    }

    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn num_chars(&self) -> usize {
        self.words.iter().map(|w| w.num_chars()).sum()
    }

    /// Glyph size averaged over every character of the line.
    pub fn mean_size(&self) -> f64 {
        let weighted: f64 = self
            .words
            .iter()
            .map(|w| w.num_chars() as f64 * w.mean_size())
            .sum();
        weighted / self.num_chars() as f64
    }

    /// The words' own dominant fonts, weighted by character count.
    pub fn mode_font(&self) -> String {
        let fonts: Vec<(String, usize)> = self
            .words
            .iter()
            .map(|w| (w.mode_font(), w.num_chars()))
            .collect();
        dominant_font(fonts.iter().map(|(f, n)| (f.as_str(), *n)))
    }

    /// Word texts joined by single spaces.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// An open line that still accepts words.
#[derive(Debug, Clone)]
pub struct LineBuilder<'a> {
    words: Vec<&'a Word>,
    span: Option<VerticalSpan>,
    min_vertical_overlap: f64,
}

impl<'a> LineBuilder<'a> {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            words: Vec::new(),
            span: None,
            min_vertical_overlap: config.line_min_vertical_overlap,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Whether `word` overlaps the line's current vertical bounds enough.
    pub fn can_accept(&self, word: &Word) -> bool {
        match self.span {
            None => true,
            Some(span) => {
                span.overlap_fraction(&word.span()) >= self.min_vertical_overlap - EPSILON
            }
        }
    }

    /// Append `word` if it belongs to this line.
    pub fn accept(&mut self, word: &'a Word) -> bool {
        if !self.can_accept(word) {
            return false;
        }
        self.span = Some(match self.span {
            Some(span) => span.union(word.span()),
            None => word.span(),
        });
        self.words.push(word);
        true
    }

    /// Seal the line, sorting its words by ascending left edge.
    ///
    /// The sort is stable, so words sharing a left edge keep their order.
    pub fn finish(mut self) -> Option<Line<'a>> {
        let span = self.span?;
        self.words.sort_by(|a, b| a.left().total_cmp(&b.left()));
        let left = self.words.iter().map(|w| w.left()).fold(f64::INFINITY, f64::min);
        let right = self
            .words
            .iter()
            .map(|w| w.right())
            .fold(f64::NEG_INFINITY, f64::max);
        Some(Line {
            words: self.words,
            left,
            right,
            bottom: span.bottom,
            top: span.top,
        })
    }
}

/// Group words, already in reading order, into lines.
pub fn assemble_lines<'a>(
    words: impl IntoIterator<Item = &'a Word>,
    config: &LayoutConfig,
) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    let mut open = LineBuilder::new(config);
    for word in words {
        if !open.accept(word) {
            let sealed = std::mem::replace(&mut open, LineBuilder::new(config));
            lines.extend(sealed.finish());
            open.accept(word);
        }
    }
    lines.extend(open.finish());
    lines
}

/// Ordered English and French lines of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageSplit<'a> {
    pub english: Vec<Line<'a>>,
    pub french: Vec<Line<'a>>,
}

impl Page {
    /// Lines built from the words strictly between `left` and `right`.
    ///
    /// Words are visited by descending bottom, then ascending left. A word
    /// touching either bound is excluded.
    pub fn extract_language(&self, left: f64, right: f64, config: &LayoutConfig) -> Vec<Line<'_>> {
        let mut words: Vec<&Word> = self
            .words
            .iter()
            .filter(|w| w.left() > left && w.right() < right)
            .collect();
        words.sort_by(|a, b| {
            b.bottom()
                .total_cmp(&a.bottom())
                .then_with(|| a.left().total_cmp(&b.left()))
        });
        assemble_lines(words, config)
    }

    /// Split the page into its English (left) and French (right) lines.
    pub fn split_languages(&self, margins: &ColumnMargins, config: &LayoutConfig) -> LanguageSplit<'_> {
        let english = self.extract_language(margins.left_edge, margins.left_gap_edge, config);
        let french = self.extract_language(margins.right_gap_edge, margins.right_edge, config);
        debug!(
            page = self.id(),
            english = english.len(),
            french = french.len(),
            "Split page into language columns"
        );
        LanguageSplit { english, french }
    }
}
