//! A single page: its bounding box, its words in creation order, and the
//! column layout recovered from them.

use super::columns::{ColumnMargins, Occupancy, PageLayout};
use super::glyph::{BoundingBox, Glyph};
use super::words::{assemble_words, Word};
use crate::config::LayoutConfig;

/// One page of the statute.
///
/// The page owns its words; lines produced by the language splitter borrow
/// them. The occupancy map spans the page's bounding box at 0.1-unit
/// resolution and is rebuilt from scratch by every layout sweep.
#[derive(Debug, Clone)]
pub struct Page {
    id: u32,
    bbox: BoundingBox,
    pub(crate) words: Vec<Word>,
    pub(crate) occupancy: Occupancy,
    pub(crate) layout: Option<PageLayout>,
}

impl Page {
    pub fn new(id: u32, bbox: BoundingBox) -> Self {
        Self {
            id,
            bbox,
            words: Vec::new(),
            occupancy: Occupancy::new(bbox.left, bbox.right),
            layout: None,
        }
    }

    /// Build a page and assemble its glyph stream into words.
    pub fn from_glyphs(
        id: u32,
        bbox: BoundingBox,
        glyphs: impl IntoIterator<Item = Glyph>,
        config: &LayoutConfig,
    ) -> Self {
        let mut page = Self::new(id, bbox);
        page.words = assemble_words(glyphs, config);
        page
    }

    /// Append a word. Any previously computed layout is discarded.
    pub fn add_word(&mut self, word: Word) {
        self.words.push(word);
        self.layout = None;
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Horizontal extent `(text_left, text_right)` over every word.
    pub fn text_extents(&self) -> Option<(f64, f64)> {
        if self.words.is_empty() {
            return None;
        }
        let left = self.words.iter().map(Word::left).fold(f64::INFINITY, f64::min);
        let right = self
            .words
            .iter()
            .map(Word::right)
            .fold(f64::NEG_INFINITY, f64::max);
        Some((left, right))
    }

    /// Margins from the last successful layout sweep, if any.
    pub fn column_margins(&self) -> Option<ColumnMargins> {
        self.layout.map(|l| l.margins)
    }

    /// Number of in-band words covering the 0.1 step nearest `x`.
    pub fn occupancy_at(&self, x: f64) -> u32 {
        self.occupancy.at(x)
    }
}
