//! Builders for synthetic words and pages shared by the pipeline tests.

use super::glyph::{BoundingBox, Glyph};
use super::page::Page;
use super::words::{Word, WordBuilder};
use crate::config::LayoutConfig;

/// A word of size-5 Courier glyphs spread evenly over `[left, right]`.
pub(crate) fn word(text: &str, left: f64, right: f64, bottom: f64, top: f64) -> Word {
    sized_word(text, left, right, bottom, top, 5.0)
}

pub(crate) fn sized_word(text: &str, left: f64, right: f64, bottom: f64, top: f64, size: f64) -> Word {
    let config = LayoutConfig::default();
    let chars: Vec<char> = text.chars().collect();
    let step = (right - left) / chars.len() as f64;
    let mut builder = WordBuilder::new(&config);
    for (i, c) in chars.iter().enumerate() {
        let glyph_left = left + step * i as f64;
        let glyph_right = if i + 1 == chars.len() { right } else { glyph_left + step };
        let glyph = Glyph::new(c.to_string(), glyph_left, glyph_right, bottom, top, size, "Courier");
        builder
            .accept(glyph)
            .expect("evenly spaced glyphs on one baseline form a word");
    }
    builder.finish().expect("non-empty text")
}

/// A 300 × 400 two-column page: twelve body lines per column, a running
/// header across the gutter at y=350 and a page number in the gutter at y=100.
///
/// Column layout is `(0.9, 140.1, 149.9, 290.1)`.
pub(crate) fn statute_page() -> Page {
    let mut page = Page::new(24, BoundingBox::new(0.0, 0.0, 300.0, 400.0));
    page.add_word(word("Chap.1Amiraute", 100.0, 200.0, 350.0, 355.0));
    for i in 0..12 {
        let bottom = 300.0 - 10.0 * i as f64;
        let top = bottom + 4.0;
        let (en_split, fr_split) = if i % 2 == 0 { (70.0, 220.0) } else { (40.0, 190.0) };
        page.add_word(word(&format!("english{i}"), 1.0, en_split, bottom, top));
        page.add_word(word("text", en_split + 0.5, 140.0, bottom, top));
        page.add_word(word(&format!("francais{i}"), 150.0, fr_split, bottom, top));
        page.add_word(word("texte", fr_split + 0.5, 290.0, bottom, top));
    }
    page.add_word(word("24", 143.0, 147.0, 100.0, 104.0));
    page
}
