//! Word assembly: fold a page's glyph stream into words.
//!
//! The extractor emits glyphs in reading order within each text run, so a
//! single greedy pass suffices. A [`WordBuilder`] keeps accepting glyphs while
//! each new one touches the right edge of the word and shares its baseline
//! band; the first glyph that fails either test seals the word and starts the
//! next one. A glyph is never offered to an earlier, already-sealed word.

use super::glyph::{dominant_font, Glyph, VerticalSpan, EPSILON};
use crate::config::LayoutConfig;

/// A sealed, immutable run of adjacent glyphs.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    glyphs: Vec<Glyph>,
    text: String,
    left: f64,
    right: f64,
    bottom: f64,
    top: f64,
}

impl Word {
    /// Glyph texts concatenated in append order.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    pub fn num_chars(&self) -> usize {
        self.glyphs.len()
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

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    pub(crate) fn span(&self) -> VerticalSpan {
        VerticalSpan::new(self.bottom, self.top)
    }

    /// Arithmetic mean of the glyph sizes.
    pub fn mean_size(&self) -> f64 {
        self.glyphs.iter().map(|g| g.size).sum::<f64>() / self.glyphs.len() as f64
    }

    /// Most frequent glyph font, ties broken by name.
    pub fn mode_font(&self) -> String {
        dominant_font(self.glyphs.iter().map(|g| (g.font.as_str(), 1)))
    }

    /// Share of alphabetic characters that are uppercase; 1.0 without any.
    pub fn fraction_capitalized(&self) -> f64 {
        let (alphabetic, upper) = self
            .text
            .chars()
            .filter(|c| c.is_alphabetic())
            .fold((0usize, 0usize), |(a, u), c| (a + 1, u + usize::from(c.is_uppercase())));
        if alphabetic == 0 {
            1.0
        } else {
            upper as f64 / alphabetic as f64
        }
    }
}

/// An open word that still accepts glyphs.
#[derive(Debug, Clone)]
pub struct WordBuilder {
    glyphs: Vec<Glyph>,
    right: f64,
    span: Option<VerticalSpan>,
    max_overlap: f64,
    max_spacing: f64,
    min_vertical_overlap: f64,
}

impl WordBuilder {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            glyphs: Vec::new(),
            right: f64::NEG_INFINITY,
            span: None,
            max_overlap: config.word_max_overlap,
            max_spacing: config.word_max_spacing,
            min_vertical_overlap: config.word_min_vertical_overlap,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Whether `glyph` touches the word's right edge and shares its band.
    pub fn can_accept(&self, glyph: &Glyph) -> bool {
        let Some(span) = self.span else {
            return true;
        };
        let gap = glyph.left - self.right;
        let touching = gap >= -self.max_overlap - EPSILON && gap <= self.max_spacing + EPSILON;
        touching && span.overlap_fraction(&glyph.span()) >= self.min_vertical_overlap - EPSILON
    }

    /// Append `glyph`, or hand it back when the word rejects it.
    ///
    /// An empty builder always accepts.
    pub fn accept(&mut self, glyph: Glyph) -> Result<(), Glyph> {
        if !self.can_accept(&glyph) {
            return Err(glyph);
        }
        self.right = self.right.max(glyph.right);
        self.span = Some(match self.span {
            Some(span) => span.union(glyph.span()),
            None => glyph.span(),
        });
        self.glyphs.push(glyph);
        Ok(())
    }

    /// Seal the word. Returns `None` when no glyph was ever accepted.
    pub fn finish(self) -> Option<Word> {
        let span = self.span?;
        let text = self.glyphs.iter().map(|g| g.text.as_str()).collect();
        let left = self
            .glyphs
            .iter()
            .map(|g| g.left)
            .fold(f64::INFINITY, f64::min);
        Some(Word {
            glyphs: self.glyphs,
            text,
            left,
            right: self.right,
            bottom: span.bottom,
            top: span.top,
        })
    }
}

/// Fold an ordered glyph stream into words, preserving order.
///
/// Concatenating the returned words' texts reproduces the glyph stream.
pub fn assemble_words(glyphs: impl IntoIterator<Item = Glyph>, config: &LayoutConfig) -> Vec<Word> {
    let mut words = Vec::new();
    let mut open = WordBuilder::new(config);

    for glyph in glyphs {
        if let Err(rejected) = open.accept(glyph) {
            let sealed = std::mem::replace(&mut open, WordBuilder::new(config));
            words.extend(sealed.finish());
            if open.accept(rejected).is_err() {
                unreachable!("an empty word accepts any glyph");
            }
        }
    }
    words.extend(open.finish());
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(text: &str, left: f64, right: f64, bottom: f64, top: f64, size: f64) -> Glyph {
        Glyph::new(text, left, right, bottom, top, size, "Courier")
    }

    fn simple_word() -> Word {
        let config = LayoutConfig::default();
        let mut w = WordBuilder::new(&config);
        w.accept(glyph("f", 1.0, 1.1, 10.0, 10.5, 5.0)).unwrap();
        w.accept(glyph("o", 1.1, 1.2, 10.01, 10.51, 5.5)).unwrap();
        w.finish().unwrap()
    }

    #[test]
    fn accept_rejects_misaligned_glyphs() {
        let config = LayoutConfig::default();
        let mut w = WordBuilder::new(&config);
        assert!(w.accept(glyph("f", 1.0, 1.1, 10.0, 10.5, 5.0)).is_ok());
        assert!(w.accept(glyph("o", 1.1, 1.2, 10.01, 10.51, 5.5)).is_ok());
        // shifted up by almost half a line
        assert!(w.accept(glyph("b", 1.2, 1.3, 10.4, 10.8, 4.0)).is_err());
        // too far right
        assert!(w.accept(glyph("a", 1.25, 1.35, 10.0, 10.5, 4.0)).is_err());
        // overlapping the previous glyph
        assert!(w.accept(glyph("r", 1.15, 1.25, 10.0, 10.5, 4.0)).is_err());
        assert_eq!(w.finish().unwrap().text(), "fo");
    }

    #[test]
    fn rejected_glyph_is_handed_back() {
        let config = LayoutConfig::default();
        let mut w = WordBuilder::new(&config);
        w.accept(glyph("a", 0.0, 1.0, 0.0, 1.0, 5.0)).unwrap();
        let back = w.accept(glyph("z", 5.0, 6.0, 0.0, 1.0, 5.0)).unwrap_err();
        assert_eq!(back.text, "z");
    }

    #[test]
    fn horizontal_gap_boundaries() {
        let config = LayoutConfig::default();
        let base = || {
            let mut w = WordBuilder::new(&config);
            w.accept(glyph("a", 9.0, 10.0, 0.0, 1.0, 5.0)).unwrap();
            w
        };
        assert!(base().can_accept(&glyph("b", 10.01, 11.0, 0.0, 1.0, 5.0)));
        assert!(!base().can_accept(&glyph("b", 10.011, 11.0, 0.0, 1.0, 5.0)));
        assert!(base().can_accept(&glyph("b", 9.99, 11.0, 0.0, 1.0, 5.0)));
        assert!(!base().can_accept(&glyph("b", 9.989, 11.0, 0.0, 1.0, 5.0)));
    }

    #[test]
    fn vertical_overlap_boundaries() {
        let config = LayoutConfig::default();
        let mut w = WordBuilder::new(&config);
        w.accept(glyph("a", 0.0, 1.0, 0.0, 1.0, 5.0)).unwrap();
        // shared 0.95 of a unit-high glyph
        assert!(w.can_accept(&glyph("b", 1.0, 2.0, 0.05, 1.05, 5.0)));
        // shared 0.949
        assert!(!w.can_accept(&glyph("b", 1.0, 2.0, 0.051, 1.051, 5.0)));
    }

    #[test]
    fn derived_attributes() {
        let w = simple_word();
        assert_eq!(w.text(), "fo");
        assert_eq!(w.num_chars(), 2);
        assert_eq!(w.left(), 1.0);
        assert_eq!(w.right(), 1.2);
        assert_eq!(w.top(), 10.51);
        assert_eq!(w.bottom(), 10.0);
        assert!((w.height() - 0.51).abs() < 1e-9);
        assert_eq!(w.mean_size(), 5.25);
        assert_eq!(w.mode_font(), "Courier");
    }

    #[test]
    fn fraction_capitalized_ignores_non_letters() {
        let config = LayoutConfig::default();
        let word_of = |text: &str| {
            let glyphs = text
                .chars()
                .enumerate()
                .map(|(i, c)| glyph(&c.to_string(), i as f64, i as f64 + 1.0, 0.0, 1.0, 5.0));
            assemble_words(glyphs, &config).remove(0)
        };
        assert_eq!(word_of("COURT").fraction_capitalized(), 1.0);
        assert_eq!(word_of("(3)").fraction_capitalized(), 1.0);
        assert_eq!(word_of("Ab").fraction_capitalized(), 0.5);
        assert_eq!(word_of("É.-U.").fraction_capitalized(), 1.0);
        assert_eq!(word_of("court").fraction_capitalized(), 0.0);
    }

    #[test]
    fn assemble_words_partitions_the_stream() {
        let config = LayoutConfig::default();
        let glyphs = vec![
            glyph("o", 1.0, 1.1, 10.0, 10.5, 5.0),
            glyph("f", 1.1, 1.2, 10.0, 10.5, 5.0),
            glyph("t", 1.5, 1.6, 10.0, 10.5, 5.0),
            glyph("h", 1.6, 1.7, 10.0, 10.5, 5.0),
            glyph("e", 1.7, 1.8, 10.0, 10.5, 5.0),
            // next line starts back at the left margin
            glyph("C", 1.0, 1.1, 9.0, 9.5, 5.0),
        ];
        let words = assemble_words(glyphs, &config);
        let texts: Vec<&str> = words.iter().map(Word::text).collect();
        assert_eq!(texts, vec!["of", "the", "C"]);
        assert_eq!(words.iter().map(Word::num_chars).sum::<usize>(), 6);
    }

    #[test]
    fn assemble_words_on_empty_stream() {
        assert!(assemble_words(Vec::new(), &LayoutConfig::default()).is_empty());
    }

    #[test]
    fn mode_font_prefers_majority() {
        let config = LayoutConfig::default();
        let mut w = WordBuilder::new(&config);
        w.accept(Glyph::new("a", 0.0, 1.0, 0.0, 1.0, 5.0, "Times")).unwrap();
        w.accept(Glyph::new("b", 1.0, 2.0, 0.0, 1.0, 5.0, "Arial")).unwrap();
        w.accept(Glyph::new("c", 2.0, 3.0, 0.0, 1.0, 5.0, "Times")).unwrap();
        assert_eq!(w.finish().unwrap().mode_font(), "Times");
    }
}
