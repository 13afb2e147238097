//! Positioned glyphs, bounding boxes and the vertical-overlap measure shared
//! by word and line assembly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Slack applied to threshold comparisons so decimal inputs that sit exactly
/// on a threshold (a 0.01 gap, a 0.95 overlap) are not rejected because of
/// their binary representation.
pub(crate) const EPSILON: f64 = 1e-9;

/// A rectangle in page coordinates, origin at the bottom left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl BoundingBox {
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    /// Parse the `left,bottom,right,top` attribute form used by layout XML.
    pub fn parse(s: &str) -> Result<Self, String> {
        let values = s
            .split(',')
            .map(|v| {
                v.trim()
                    .parse::<f64>()
                    .map_err(|_| format!("bad coordinate '{}' in bbox '{s}'", v.trim()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        match values.as_slice() {
            &[left, bottom, right, top] => Ok(Self::new(left, bottom, right, top)),
            _ => Err(format!("bbox '{s}' has {} coordinates, expected 4", values.len())),
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Check that the box can serve as a page: finite, not inverted, and no
    /// larger than [`MAX_PAGE_EXTENT`] on either axis.
    pub fn validate_page(&self) -> Result<(), String> {
        let coords = [self.left, self.bottom, self.right, self.top];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(format!("page bbox {coords:?} has a non-finite coordinate"));
        }
        if self.width() < 0.0 || self.height() < 0.0 {
            return Err(format!("page bbox {coords:?} is inverted"));
        }
        if self.width() > MAX_PAGE_EXTENT || self.height() > MAX_PAGE_EXTENT {
            return Err(format!("page bbox {coords:?} exceeds {MAX_PAGE_EXTENT} units"));
        }
        Ok(())
    }
}

/// Largest page width or height accepted, in page units.
pub const MAX_PAGE_EXTENT: f64 = 100_000.0;

/// A single positioned character with its font metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub text: String,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
    pub size: f64,
    pub font: String,
}

impl Glyph {
    pub fn new(
        text: impl Into<String>,
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        size: f64,
        font: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            left,
            right,
            bottom,
            top,
            size,
            font: font.into(),
        }
    }

    /// Build a glyph from a layout-XML bounding box.
    pub fn from_bbox(text: impl Into<String>, bbox: BoundingBox, size: f64, font: impl Into<String>) -> Self {
        Self::new(text, bbox.left, bbox.right, bbox.bottom, bbox.top, size, font)
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    pub(crate) fn span(&self) -> VerticalSpan {
        VerticalSpan::new(self.bottom, self.top)
    }

    /// Check the geometry invariants the assemblers rely on.
    ///
    /// Zero-width glyphs are tolerated; zero-height ones are not, since the
    /// overlap fraction divides by height.
    pub fn validate(&self) -> Result<(), String> {
        let coords = [self.left, self.right, self.bottom, self.top, self.size];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(format!("glyph {:?} has a non-finite coordinate or size", self.text));
        }
        if self.top <= self.bottom {
            return Err(format!(
                "glyph {:?} has top {} not above bottom {}",
                self.text, self.top, self.bottom
            ));
        }
        if self.right < self.left {
            return Err(format!(
                "glyph {:?} has right {} left of left {}",
                self.text, self.right, self.left
            ));
        }
        Ok(())
    }
}

/// The vertical extent of a glyph, word or line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VerticalSpan {
    pub bottom: f64,
    pub top: f64,
}

impl VerticalSpan {
    pub fn new(bottom: f64, top: f64) -> Self {
        Self { bottom, top }
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    pub fn union(self, other: VerticalSpan) -> VerticalSpan {
        VerticalSpan::new(self.bottom.min(other.bottom), self.top.max(other.top))
    }

    /// Shared height relative to the shorter of the two spans.
    ///
    /// Equals `max(shared / self.height, shared / other.height)`; negative
    /// when the spans are disjoint.
    pub fn overlap_fraction(&self, other: &VerticalSpan) -> f64 {
        let shared = self.top.min(other.top) - self.bottom.max(other.bottom);
        (shared / self.height()).max(shared / other.height())
    }
}

/// Most common font by weight; ties go to the lexicographically smallest name.
pub(crate) fn dominant_font<'a>(fonts: impl IntoIterator<Item = (&'a str, usize)>) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (font, weight) in fonts {
        *counts.entry(font).or_default() += weight;
    }
    counts
        .into_iter()
        .min_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .map(|(font, _)| font.to_string())
        .unwrap_or_default()
}
