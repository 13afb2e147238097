//! Column layout analysis: find the blank gutter between the English and
//! French columns by sweeping a horizontal occupancy histogram.
//!
//! ## Algorithm
//!
//! 1. **Vertical band.** Running headers and footers may span the gutter, so
//!    only words whose bottom lies in the central band of distinct baselines
//!    contribute. The band drops `min(round(0.25 × n), 10)` of the `n`
//!    distinct bottoms from each end (round half to even).
//! 2. **Sweep.** Each in-band word increments every 0.1 step it covers.
//! 3. **Gutter.** Inside a window of 20% of the text width centred on
//!    `(text_right − text_left) / 2`, the first zero step opens the gutter;
//!    the gutter runs until occupancy turns non-zero again, even past the
//!    window.
//!    A gutter one step wide is still a gutter: its two edges coincide, the
//!    only case where `left_gap_edge == right_gap_edge`.
//! 4. **Outer margins.** The last zero step left of the gutter and the first
//!    zero step right of it bound the two columns.
//!
//! The centre is the half-width itself, not `text_left` plus the half-width.
//! On the statute scans the extractor reports stray marks near the page edge,
//! which keeps `text_left` close to zero and the two agree; other documents
//! whose text starts well inside the page need a wider
//! [`LayoutConfig::gutter_window_fraction`].

use super::glyph::MAX_PAGE_EXTENT;
use super::page::Page;
use super::words::Word;
use crate::config::LayoutConfig;
use crate::error::LayoutError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Sweep resolution, in steps per page unit.
const STEPS_PER_UNIT: f64 = 10.0;

fn to_step(x: f64) -> i64 {
    (x * STEPS_PER_UNIT).round() as i64
}

fn to_coord(step: i64) -> f64 {
    step as f64 / STEPS_PER_UNIT
}

/// The four x coordinates bounding the two language columns.
///
/// `left_edge ≤ left_gap_edge < right_gap_edge ≤ right_edge`, all on the
/// 0.1 grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnMargins {
    pub left_edge: f64,
    pub left_gap_edge: f64,
    pub right_gap_edge: f64,
    pub right_edge: f64,
}

impl ColumnMargins {
    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (
            self.left_edge,
            self.left_gap_edge,
            self.right_gap_edge,
            self.right_edge,
        )
    }
}

/// Range of word bottoms that counts as body text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerticalBand {
    pub bottom: f64,
    pub top: f64,
}

impl VerticalBand {
    pub fn contains(&self, y: f64) -> bool {
        self.bottom <= y && y <= self.top
    }
}

/// Result of a successful layout sweep, cached on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub margins: ColumnMargins,
    pub band: VerticalBand,
}

/// Dense per-step word counters across the page width.
#[derive(Debug, Clone, Default)]
pub(crate) struct Occupancy {
    origin: i64,
    counts: Vec<u32>,
}

impl Occupancy {
    /// An empty histogram when the span is not a usable page width.
    pub fn new(left: f64, right: f64) -> Self {
        let max_steps = to_step(MAX_PAGE_EXTENT) + 1;
        let origin = to_step(left);
        let len = to_step(right)
            .checked_sub(origin)
            .and_then(|d| d.checked_add(1))
            .filter(|&n| n > 0 && n <= max_steps && left.is_finite() && right.is_finite())
            .unwrap_or(0);
        Self {
            origin: if len == 0 { 0 } else { origin },
            counts: vec![0; len as usize],
        }
    }

    pub fn clear(&mut self) {
        self.counts.fill(0);
    }

    /// Count one word across `[left, right]`. Steps outside the page are dropped.
    pub fn add_span(&mut self, left: f64, right: f64) {
        if self.counts.is_empty() {
            return;
        }
        let first = to_step(left).max(self.first_step());
        let last = to_step(right).min(self.last_step());
        for step in first..=last {
            self.counts[(step - self.origin) as usize] += 1;
        }
    }

    pub fn count(&self, step: i64) -> u32 {
        step.checked_sub(self.origin)
            .and_then(|offset| usize::try_from(offset).ok())
            .and_then(|offset| self.counts.get(offset))
            .copied()
            .unwrap_or(0)
    }

    pub fn at(&self, x: f64) -> u32 {
        self.count(to_step(x))
    }

    pub fn first_step(&self) -> i64 {
        self.origin
    }

    pub fn last_step(&self) -> i64 {
        self.origin + self.counts.len() as i64 - 1
    }
}

/// Central band of distinct word bottoms, or `None` for a page without words.
pub fn vertical_band(words: &[Word], config: &LayoutConfig) -> Option<VerticalBand> {
    let mut bottoms: Vec<f64> = words.iter().map(Word::bottom).collect();
    bottoms.sort_by(f64::total_cmp);
    bottoms.dedup();

    let n = bottoms.len();
    if n == 0 {
        return None;
    }
    let trim = ((config.band_trim_fraction * n as f64).round_ties_even() as usize)
        .min(config.band_trim_max)
        .min((n - 1) / 2);

    Some(VerticalBand {
        bottom: bottoms[trim],
        top: bottoms[n - 1 - trim],
    })
}

impl Page {
    /// Locate the gutter and both outer column margins.
    ///
    /// The result is cached: later calls return the same margins without
    /// sweeping again.
    pub fn compute_column_margins(
        &mut self,
        config: &LayoutConfig,
    ) -> Result<ColumnMargins, LayoutError> {
        if let Some(layout) = self.layout {
            return Ok(layout.margins);
        }

        let band = vertical_band(&self.words, config).ok_or(LayoutError::NoText)?;
        let (text_left, text_right) = self.text_extents().ok_or(LayoutError::NoText)?;

        self.occupancy.clear();
        let mut swept = 0usize;
        for word in self.words.iter().filter(|w| band.contains(w.bottom())) {
            self.occupancy.add_span(word.left(), word.right());
            swept += 1;
        }

        let width = text_right - text_left;
        let mid = width / 2.0;
        let half_window = config.gutter_window_fraction * width / 2.0;
        let window_start = to_step(mid - half_window).max(self.occupancy.first_step());
        let window_end = to_step(mid + half_window).min(self.occupancy.last_step());

        let occupancy = &self.occupancy;
        let left_gap = (window_start..=window_end)
            .find(|&step| occupancy.count(step) == 0)
            .ok_or(LayoutError::GutterNotFound {
                window_left: to_coord(window_start),
                window_right: to_coord(window_end),
            })?;
        let mut right_gap = left_gap;
        while right_gap < occupancy.last_step() && occupancy.count(right_gap + 1) == 0 {
            right_gap += 1;
        }
        let left_edge = (occupancy.first_step()..left_gap)
            .rev()
            .find(|&step| occupancy.count(step) == 0)
            .unwrap_or(occupancy.first_step());
        let right_edge = match (right_gap + 1..=occupancy.last_step())
            .find(|&step| occupancy.count(step) == 0)
        {
            Some(step) => step,
            None => {
                warn!(
                    page = self.id(),
                    gutter_right = to_coord(right_gap),
                    "No blank step right of the gutter; right column will be empty"
                );
                right_gap
            }
        };

        let margins = ColumnMargins {
            left_edge: to_coord(left_edge),
            left_gap_edge: to_coord(left_gap),
            right_gap_edge: to_coord(right_gap),
            right_edge: to_coord(right_edge),
        };
        debug!(
            page = self.id(),
            swept,
            band_bottom = band.bottom,
            band_top = band.top,
            margins = ?margins.as_tuple(),
            "Column layout recovered"
        );

        self.layout = Some(PageLayout { margins, band });
        Ok(margins)
    }
}
