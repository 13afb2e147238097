//! Removal of running headers and footers that straddle the gutter.
//!
//! A word is *troublesome* when it crosses the gutter, which body text never
//! does. Troublesome words above the body band mark a header: everything
//! whose top rises above the lowest such word goes. Symmetrically for
//! footers below the band.
//!
//! This removes by vertical position, so same-column text that happens to sit
//! above a header (or below a footer) is removed with it.

use super::columns::{PageLayout, VerticalBand};
use super::page::Page;
use crate::config::LayoutConfig;
use crate::error::LayoutError;
use tracing::debug;

impl Page {
    /// Drop header and footer words, returning how many were removed.
    ///
    /// Computes the column layout first if needed. Filtering uses the band
    /// cached with the layout, so running it twice removes nothing more.
    pub fn remove_troublesome_lines(&mut self, config: &LayoutConfig) -> Result<usize, LayoutError> {
        self.compute_column_margins(config)?;
        let Some(PageLayout { margins, band }) = self.layout else {
            return Err(LayoutError::NoText);
        };

        let troublesome = self
            .words
            .iter()
            .filter(|w| w.left() <= margins.right_gap_edge && w.right() >= margins.left_gap_edge);

        let (mut header_floor, mut footer_ceiling) = (None::<f64>, None::<f64>);
        for word in troublesome {
            if word.top() > band.top {
                header_floor = Some(header_floor.map_or(word.bottom(), |f| f.min(word.bottom())));
            }
            if word.bottom() < band.bottom {
                footer_ceiling = Some(footer_ceiling.map_or(word.top(), |c| c.max(word.top())));
            }
        }

        let before = self.words.len();
        self.words.retain(|w| {
            let in_header = header_floor.is_some_and(|floor| w.top() > floor);
            let in_footer = footer_ceiling.is_some_and(|ceiling| w.bottom() < ceiling);
            !(in_header || in_footer)
        });
        let removed = before - self.words.len();

        debug!(
            page = self.id(),
            removed,
            header_floor,
            footer_ceiling,
            "Removed running header/footer words"
        );
        Ok(removed)
    }

    /// Vertical band used by the last layout sweep.
    pub fn body_band(&self) -> Option<VerticalBand> {
        self.layout.map(|l| l.band)
    }
}
