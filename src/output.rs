//! Result types returned by the conversion entry points.
//!
//! Everything here is `Serialize` so the CLI can emit it verbatim with
//! `--json`.

use crate::error::{PageError, Rsc2MdError};
use crate::pipeline::columns::{ColumnMargins, VerticalBand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of reconstructing a single page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// Page id from the layout XML.
    pub page_id: u32,

    /// English (left column) Markdown. Empty when the page failed.
    pub english: String,

    /// French (right column) Markdown. Empty when the page failed.
    pub french: String,

    /// Plain text of each English line, top to bottom.
    pub english_lines: Vec<String>,

    /// Plain text of each French line, top to bottom.
    pub french_lines: Vec<String>,

    /// Column margins recovered for the page.
    pub margins: Option<ColumnMargins>,

    /// Words assembled from the page's glyphs.
    pub words: usize,

    /// Words dropped as running headers or footers.
    pub words_removed: usize,

    /// Why the page failed, if it did.
    pub error: Option<PageError>,

    /// Wall-clock time spent on the page.
    pub duration_ms: u64,
}

impl PageResult {
    /// A result carrying only a failure.
    pub fn failed(error: PageError) -> Self {
        Self {
            page_id: error.page(),
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate counters over a conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages selected and found in the document.
    pub total_pages: usize,
    /// Pages reconstructed without error.
    pub processed_pages: usize,
    /// Pages whose output was withheld.
    pub failed_pages: usize,
    pub total_words: usize,
    pub words_removed: usize,
    pub english_lines: usize,
    pub french_lines: usize,
    pub total_duration_ms: u64,
}

impl ConversionStats {
    /// Tally counters over page results.
    pub fn from_pages(pages: &[PageResult], total_duration_ms: u64) -> Self {
        let ok = || pages.iter().filter(|p| p.is_ok());
        Self {
            total_pages: pages.len(),
            processed_pages: ok().count(),
            failed_pages: pages.len() - ok().count(),
            total_words: ok().map(|p| p.words).sum(),
            words_removed: ok().map(|p| p.words_removed).sum(),
            english_lines: ok().map(|p| p.english_lines.len()).sum(),
            french_lines: ok().map(|p| p.french_lines.len()).sum(),
            total_duration_ms,
        }
    }
}

/// Both language documents plus per-page detail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Assembled English Markdown, pages in id order.
    pub english: String,
    /// Assembled French Markdown, pages in id order.
    pub french: String,
    /// Per-page results sorted by page id, failures included.
    pub pages: Vec<PageResult>,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Turn any failed page into an error.
    pub fn into_result(self) -> Result<Self, Rsc2MdError> {
        if self.stats.failed_pages > 0 {
            return Err(Rsc2MdError::PartialFailure {
                success: self.stats.processed_pages,
                failed: self.stats.failed_pages,
                total: self.stats.total_pages,
            });
        }
        Ok(self)
    }
}

/// Files written for one table-of-contents chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterOutput {
    pub chapter: String,
    pub english_path: PathBuf,
    pub french_path: PathBuf,
    pub stats: ConversionStats,
}

/// Layout diagnostics for one page, without rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageInspection {
    pub page_id: u32,
    pub glyphs: usize,
    pub words: usize,
    pub text_extents: Option<(f64, f64)>,
    pub band: Option<VerticalBand>,
    pub margins: Option<ColumnMargins>,
    pub error: Option<PageError>,
}
