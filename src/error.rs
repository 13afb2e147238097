//! Error types for the rsc2md library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`Rsc2MdError`] — **Fatal**: the conversion cannot proceed at all
//!   (missing input file, malformed XML, bad table of contents, unwritable
//!   output). Returned as `Err(Rsc2MdError)` from the top-level `convert*`
//!   functions.
//!
//! * [`PageError`] — **Per page**: one page could not be reconstructed
//!   (no gutter between the two language columns, a glyph without geometry)
//!   but every other page is fine. Stored inside
//!   [`crate::output::PageResult`] so callers decide whether to skip the
//!   page or abort the batch.
//!
//! * [`LayoutError`] — the reason a page's column layout could not be
//!   recovered. Always reported wrapped in [`PageError::Layout`] together
//!   with the page id.
//!
//! A page either completes every pipeline stage or its output is withheld
//! entirely; there is no partial-page recovery. The pipeline is
//! deterministic, so nothing is retried.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the rsc2md library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Rsc2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Layout XML file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but does not start like an XML document.
    #[error("File is not a layout XML document: '{path}'\nFirst bytes: {magic:?}")]
    NotXml { path: PathBuf, magic: Vec<u8> },

    /// The input file could not be read after it was opened.
    #[error("Failed to read '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The layout XML is not well formed.
    #[error("Malformed layout XML in '{source_name}' at byte {position}: {detail}")]
    XmlSyntax {
        source_name: String,
        position: usize,
        detail: String,
    },

    /// None of the selected pages exist in the document.
    #[error("No page matching '{selection}' was found in the document")]
    NoPagesFound { selection: String },

    // ── Table of contents errors ──────────────────────────────────────────
    /// The table-of-contents CSV could not be read or decoded.
    #[error("Failed to read table of contents '{path}': {source}")]
    TocReadFailed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A table-of-contents row is syntactically valid CSV but unusable.
    #[error("Invalid table of contents '{path}', row {row}: {detail}")]
    InvalidToc {
        path: PathBuf,
        row: usize,
        detail: String,
    },

    // ── Page outcome errors ───────────────────────────────────────────────
    /// Every selected page failed; output would be empty.
    #[error("All {total} pages failed.\nFirst error: {first_error}")]
    AllPagesFailed { total: usize, first_error: String },

    /// Some pages succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::ConversionOutput::into_result`] when
    /// the caller wants to treat any page failure as an error.
    #[error("{failed}/{total} pages failed during conversion")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    /// A page failed while the conversion runs in strict mode.
    #[error(transparent)]
    PageFailed(#[from] PageError),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation or option parsing failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failure confined to a single page.
///
/// Stored alongside [`crate::output::PageResult`] when a page fails. The
/// overall conversion continues unless every page fails or strict mode is on.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum PageError {
    /// The two-column layout could not be recovered.
    #[error("Page {page}: {source}")]
    Layout {
        page: u32,
        #[source]
        source: LayoutError,
    },

    /// A glyph (or the page itself) is missing required geometry or text.
    #[error("Page {page}: malformed glyph: {detail}")]
    MalformedGlyph { page: u32, detail: String },

    /// The worker processing the page panicked.
    #[error("Page {page}: processing aborted: {detail}")]
    Aborted { page: u32, detail: String },
}

impl PageError {
    /// Identifier of the page that failed.
    pub fn page(&self) -> u32 {
        match self {
            PageError::Layout { page, .. }
            | PageError::MalformedGlyph { page, .. }
            | PageError::Aborted { page, .. } => *page,
        }
    }
}

/// Why the gutter between the two language columns could not be located.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum LayoutError {
    /// The page carries no words, so there is nothing to sweep.
    #[error("no words to analyse")]
    NoText,

    /// Every sample inside the sweep window is covered by some word.
    #[error("no blank gutter between x={window_left:.1} and x={window_right:.1}")]
    GutterNotFound { window_left: f64, window_right: f64 },
}
