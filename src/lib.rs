//! # rsc2md
//!
//! Reconstruct bilingual Markdown from the glyph layout of scanned Revised
//! Statutes of Canada.
//!
//! ## Why this crate?
//!
//! Each page of the statute books sets the English text in the left column
//! and the French text in the right. Text extraction of the scans yields
//! positioned characters, not prose: headers run across both columns, words
//! arrive as loose glyphs, and nothing says which column a line belongs to.
//! This crate rebuilds words, lines and columns purely from glyph geometry
//! and renders each language as its own Markdown document, with headings,
//! numbered sections and lettered sub-paragraphs recovered from typography.
//!
//! ## Pipeline Overview
//!
//! ```text
//! layout XML
//!  │
//!  ├─ 1. Load     stream <page>/<text> elements of the selected pages
//!  ├─ 2. Words    fold adjacent glyphs into words
//!  ├─ 3. Columns  occupancy sweep → gutter and outer margins
//!  ├─ 4. Noise    drop running headers/footers crossing the gutter
//!  ├─ 5. Lines    left column = English, right column = French
//!  ├─ 6. Render   headings, **N.** sections, (a) sub-paragraphs
//!  └─ 7. Output   one document per language + per-page stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rsc2md::{convert, ConversionConfig, PageSelection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .pages(PageSelection::Range(24, 31))
//!         .build()?;
//!     let output = convert("statutes.xml", &config).await?;
//!     println!("{}", output.english);
//!     eprintln!("{} pages, {} words removed as headers",
//!         output.stats.processed_pages,
//!         output.stats.words_removed);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `rsc2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! rsc2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;
pub mod toc;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, LayoutConfig, PageSelection, PageSeparator};
pub use convert::{
    convert, convert_from_bytes, convert_page, convert_sync, convert_to_files, convert_toc, inspect,
};
pub use error::{LayoutError, PageError, Rsc2MdError};
pub use output::{ChapterOutput, ConversionOutput, ConversionStats, PageInspection, PageResult};
pub use pipeline::columns::ColumnMargins;
pub use pipeline::glyph::{BoundingBox, Glyph};
pub use pipeline::load::PageGlyphs;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_stream, PageStream};
pub use toc::Chapter;
