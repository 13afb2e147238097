//! Pipeline stages for statute layout reconstruction.
//!
//! Each submodule implements exactly one transformation step. Only
//! [`input`] and [`load`] touch the file system; every later stage is a pure,
//! synchronous function of one page.
//!
//! ## Data Flow
//!
//! ```text
//! load ──▶ words ──▶ columns ──▶ noise ──▶ lines ──▶ markdown ──▶ postprocess
//! (XML)   (glyphs)  (margins)  (headers) (EN / FR)  (headings)   (tidy)
//! ```
//!
//! 1. [`load`]     — stream the layout XML, keeping the glyphs of selected pages
//! 2. [`words`]    — fold each page's glyph stream into words
//! 3. [`columns`]  — sweep an occupancy histogram to find the gutter and the
//!    outer column margins
//! 4. [`noise`]    — drop running headers and footers that cross the gutter
//! 5. [`lines`]    — group each column's words into lines; left is English,
//!    right is French
//! 6. [`markdown`] — classify lines as headings, sections or sub-paragraphs
//! 7. [`postprocess`] — per-line text cleanup and final document tidying

pub mod columns;
pub mod glyph;
pub mod input;
pub mod lines;
pub mod load;
pub mod markdown;
pub mod noise;
pub mod page;
pub mod postprocess;
pub mod words;

#[cfg(test)]
pub(crate) mod test_support;
