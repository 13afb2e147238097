//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline reconstructs each page.
//!
//! # Example
//!
//! ```rust
//! use rsc2md::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_id: u32, total_pages: usize, markdown_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {} of {} done ({} bytes)", page_id, total_pages, markdown_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each page.
///
/// Pages run concurrently on the blocking thread pool, so `on_page_start`,
/// `on_page_complete` and `on_page_error` may be called from different
/// threads at once. Implementations must protect shared mutable state with
/// appropriate synchronisation primitives (e.g. `Mutex`, `AtomicUsize`).
/// All methods have default no-op implementations.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the layout XML is loaded, before any page runs.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages that will be processed
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page enters the pipeline.
    fn on_page_start(&self, page_id: u32, total_pages: usize) {
        let _ = (page_id, total_pages);
    }

    /// Called when a page is reconstructed.
    ///
    /// # Arguments
    /// * `page_id`      — page identifier from the layout XML
    /// * `total_pages`  — total pages being processed
    /// * `markdown_len` — combined byte length of the English and French Markdown
    fn on_page_complete(&self, page_id: u32, total_pages: usize, markdown_len: usize) {
        let _ = (page_id, total_pages, markdown_len);
    }

    /// Called when a page fails.
    ///
    /// # Arguments
    /// * `page_id`     — page identifier from the layout XML
    /// * `total_pages` — total pages being processed
    /// * `error`       — human-readable error description
    fn on_page_error(&self, page_id: u32, total_pages: usize, error: &str) {
        let _ = (page_id, total_pages, error);
    }

    /// Called once after all pages have been attempted.
    ///
    /// # Arguments
    /// * `total_pages`   — pages attempted
    /// * `success_count` — pages that converted without error
    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
