//! Streaming conversion API: emit pages as they complete.
//!
//! Unlike the eager [`crate::convert::convert`], which returns only after
//! every page finishes, [`convert_stream`] yields each page's
//! [`PageResult`] through a `Stream` as soon as it is reconstructed. Pages
//! may arrive out of order; sort by `page_id` if order matters.
//!
//! The stream carries per-page Markdown only. Joining pages with separators
//! and the final document tidy-up are left to the caller.

use crate::config::ConversionConfig;
use crate::convert::process_page;
use crate::error::{PageError, Rsc2MdError};
use crate::output::PageResult;
use crate::pipeline::load::load_pages;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of page results.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<PageResult, PageError>> + Send>>;

/// Convert a layout XML file, streaming pages as they are ready.
///
/// # Returns
/// - `Ok(PageStream)` — a stream of `Result<PageResult, PageError>`
/// - `Err(Rsc2MdError)` — fatal error (file not found, malformed XML, etc.)
///
/// # Example
/// ```rust,no_run
/// use rsc2md::{convert_stream, ConversionConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConversionConfig::default();
/// let mut stream = convert_stream("statutes.xml", &config).await?;
/// while let Some(page) = stream.next().await {
///     match page {
///         Ok(p) => println!("Page {}: {} English lines", p.page_id, p.english_lines.len()),
///         Err(e) => eprintln!("Error: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn convert_stream(
    input: impl AsRef<std::path::Path>,
    config: &ConversionConfig,
) -> Result<PageStream, Rsc2MdError> {
    let input = input.as_ref().to_path_buf();
    info!("Starting streaming conversion: {}", input.display());

    let selection = config.pages.clone();
    let loaded = tokio::task::spawn_blocking(move || load_pages(&input, &selection))
        .await
        .map_err(|e| Rsc2MdError::Internal(format!("loader task failed: {e}")))??;

    let layout = config.layout;
    let s = stream::iter(loaded.into_iter().map(move |page| async move {
        let mut result = process_page(page, layout).await;
        match result.error.take() {
            None => Ok(result),
            Some(err) => Err(err),
        }
    }))
    .buffer_unordered(config.concurrency);

    Ok(Box::pin(s))
}
