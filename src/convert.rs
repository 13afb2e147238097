//! Eager (full-document) conversion entry points.
//!
//! These functions wait for every selected page, then assemble one English
//! and one French Markdown document in page-id order. Use
//! [`crate::stream::convert_stream`] instead to receive pages as they finish.
//!
//! Pages share no state. Each runs on Tokio's blocking pool, at most
//! [`ConversionConfig::concurrency`] at a time; the per-page pipeline itself
//! is synchronous and deterministic, so nothing is retried or timed out.

use crate::config::{ConversionConfig, LayoutConfig, PageSelection};
use crate::error::{LayoutError, PageError, Rsc2MdError};
use crate::output::{ChapterOutput, ConversionOutput, ConversionStats, PageInspection, PageResult};
use crate::pipeline::columns::vertical_band;
use crate::pipeline::input::looks_like_xml;
use crate::pipeline::lines::Line;
use crate::pipeline::load::{load_pages, read_pages, LoadedPage, PageGlyphs};
use crate::pipeline::markdown::convert_to_markdown;
use crate::pipeline::page::Page;
use crate::pipeline::postprocess::tidy_document;
use crate::toc::read_toc;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Reconstruct one page: words, layout, noise filter, language split and
/// Markdown for both columns.
///
/// A page without any glyph converts to empty Markdown. Any other failure
/// withholds the whole page.
pub fn convert_page(page: PageGlyphs, layout: &LayoutConfig) -> Result<PageResult, PageError> {
    let start = Instant::now();
    let id = page.id;

    validate_geometry(&page)?;

    let mut page = Page::from_glyphs(id, page.bbox, page.glyphs, layout);
    let words = page.words().len();
    if words == 0 {
        debug!(page = id, "Page has no text");
        return Ok(PageResult {
            page_id: id,
            duration_ms: start.elapsed().as_millis() as u64,
            ..PageResult::default()
        });
    }

    let layout_error = |source: LayoutError| PageError::Layout { page: id, source };
    let margins = page.compute_column_margins(layout).map_err(layout_error)?;
    let words_removed = page.remove_troublesome_lines(layout).map_err(layout_error)?;

    let split = page.split_languages(&margins, layout);
    let plain = |lines: &[Line<'_>]| lines.iter().map(Line::text).collect::<Vec<_>>();

    let result = PageResult {
        page_id: id,
        english: convert_to_markdown(&split.english, layout),
        french: convert_to_markdown(&split.french, layout),
        english_lines: plain(&split.english),
        french_lines: plain(&split.french),
        margins: Some(margins),
        words,
        words_removed,
        error: None,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    debug!(
        page = id,
        words,
        words_removed,
        english_lines = result.english_lines.len(),
        french_lines = result.french_lines.len(),
        "Page converted"
    );
    Ok(result)
}

/// Convert the selected pages of a layout XML file.
///
/// # Returns
/// `Ok(ConversionOutput)` on success, even if some pages failed
/// (check `output.stats.failed_pages`, or call
/// [`ConversionOutput::into_result`]).
///
/// # Errors
/// Returns `Err(Rsc2MdError)` only for fatal errors:
/// - File not found / permission denied / not XML
/// - Malformed XML, or none of the selected pages present
/// - Every page failed, or any page failed in strict mode
pub async fn convert(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Rsc2MdError> {
    let started = Instant::now();
    let input = input.as_ref().to_path_buf();
    info!("Starting conversion: {} (pages: {})", input.display(), config.pages);

    let loaded = load_blocking(input, config.pages.clone()).await?;
    run_pages(loaded, config, started).await
}

/// Convert a layout XML document held in memory.
pub async fn convert_from_bytes(
    xml: &[u8],
    config: &ConversionConfig,
) -> Result<ConversionOutput, Rsc2MdError> {
    let started = Instant::now();
    if !looks_like_xml(xml) {
        return Err(Rsc2MdError::NotXml {
            path: PathBuf::from("<memory>"),
            magic: xml.iter().take(8).copied().collect(),
        });
    }
    let loaded = read_pages(xml, &config.pages, "<memory>")?;
    run_pages(loaded, config, started).await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Rsc2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Rsc2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input, config))
}

/// Convert and write the English and French documents to files.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_files(
    input: impl AsRef<Path>,
    english_path: impl AsRef<Path>,
    french_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Rsc2MdError> {
    let output = convert(input, config).await?;
    write_atomic(english_path.as_ref(), &output.english).await?;
    write_atomic(french_path.as_ref(), &output.french).await?;
    Ok(output.stats)
}

/// Convert every chapter listed in a table-of-contents CSV.
///
/// Writes `<english_dir>/<Chapter>.md` and `<french_dir>/<Chapter>.md` for
/// each row. The layout XML is read once for all chapters; `config.pages`
/// is ignored in favour of the chapters' ranges.
///
/// # Errors
/// Fails before writing anything when the table of contents is invalid or a
/// chapter has none of its pages in the document. Page failures are handled
/// per chapter as in [`convert`].
pub async fn convert_toc(
    input: impl AsRef<Path>,
    toc: impl AsRef<Path>,
    english_dir: impl AsRef<Path>,
    french_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<Vec<ChapterOutput>, Rsc2MdError> {
    let started = Instant::now();
    let chapters = read_toc(toc.as_ref())?;
    if chapters.is_empty() {
        warn!("Table of contents {} lists no chapters", toc.as_ref().display());
        return Ok(Vec::new());
    }
    info!(
        "Converting {} chapter(s) from {}",
        chapters.len(),
        input.as_ref().display()
    );

    let wanted = PageSelection::Ranges(
        chapters
            .iter()
            .map(|c| (c.first_page, c.last_page))
            .collect(),
    );
    let loaded = load_blocking(input.as_ref().to_path_buf(), wanted).await?;
    let present: Vec<u32> = loaded.iter().map(loaded_page_id).collect();
    for chapter in &chapters {
        if !present.iter().any(|id| chapter.pages().contains(*id)) {
            return Err(Rsc2MdError::NoPagesFound {
                selection: format!("{} ({})", chapter.pages(), chapter.name),
            });
        }
    }

    let pages = process_with_callbacks(loaded, config).await;

    let mut outputs = Vec::with_capacity(chapters.len());
    for chapter in &chapters {
        let chapter_pages: Vec<PageResult> = pages
            .iter()
            .filter(|p| chapter.pages().contains(p.page_id))
            .cloned()
            .collect();
        let output = assemble_output(chapter_pages, config, started)?;

        let english_path = english_dir.as_ref().join(chapter.file_name());
        let french_path = french_dir.as_ref().join(chapter.file_name());
        write_atomic(&english_path, &output.english).await?;
        write_atomic(&french_path, &output.french).await?;
        info!(
            "Chapter {}: {}/{} pages",
            chapter.name, output.stats.processed_pages, output.stats.total_pages
        );

        outputs.push(ChapterOutput {
            chapter: chapter.name.clone(),
            english_path,
            french_path,
            stats: output.stats,
        });
    }
    Ok(outputs)
}

/// Report each selected page's layout without rendering it.
///
/// Useful for tuning [`LayoutConfig`] against a new document.
pub async fn inspect(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<Vec<PageInspection>, Rsc2MdError> {
    let input = input.as_ref().to_path_buf();
    let selection = config.pages.clone();
    let layout = config.layout;
    tokio::task::spawn_blocking(move || -> Result<Vec<PageInspection>, Rsc2MdError> {
        let pages = load_pages(&input, &selection)?;
        Ok(pages
            .into_iter()
            .map(|page| inspect_page(page, &layout))
            .collect())
    })
    .await
    .map_err(|e| Rsc2MdError::Internal(format!("inspection task failed: {e}")))?
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn loaded_page_id(page: &LoadedPage) -> u32 {
    match page {
        Ok(p) => p.id,
        Err(e) => e.page(),
    }
}

/// Reject pages whose bbox or glyphs cannot be swept.
fn validate_geometry(page: &PageGlyphs) -> Result<(), PageError> {
    let malformed = |detail| PageError::MalformedGlyph {
        page: page.id,
        detail,
    };
    page.bbox.validate_page().map_err(malformed)?;
    for glyph in &page.glyphs {
        glyph.validate().map_err(malformed)?;
    }
    Ok(())
}

fn inspect_page(loaded: LoadedPage, layout: &LayoutConfig) -> PageInspection {
    let glyphs = match loaded {
        Ok(glyphs) => glyphs,
        Err(error) => {
            return PageInspection {
                page_id: error.page(),
                error: Some(error),
                ..PageInspection::default()
            }
        }
    };
    let id = glyphs.id;
    let glyph_count = glyphs.glyphs.len();
    if let Err(error) = validate_geometry(&glyphs) {
        return PageInspection {
            page_id: id,
            glyphs: glyph_count,
            error: Some(error),
            ..PageInspection::default()
        };
    }
    let mut page = Page::from_glyphs(id, glyphs.bbox, glyphs.glyphs, layout);
    let margins = page.compute_column_margins(layout);
    PageInspection {
        page_id: id,
        glyphs: glyph_count,
        words: page.words().len(),
        text_extents: page.text_extents(),
        band: vertical_band(page.words(), layout),
        margins: margins.as_ref().ok().copied(),
        error: margins
            .err()
            .map(|source| PageError::Layout { page: id, source }),
    }
}

async fn load_blocking(
    path: PathBuf,
    selection: PageSelection,
) -> Result<Vec<LoadedPage>, Rsc2MdError> {
    tokio::task::spawn_blocking(move || load_pages(&path, &selection))
        .await
        .map_err(|e| Rsc2MdError::Internal(format!("loader task failed: {e}")))?
}

/// Run one loaded page on the blocking pool.
pub(crate) async fn process_page(loaded: LoadedPage, layout: LayoutConfig) -> PageResult {
    let page_id = loaded_page_id(&loaded);
    let result = match loaded {
        Ok(glyphs) => tokio::task::spawn_blocking(move || convert_page(glyphs, &layout))
            .await
            .unwrap_or_else(|e| {
                Err(PageError::Aborted {
                    page: page_id,
                    detail: e.to_string(),
                })
            }),
        Err(e) => Err(e),
    };
    result.unwrap_or_else(|e| {
        warn!("Page {} failed: {}", page_id, e);
        PageResult::failed(e)
    })
}

/// Process pages concurrently, firing per-page progress events.
async fn process_concurrent(pages: Vec<LoadedPage>, config: &ConversionConfig) -> Vec<PageResult> {
    let total_pages = pages.len();
    stream::iter(pages.into_iter().map(|loaded| {
        let layout = config.layout;
        let callback = config.progress_callback.clone();
        async move {
            let page_id = loaded_page_id(&loaded);
            if let Some(ref cb) = callback {
                cb.on_page_start(page_id, total_pages);
            }
            let result = process_page(loaded, layout).await;
            if let Some(ref cb) = callback {
                match &result.error {
                    None => cb.on_page_complete(
                        page_id,
                        total_pages,
                        result.english.len() + result.french.len(),
                    ),
                    Some(e) => cb.on_page_error(page_id, total_pages, &e.to_string()),
                }
            }
            result
        }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await
}

/// [`process_concurrent`] bracketed by the conversion start/complete events.
async fn process_with_callbacks(
    pages: Vec<LoadedPage>,
    config: &ConversionConfig,
) -> Vec<PageResult> {
    let total = pages.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
    }
    let results = process_concurrent(pages, config).await;
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total, results.iter().filter(|p| p.is_ok()).count());
    }
    results
}

async fn run_pages(
    loaded: Vec<LoadedPage>,
    config: &ConversionConfig,
    started: Instant,
) -> Result<ConversionOutput, Rsc2MdError> {
    let pages = process_with_callbacks(loaded, config).await;
    let output = assemble_output(pages, config, started)?;
    info!(
        "Conversion complete: {}/{} pages, {}ms total",
        output.stats.processed_pages, output.stats.total_pages, output.stats.total_duration_ms
    );
    Ok(output)
}

/// Sort, apply the failure policy and join pages into both documents.
fn assemble_output(
    mut pages: Vec<PageResult>,
    config: &ConversionConfig,
    started: Instant,
) -> Result<ConversionOutput, Rsc2MdError> {
    pages.sort_by_key(|p| p.page_id);

    if config.strict {
        if let Some(err) = pages.iter().find_map(|p| p.error.clone()) {
            return Err(Rsc2MdError::PageFailed(err));
        }
    }

    let stats = ConversionStats::from_pages(&pages, started.elapsed().as_millis() as u64);
    if stats.total_pages > 0 && stats.processed_pages == 0 {
        let first_error = pages
            .iter()
            .find_map(|p| p.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(Rsc2MdError::AllPagesFailed {
            total: stats.total_pages,
            first_error,
        });
    }

    Ok(ConversionOutput {
        english: assemble_document(&pages, config, |p| &p.english),
        french: assemble_document(&pages, config, |p| &p.french),
        pages,
        stats,
    })
}

/// Join one language's page Markdown, separators between pages.
fn assemble_document(
    pages: &[PageResult],
    config: &ConversionConfig,
    markdown: impl Fn(&PageResult) -> &String,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    for (i, page) in pages.iter().filter(|p| p.is_ok()).enumerate() {
        if i > 0 {
            parts.push(config.page_separator.render(page.page_id));
        }
        parts.push(markdown(page).clone());
    }
    tidy_document(&parts.join(""))
}

async fn write_atomic(path: &Path, contents: &str) -> Result<(), Rsc2MdError> {
    let write_error = |source| Rsc2MdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_error)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(write_error)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::glyph::{BoundingBox, Glyph};

    /// Glyphs for `text` starting at `left`, one unit per character.
    fn glyph_run(text: &str, left: f64, bottom: f64, size: f64) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, c)| {
                let l = left + i as f64;
                Glyph::new(c.to_string(), l, l + 1.0, bottom, bottom + 4.0, size, "Courier")
            })
            .collect()
    }

    /// A bilingual page with `rows` lines per column and a running header.
    fn bilingual(id: u32, rows: &[(&str, &str)]) -> PageGlyphs {
        let mut glyphs = glyph_run("HEADERHEADERHEADERHEADER", 138.0, 380.0, 5.0);
        for (i, (en, fr)) in rows.iter().enumerate() {
            let bottom = 300.0 - 10.0 * i as f64;
            glyphs.extend(glyph_run(en, 1.0, bottom, 5.0));
            glyphs.extend(glyph_run(fr, 150.0, bottom, 5.0));
        }
        PageGlyphs {
            id,
            bbox: BoundingBox::new(0.0, 0.0, 300.0, 400.0),
            glyphs,
        }
    }

    fn rows() -> Vec<(String, String)> {
        (0..8)
            .map(|i| {
                // wide enough that every row covers the same column span
                (format!("{:_<139}", format!("en{i}")), format!("{:_<139}", format!("fr{i}")))
            })
            .collect()
    }

    fn sample_page(id: u32) -> PageGlyphs {
        let rows = rows();
        let refs: Vec<(&str, &str)> = rows.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
        bilingual(id, &refs)
    }

    #[test]
    fn convert_page_splits_languages() {
        let result = convert_page(sample_page(24), &LayoutConfig::default()).unwrap();
        assert_eq!(result.page_id, 24);
        assert_eq!(result.english_lines.len(), 8);
        assert_eq!(result.french_lines.len(), 8);
        assert!(result.english_lines[0].starts_with("en0_"));
        assert!(result.french_lines[7].starts_with("fr7_"));
        // underscores become spaces in the Markdown
        assert!(result.english.starts_with("en0 "));
        assert_eq!(result.words_removed, 1);
        let margins = result.margins.unwrap();
        assert_eq!(margins.left_gap_edge, 140.1);
        assert_eq!(margins.right_gap_edge, 149.9);
    }

    #[test]
    fn empty_page_converts_to_nothing() {
        let page = PageGlyphs {
            id: 3,
            bbox: BoundingBox::new(0.0, 0.0, 300.0, 400.0),
            glyphs: Vec::new(),
        };
        let result = convert_page(page, &LayoutConfig::default()).unwrap();
        assert!(result.english.is_empty() && result.french.is_empty());
        assert!(result.margins.is_none());
    }

    #[test]
    fn invalid_glyph_fails_the_page() {
        let mut page = sample_page(5);
        page.glyphs[3].top = page.glyphs[3].bottom;
        let err = convert_page(page, &LayoutConfig::default()).unwrap_err();
        assert!(matches!(err, PageError::MalformedGlyph { page: 5, .. }));
    }

    #[test]
    fn unbounded_page_fails_instead_of_sweeping() {
        let mut page = sample_page(6);
        page.bbox = BoundingBox::new(0.0, 0.0, f64::INFINITY, 400.0);
        let err = convert_page(page.clone(), &LayoutConfig::default()).unwrap_err();
        assert!(matches!(err, PageError::MalformedGlyph { page: 6, .. }), "got {err:?}");

        let inspection = inspect_page(Ok(page), &LayoutConfig::default());
        assert!(inspection.margins.is_none());
        assert!(matches!(inspection.error, Some(PageError::MalformedGlyph { .. })));
    }

    #[test]
    fn page_without_gutter_fails_with_layout_error() {
        let page = PageGlyphs {
            id: 9,
            bbox: BoundingBox::new(0.0, 0.0, 300.0, 400.0),
            glyphs: glyph_run(&"x".repeat(280), 1.0, 100.0, 5.0),
        };
        let err = convert_page(page, &LayoutConfig::default()).unwrap_err();
        assert!(matches!(err, PageError::Layout { page: 9, .. }), "got {err:?}");
    }

    #[test]
    fn assemble_orders_pages_and_separates_them() {
        let config = ConversionConfig::builder()
            .page_separator(crate::config::PageSeparator::Comment)
            .build()
            .unwrap();
        let page = |id: u32, text: &str| PageResult {
            page_id: id,
            english: format!("{text}\n"),
            french: format!("{text}-fr\n"),
            ..PageResult::default()
        };
        let pages = vec![page(26, "c"), page(24, "a"), page(25, "b")];
        let output = assemble_output(pages, &config, Instant::now()).unwrap();
        assert_eq!(
            output.english,
            "a\n\n<!-- page 25 -->\n\nb\n\n<!-- page 26 -->\n\nc\n"
        );
        assert_eq!(output.pages[0].page_id, 24);
        assert!(output.french.starts_with("a-fr\n"));
    }

    #[test]
    fn failed_pages_are_withheld() {
        let config = ConversionConfig::default();
        let ok = PageResult {
            page_id: 1,
            english: "kept\n".into(),
            ..PageResult::default()
        };
        let failed = PageResult::failed(PageError::Layout {
            page: 2,
            source: LayoutError::NoText,
        });
        let output = assemble_output(vec![failed.clone(), ok.clone()], &config, Instant::now()).unwrap();
        assert_eq!(output.english, "kept\n");
        assert_eq!(output.stats.failed_pages, 1);

        let strict = ConversionConfig::builder().strict(true).build().unwrap();
        let err = assemble_output(vec![failed.clone(), ok], &strict, Instant::now()).unwrap_err();
        assert!(matches!(err, Rsc2MdError::PageFailed(PageError::Layout { page: 2, .. })));

        let err = assemble_output(vec![failed], &config, Instant::now()).unwrap_err();
        assert!(matches!(err, Rsc2MdError::AllPagesFailed { total: 1, .. }));
    }

    #[tokio::test]
    async fn process_page_reports_loader_errors() {
        let loaded: LoadedPage = Err(PageError::MalformedGlyph {
            page: 4,
            detail: "no bbox".into(),
        });
        let result = process_page(loaded, LayoutConfig::default()).await;
        assert_eq!(result.page_id, 4);
        assert!(!result.is_ok());
    }

    #[test]
    fn inspect_page_reports_layout() {
        let inspection = inspect_page(Ok(sample_page(24)), &LayoutConfig::default());
        assert_eq!(inspection.page_id, 24);
        assert!(inspection.glyphs > 0);
        assert_eq!(inspection.words, 17);
        assert!(inspection.margins.is_some());
        assert!(inspection.error.is_none());
    }

    #[tokio::test]
    async fn write_atomic_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eng").join("A-1.md");
        write_atomic(&path, "text\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "text\n");
        assert!(!path.with_extension("md.tmp").exists());
    }
}
