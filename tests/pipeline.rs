//! End-to-end conversion of synthetic layout XML written to disk.

use futures::StreamExt;
use rsc2md::{
    convert, convert_from_bytes, convert_stream, convert_to_files, convert_toc, inspect,
    ConversionConfig, ConversionProgressCallback, PageError, PageSelection, PageSeparator,
    Rsc2MdError,
};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// `<text>` elements for `text`, one unit wide per character.
fn glyph_run(xml: &mut String, text: &str, left: f64, bottom: f64, size: f64) {
    for (i, c) in text.chars().enumerate() {
        let l = left + i as f64;
        let _ = writeln!(
            xml,
            r#"<text font="Courier" bbox="{:.3},{:.3},{:.3},{:.3}" size="{:.3}">{}</text>"#,
            l,
            bottom,
            l + 1.0,
            bottom + 4.0,
            size,
            c
        );
    }
    xml.push_str("<text> </text>\n");
}

/// A two-column page: a running header across the gutter, then
/// `rows` lines of English on the left and French on the right.
fn bilingual_page(xml: &mut String, id: u32, rows: usize) {
    let _ = writeln!(xml, r#"<page id="{id}" bbox="0.000,0.000,300.000,400.000" rotate="0">"#);
    glyph_run(xml, "HEADERHEADERHEADERHEADER", 138.0, 380.0, 5.0);
    for i in 0..rows {
        let bottom = 300.0 - 10.0 * i as f64;
        glyph_run(xml, &format!("{:_<139}", format!("en{id}x{i}")), 1.0, bottom, 5.0);
        glyph_run(xml, &format!("{:_<139}", format!("fr{id}x{i}")), 150.0, bottom, 5.0);
    }
    xml.push_str("</page>\n");
}

/// A page whose single line runs straight across the middle.
fn single_column_page(xml: &mut String, id: u32) {
    let _ = writeln!(xml, r#"<page id="{id}" bbox="0,0,300,400" rotate="0">"#);
    glyph_run(xml, &"x".repeat(280), 1.0, 200.0, 5.0);
    xml.push_str("</page>\n");
}

fn document(bilingual: &[u32], single_column: &[u32]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n<pages>\n");
    let mut ids: Vec<u32> = bilingual.iter().chain(single_column).copied().collect();
    ids.sort_unstable();
    for id in ids {
        if bilingual.contains(&id) {
            bilingual_page(&mut xml, id, 6);
        } else {
            single_column_page(&mut xml, id);
        }
    }
    xml.push_str("</pages>\n");
    xml
}

fn write_document(dir: &TempDir, xml: &str) -> PathBuf {
    let path = dir.path().join("statutes.xml");
    std::fs::write(&path, xml).unwrap();
    path
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn converts_both_languages_in_page_order() {
    let dir = TempDir::new().unwrap();
    let input = write_document(&dir, &document(&[26, 24, 25], &[]));

    let config = ConversionConfig::builder().concurrency(3).build().unwrap();
    let output = convert(&input, &config).await.unwrap();

    let ids: Vec<u32> = output.pages.iter().map(|p| p.page_id).collect();
    assert_eq!(ids, vec![24, 25, 26]);
    assert_eq!(output.stats.processed_pages, 3);
    assert_eq!(output.stats.english_lines, 18);
    assert_eq!(output.stats.french_lines, 18);
    assert_eq!(output.stats.words_removed, 3);

    assert!(output.english.starts_with("en24x0\nen24x1\n"));
    assert!(output.french.starts_with("fr24x0\nfr24x1\n"));
    assert!(!output.english.contains("HEADER"));
    assert!(!output.english.contains("fr2"));
    assert!(!output.french.contains("en2"));
    let p25 = output.english.find("en25x0").unwrap();
    let p26 = output.english.find("en26x0").unwrap();
    assert!(p25 < p26);
}

#[tokio::test]
async fn assembled_documents_drop_trailing_padding() {
    let xml = document(&[24], &[]);
    let output = convert_from_bytes(xml.as_bytes(), &ConversionConfig::default())
        .await
        .unwrap();

    // per-page Markdown keeps each line as rendered
    let page = &output.pages[0];
    assert!(page.english.starts_with("en24x0 "));
    assert!(page.english.lines().next().unwrap().ends_with(' '));

    // the assembled document is tidied
    assert!(output.english.lines().all(|line| line == line.trim_end()));
    assert!(output.french.lines().all(|line| line == line.trim_end()));
    assert_eq!(
        output.english,
        (0..6).map(|i| format!("en24x{i}\n")).collect::<String>()
    );
}

#[tokio::test]
async fn page_selection_limits_conversion() {
    let dir = TempDir::new().unwrap();
    let input = write_document(&dir, &document(&[24, 25, 26], &[]));

    let config = ConversionConfig::builder()
        .pages(PageSelection::Set(vec![25]))
        .build()
        .unwrap();
    let output = convert(&input, &config).await.unwrap();
    assert_eq!(output.pages.len(), 1);
    assert!(output.english.contains("en25x0"));
    assert!(!output.english.contains("en24x0"));
}

#[tokio::test]
async fn failed_page_is_withheld() {
    let dir = TempDir::new().unwrap();
    let input = write_document(&dir, &document(&[24], &[25]));

    let output = convert(&input, &ConversionConfig::default()).await.unwrap();
    assert_eq!(output.stats.processed_pages, 1);
    assert_eq!(output.stats.failed_pages, 1);
    let failed = &output.pages[1];
    assert_eq!(failed.page_id, 25);
    assert!(matches!(failed.error, Some(PageError::Layout { page: 25, .. })));
    assert!(!output.english.contains("xxxx"));
}

#[tokio::test]
async fn strict_mode_fails_on_any_page() {
    let dir = TempDir::new().unwrap();
    let input = write_document(&dir, &document(&[24], &[25]));

    let config = ConversionConfig::builder().strict(true).build().unwrap();
    let err = convert(&input, &config).await.unwrap_err();
    assert!(matches!(err, Rsc2MdError::PageFailed(_)), "got {err:?}");
}

#[tokio::test]
async fn all_pages_failing_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = write_document(&dir, &document(&[], &[24, 25]));

    let err = convert(&input, &ConversionConfig::default()).await.unwrap_err();
    assert!(
        matches!(err, Rsc2MdError::AllPagesFailed { total: 2, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn separators_mark_page_boundaries() {
    let xml = document(&[24, 25], &[]);
    let config = ConversionConfig::builder()
        .page_separator(PageSeparator::Comment)
        .build()
        .unwrap();
    let output = convert_from_bytes(xml.as_bytes(), &config).await.unwrap();
    assert!(output.english.contains("\n<!-- page 25 -->\n\n"));
    assert!(!output.english.contains("<!-- page 24 -->"));
}

#[tokio::test]
async fn progress_callback_sees_every_page() {
    #[derive(Default)]
    struct Counter {
        started: AtomicUsize,
        completed: AtomicUsize,
        failed: AtomicUsize,
    }
    impl ConversionProgressCallback for Counter {
        fn on_page_start(&self, _page_id: u32, _total_pages: usize) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_page_complete(&self, _page_id: u32, _total_pages: usize, _len: usize) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_page_error(&self, _page_id: u32, _total_pages: usize, _error: &str) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    let dir = TempDir::new().unwrap();
    let input = write_document(&dir, &document(&[24, 26], &[25]));
    let counter = Arc::new(Counter::default());
    let config = ConversionConfig::builder()
        .progress_callback(counter.clone())
        .build()
        .unwrap();

    convert(&input, &config).await.unwrap();
    assert_eq!(counter.started.load(Ordering::SeqCst), 3);
    assert_eq!(counter.completed.load(Ordering::SeqCst), 2);
    assert_eq!(counter.failed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn writes_language_files() {
    let dir = TempDir::new().unwrap();
    let input = write_document(&dir, &document(&[24], &[]));
    let english = dir.path().join("out/en/A-1.md");
    let french = dir.path().join("out/fr/A-1.md");

    let stats = convert_to_files(&input, &english, &french, &ConversionConfig::default())
        .await
        .unwrap();
    assert_eq!(stats.processed_pages, 1);
    assert!(read(&english).starts_with("en24x0\n"));
    assert!(read(&french).starts_with("fr24x0\n"));
    assert!(!dir.path().join("out/en/A-1.md.tmp").exists());
}

#[tokio::test]
async fn converts_each_chapter_of_a_toc() {
    let dir = TempDir::new().unwrap();
    let input = write_document(&dir, &document(&[24, 25, 26, 27], &[]));
    let toc = dir.path().join("toc.csv");
    std::fs::write(&toc, "Chapter,Pages\nA-1,24-25\nA-2,26-27\n").unwrap();
    let en_dir = dir.path().join("en");
    let fr_dir = dir.path().join("fr");

    let chapters = convert_toc(&input, &toc, &en_dir, &fr_dir, &ConversionConfig::default())
        .await
        .unwrap();
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].chapter, "A-1");
    assert_eq!(chapters[0].stats.total_pages, 2);

    let a1 = read(&en_dir.join("A-1.md"));
    assert!(a1.contains("en24x0") && a1.contains("en25x5"));
    assert!(!a1.contains("en26x0"));
    let a2 = read(&fr_dir.join("A-2.md"));
    assert!(a2.contains("fr26x0") && a2.contains("fr27x5"));
    assert!(!a2.contains("fr25x0"));
}

#[tokio::test]
async fn toc_with_vast_range_loads_only_present_pages() {
    let dir = TempDir::new().unwrap();
    let input = write_document(&dir, &document(&[24, 25], &[]));
    let toc = dir.path().join("toc.csv");
    std::fs::write(&toc, "Chapter,Pages\nA-1,24\nALL,1-4000000000\n").unwrap();

    let chapters = convert_toc(
        &input,
        &toc,
        dir.path().join("en"),
        dir.path().join("fr"),
        &ConversionConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(chapters[0].stats.total_pages, 1);
    assert_eq!(chapters[1].stats.total_pages, 2);
    assert!(read(&dir.path().join("en/ALL.md")).contains("en25x5"));
}

#[tokio::test]
async fn toc_chapter_without_pages_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = write_document(&dir, &document(&[24], &[]));
    let toc = dir.path().join("toc.csv");
    std::fs::write(&toc, "Chapter,Pages\nA-1,24\nA-9,90-99\n").unwrap();

    let err = convert_toc(
        &input,
        &toc,
        dir.path().join("en"),
        dir.path().join("fr"),
        &ConversionConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Rsc2MdError::NoPagesFound { .. }), "got {err:?}");
    assert!(!dir.path().join("en/A-1.md").exists());
}

#[tokio::test]
async fn stream_yields_every_page() {
    let dir = TempDir::new().unwrap();
    let input = write_document(&dir, &document(&[24, 26], &[25]));

    let stream = convert_stream(&input, &ConversionConfig::default()).await.unwrap();
    let results: Vec<_> = stream.collect().await;
    assert_eq!(results.len(), 3);

    let mut ok: Vec<u32> = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|p| p.page_id)
        .collect();
    ok.sort_unstable();
    assert_eq!(ok, vec![24, 26]);
    let failed: Vec<u32> = results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .map(PageError::page)
        .collect();
    assert_eq!(failed, vec![25]);
}

#[tokio::test]
async fn inspect_reports_margins() {
    let dir = TempDir::new().unwrap();
    let input = write_document(&dir, &document(&[24], &[25]));

    let pages = inspect(&input, &ConversionConfig::default()).await.unwrap();
    assert_eq!(pages.len(), 2);
    let margins = pages[0].margins.unwrap();
    assert_eq!(margins.left_gap_edge, 140.1);
    assert_eq!(margins.right_gap_edge, 149.9);
    assert!(pages[0].words > 0);
    assert!(pages[1].margins.is_none());
    assert!(pages[1].error.is_some());
}

#[tokio::test]
async fn non_xml_input_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scan.pdf");
    std::fs::write(&path, b"%PDF-1.7\n").unwrap();

    let err = convert(&path, &ConversionConfig::default()).await.unwrap_err();
    assert!(matches!(err, Rsc2MdError::NotXml { .. }), "got {err:?}");
}

#[tokio::test]
async fn missing_selected_pages_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = write_document(&dir, &document(&[24], &[]));

    let config = ConversionConfig::builder()
        .pages(PageSelection::Range(100, 110))
        .build()
        .unwrap();
    let err = convert(&input, &config).await.unwrap_err();
    assert!(matches!(err, Rsc2MdError::NoPagesFound { .. }), "got {err:?}");
}
