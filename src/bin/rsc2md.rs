//! CLI binary for rsc2md.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rsc2md::{
    convert, convert_to_files, convert_toc, inspect, ConversionConfig,
    ConversionProgressCallback, ConversionStats, LayoutConfig, PageSelection, PageSeparator,
    ProgressCallback,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────

/// Live progress bar with one log line per page. Pages complete out of
/// order when several run at once.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<u32, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// The bar length is set by `on_conversion_start`.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading layout XML…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    fn elapsed_ms(&self, page_id: u32) -> u128 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(&page_id))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Reconstructing {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_id: u32, _total: usize) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(page_id, Instant::now());
        }
        self.bar.set_message(format!("page {page_id}"));
    }

    fn on_page_complete(&self, page_id: u32, _total: usize, markdown_len: usize) {
        let elapsed_ms = self.elapsed_ms(page_id);
        self.bar.println(format!(
            "  {} Page {:>4}  {:<12}  {}",
            green("✓"),
            page_id,
            dim(&format!("{markdown_len:>6} chars")),
            dim(&format!("{elapsed_ms}ms")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_id: u32, _total: usize, error: &str) {
        let elapsed_ms = self.elapsed_ms(page_id);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} Page {:>4}  {}  {}",
            red("✗"),
            page_id,
            red(&msg),
            dim(&format!("{elapsed_ms}ms")),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages converted  ({} failed)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Both languages to stdout
  rsc2md statutes.xml

  # One chapter, written to separate files
  rsc2md --pages 24-31 statutes.xml --english en/A-1.md --french fr/A-1.md

  # Every chapter listed in a table of contents
  rsc2md statutes.xml --toc toc.csv --english en/ --french fr/

  # Show recovered column margins without rendering
  rsc2md --inspect-only --pages 24 statutes.xml

  # Tune thresholds for a different print run
  rsc2md --layout-config layout.json statutes.xml

TABLE OF CONTENTS:
  A CSV with a header row and the columns Chapter and Pages:

    Chapter,Pages
    A-1,24-31
    A-2,32-40

  Each chapter is written to <english>/<Chapter>.md and <french>/<Chapter>.md.

LAYOUT CONFIG:
  A JSON object overriding any LayoutConfig field, e.g.

    { "gutter_window_fraction": 0.25, "heading1_min_size": 8.0 }

ENVIRONMENT VARIABLES:
  RUST_LOG                Override the log filter (e.g. rsc2md=debug)
"#;

/// Convert the layout XML of bilingual statutes to English and French Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "rsc2md",
    version,
    about = "Convert bilingual statute layout XML to English and French Markdown",
    long_about = "Rebuild words, lines and the two language columns of the Revised Statutes \
of Canada from per-glyph layout XML, drop running headers and footers, and render each \
language as Markdown with headings, numbered sections and lettered sub-paragraphs.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Layout XML file (one <page> per page, one <text> per glyph).
    input: PathBuf,

    /// Page selection by page id: all, 24, 24-31, or 24,26,31.
    #[arg(long, env = "RSC2MD_PAGES", default_value = "all")]
    pages: String,

    /// Table-of-contents CSV; converts every chapter it lists.
    #[arg(long, env = "RSC2MD_TOC", requires = "english")]
    toc: Option<PathBuf>,

    /// English output file (or directory with --toc).
    #[arg(long, env = "RSC2MD_ENGLISH", requires = "french")]
    english: Option<PathBuf>,

    /// French output file (or directory with --toc).
    #[arg(long, env = "RSC2MD_FRENCH", requires = "english")]
    french: Option<PathBuf>,

    /// Which language to print when writing to stdout.
    #[arg(long, env = "RSC2MD_LANGUAGE", value_enum, default_value = "both")]
    language: LanguageArg,

    /// Number of pages reconstructed concurrently.
    #[arg(short, long, env = "RSC2MD_CONCURRENCY", default_value_t = default_concurrency())]
    concurrency: usize,

    /// Page separator: none, hr, comment, or custom string.
    #[arg(long, env = "RSC2MD_SEPARATOR", default_value = "none")]
    separator: String,

    /// Fail the whole run if any page fails.
    #[arg(long, env = "RSC2MD_STRICT")]
    strict: bool,

    /// JSON file overriding layout thresholds.
    #[arg(long, env = "RSC2MD_LAYOUT_CONFIG")]
    layout_config: Option<PathBuf>,

    /// Output structured JSON instead of Markdown.
    #[arg(long, env = "RSC2MD_JSON")]
    json: bool,

    /// Print per-page layout diagnostics only, no rendering.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "RSC2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RSC2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "RSC2MD_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LanguageArg {
    Both,
    English,
    French,
}

fn default_concurrency() -> usize {
    ConversionConfig::default().concurrency
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless -v is given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let pages = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect layout XML")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&pages).context("Failed to serialise inspection")?
            );
        } else {
            println!("File:  {}", cli.input.display());
            for page in &pages {
                print!(
                    "Page {:>4}  {:>6} glyphs  {:>5} words",
                    page.page_id, page.glyphs, page.words
                );
                match (&page.margins, &page.error) {
                    (Some(m), _) => println!(
                        "  margins {:.1} | {:.1}  gutter  {:.1} | {:.1}",
                        m.left_edge, m.left_gap_edge, m.right_gap_edge, m.right_edge
                    ),
                    (None, Some(e)) => println!("  {}", red(&e.to_string())),
                    (None, None) => println!(),
                }
            }
        }
        return Ok(());
    }

    // ── Table of contents ────────────────────────────────────────────────
    if let (Some(toc), Some(english), Some(french)) = (&cli.toc, &cli.english, &cli.french) {
        let chapters = convert_toc(&cli.input, toc, english, french, &config)
            .await
            .context("Conversion failed")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&chapters).context("Failed to serialise output")?
            );
        } else if !cli.quiet {
            for chapter in &chapters {
                eprintln!(
                    "  {}  {:<12} {}/{} pages  →  {}, {}",
                    status_mark(&chapter.stats),
                    chapter.chapter,
                    chapter.stats.processed_pages,
                    chapter.stats.total_pages,
                    dim(&chapter.english_path.display().to_string()),
                    dim(&chapter.french_path.display().to_string()),
                );
            }
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    if let (Some(english), Some(french)) = (&cli.english, &cli.french) {
        let stats = convert_to_files(&cli.input, english, french, &config)
            .await
            .context("Conversion failed")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?
            );
        } else if !cli.quiet {
            eprintln!(
                "{}  {}/{} pages  {}ms  →  {}, {}",
                status_mark(&stats),
                stats.processed_pages,
                stats.total_pages,
                stats.total_duration_ms,
                bold(&english.display().to_string()),
                bold(&french.display().to_string()),
            );
            print_counts(&stats);
        }
    } else {
        let output = convert(&cli.input, &config)
            .await
            .context("Conversion failed")?;

        if cli.json {
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            println!("{json}");
        } else {
            let markdown = match cli.language {
                LanguageArg::English => output.english.clone(),
                LanguageArg::French => output.french.clone(),
                LanguageArg::Both => format!("{}\n---\n\n{}", output.english, output.french),
            };
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(markdown.as_bytes())
                .context("Failed to write to stdout")?;
        }

        if !cli.quiet && !cli.json {
            if !show_progress {
                eprintln!(
                    "Converted {}/{} pages in {}ms",
                    output.stats.processed_pages,
                    output.stats.total_pages,
                    output.stats.total_duration_ms
                );
            }
            print_counts(&output.stats);
        }
    }

    Ok(())
}

fn status_mark(stats: &ConversionStats) -> String {
    if stats.failed_pages == 0 {
        green("✔")
    } else {
        cyan("⚠")
    }
}

fn print_counts(stats: &ConversionStats) {
    eprintln!(
        "   {} English lines  /  {} French lines  /  {} header words dropped",
        dim(&stats.english_lines.to_string()),
        dim(&stats.french_lines.to_string()),
        dim(&stats.words_removed.to_string()),
    );
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let layout = match cli.layout_config {
        Some(ref path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read layout config from {:?}", path))?;
            serde_json::from_str::<LayoutConfig>(&raw)
                .with_context(|| format!("Invalid layout config in {:?}", path))?
        }
        None => LayoutConfig::default(),
    };

    let pages: PageSelection = cli.pages.parse().context("Invalid --pages")?;
    let separator: PageSeparator = match cli.separator.parse() {
        Ok(sep) => sep,
        Err(never) => match never {},
    };

    let mut builder = ConversionConfig::builder()
        .layout(layout)
        .concurrency(cli.concurrency)
        .pages(pages)
        .page_separator(separator)
        .strict(cli.strict);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
