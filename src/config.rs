//! Configuration types for statute layout reconstruction.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The geometric thresholds live in a
//! separate [`LayoutConfig`] because they are tuned to one document's
//! typography: retargeting the pipeline to another bilingual statute means
//! loading a different `LayoutConfig` (the CLI reads one from JSON), not
//! touching the orchestration knobs.

use crate::error::Rsc2MdError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Geometric and typographic thresholds used by every pipeline stage.
///
/// Defaults reproduce the layout of the Revised Statutes of Canada scans.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// How far a glyph may overlap the word it joins (page units). Default: 0.01.
    pub word_max_overlap: f64,

    /// How far a glyph may sit right of the word it joins. Default: 0.01.
    ///
    /// Scanned glyph boxes of one word touch exactly; any real inter-word
    /// space is far wider than this.
    pub word_max_spacing: f64,

    /// Minimum vertical-overlap fraction between a glyph and its word. Default: 0.95.
    pub word_min_vertical_overlap: f64,

    /// Minimum vertical-overlap fraction between a word and its line. Default: 0.5.
    ///
    /// Looser than the glyph threshold to tolerate baseline jitter between
    /// separately scanned words.
    pub line_min_vertical_overlap: f64,

    /// Share of distinct word baselines dropped from each end of the page
    /// before the occupancy sweep. Default: 0.25.
    pub band_trim_fraction: f64,

    /// Upper bound on the baselines dropped from each end. Default: 10.
    pub band_trim_max: usize,

    /// Width of the gutter search window as a share of the text width. Default: 0.2.
    pub gutter_window_fraction: f64,

    /// Minimum mean glyph size of an all-caps line rendered as `#`. Default: 7.5.
    pub heading1_min_size: f64,

    /// Minimum mean glyph size of an all-caps line rendered as `##`. Default: 4.9.
    pub heading2_min_size: f64,

    /// Capitalised share every word of a heading line must reach. Default: 0.9.
    pub heading_min_capitalized: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            word_max_overlap: 0.01,
            word_max_spacing: 0.01,
            word_min_vertical_overlap: 0.95,
            line_min_vertical_overlap: 0.5,
            band_trim_fraction: 0.25,
            band_trim_max: 10,
            gutter_window_fraction: 0.2,
            heading1_min_size: 7.5,
            heading2_min_size: 4.9,
            heading_min_capitalized: 0.9,
        }
    }
}

impl LayoutConfig {
    /// Check that every threshold is inside its meaningful range.
    pub fn validate(&self) -> Result<(), Rsc2MdError> {
        let fractions = [
            ("word_min_vertical_overlap", self.word_min_vertical_overlap),
            ("line_min_vertical_overlap", self.line_min_vertical_overlap),
            ("gutter_window_fraction", self.gutter_window_fraction),
            ("heading_min_capitalized", self.heading_min_capitalized),
        ];
        for (name, value) in fractions {
            if !(value > 0.0 && value <= 1.0) {
                return Err(Rsc2MdError::InvalidConfig(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        if !(0.0..0.5).contains(&self.band_trim_fraction) {
            return Err(Rsc2MdError::InvalidConfig(format!(
                "band_trim_fraction must be in [0, 0.5), got {}",
                self.band_trim_fraction
            )));
        }
        if self.word_max_overlap < 0.0 || self.word_max_spacing < 0.0 {
            return Err(Rsc2MdError::InvalidConfig(
                "word gap tolerances must be non-negative".into(),
            ));
        }
        if self.heading1_min_size < self.heading2_min_size {
            return Err(Rsc2MdError::InvalidConfig(format!(
                "heading1_min_size ({}) must not be below heading2_min_size ({})",
                self.heading1_min_size, self.heading2_min_size
            )));
        }
        Ok(())
    }
}

/// Configuration for a statute conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use rsc2md::{ConversionConfig, PageSelection};
///
/// let config = ConversionConfig::builder()
///     .pages(PageSelection::Range(24, 30))
///     .concurrency(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Geometric thresholds for every pipeline stage.
    pub layout: LayoutConfig,

    /// Number of pages reconstructed at once. Default: 4.
    ///
    /// Pages share no state, so each one runs as its own blocking task.
    pub concurrency: usize,

    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// Page separator in assembled output. Default: None.
    pub page_separator: PageSeparator,

    /// Abort the whole conversion on the first failed page. Default: false.
    ///
    /// When off, failed pages are withheld from the output and reported in
    /// [`crate::output::PageResult::error`].
    pub strict: bool,

    /// Receives per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            concurrency: 4,
            pages: PageSelection::default(),
            page_separator: PageSeparator::default(),
            strict: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("layout", &self.layout)
            .field("concurrency", &self.concurrency)
            .field("pages", &self.pages)
            .field("page_separator", &self.page_separator)
            .field("strict", &self.strict)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn strict(mut self, v: bool) -> Self {
        self.config.strict = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Rsc2MdError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(Rsc2MdError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if let PageSelection::Range(start, end) = c.pages {
            if start > end {
                return Err(Rsc2MdError::InvalidConfig(format!(
                    "Invalid page range '{start}-{end}': start must be <= end"
                )));
            }
        }
        c.layout.validate()?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of the layout XML to convert, by page id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Convert all pages (default).
    #[default]
    All,
    /// Convert a single page.
    Single(u32),
    /// Convert a contiguous range of page ids (inclusive).
    Range(u32, u32),
    /// Convert specific page ids.
    Set(Vec<u32>),
    /// Convert every page inside any of the inclusive ranges.
    Ranges(Vec<(u32, u32)>),
}

impl PageSelection {
    /// Whether the page with this id is selected.
    pub fn contains(&self, id: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Single(p) => *p == id,
            PageSelection::Range(start, end) => (*start..=*end).contains(&id),
            PageSelection::Set(pages) => pages.contains(&id),
            PageSelection::Ranges(ranges) => ranges
                .iter()
                .any(|&(start, end)| (start..=end).contains(&id)),
        }
    }
}

impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSelection::All => f.write_str("all"),
            PageSelection::Single(p) => write!(f, "{p}"),
            PageSelection::Range(start, end) => write!(f, "{start}-{end}"),
            PageSelection::Set(pages) => {
                let parts: Vec<String> = pages.iter().map(u32::to_string).collect();
                f.write_str(&parts.join(","))
            }
            PageSelection::Ranges(ranges) => {
                let parts: Vec<String> = ranges
                    .iter()
                    .map(|(start, end)| format!("{start}-{end}"))
                    .collect();
                f.write_str(&parts.join(","))
            }
        }
    }
}

/// Parses `all`, `24`, `24-30` or `24,26,31`.
impl FromStr for PageSelection {
    type Err = Rsc2MdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let page = |p: &str| {
            p.trim().parse::<u32>().map_err(|_| {
                Rsc2MdError::InvalidConfig(format!("Invalid page number: '{}'", p.trim()))
            })
        };

        if s == "all" {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            let (start, end) = (page(start)?, page(end)?);
            if start > end {
                return Err(Rsc2MdError::InvalidConfig(format!(
                    "Invalid page range '{start}-{end}': start must be <= end"
                )));
            }
            return Ok(PageSelection::Range(start, end));
        }

        if s.contains(',') {
            let pages = s.split(',').map(page).collect::<Result<Vec<_>, _>>()?;
            return Ok(PageSelection::Set(pages));
        }

        Ok(PageSelection::Single(page(&s)?))
    }
}

/// How to separate pages in the assembled Markdown output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSeparator {
    /// Pages are concatenated; text flows from one page into the next. (default)
    #[default]
    None,
    /// Horizontal rule between pages.
    HorizontalRule,
    /// HTML comment carrying the id of the page that follows.
    Comment,
    /// Custom string on its own line between pages.
    Custom(String),
}

impl PageSeparator {
    /// Render the separator placed before the page with the given id.
    ///
    /// Page Markdown always ends with a newline, so separators only add the
    /// surrounding blank lines.
    pub fn render(&self, page_id: u32) -> String {
        match self {
            PageSeparator::None => String::new(),
            PageSeparator::HorizontalRule => "\n---\n\n".to_string(),
            PageSeparator::Comment => format!("\n<!-- page {} -->\n\n", page_id),
            PageSeparator::Custom(s) => format!("\n{}\n\n", s),
        }
    }
}

impl FromStr for PageSeparator {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "none" => PageSeparator::None,
            "hr" | "---" => PageSeparator::HorizontalRule,
            "comment" => PageSeparator::Comment,
            _ => PageSeparator::Custom(s.to_string()),
        })
    }
}
