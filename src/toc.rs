//! Table of contents: a CSV mapping each chapter of the statute to the
//! inclusive page range it occupies.
//!
//! ```text
//! Chapter,Pages
//! A-1,24-31
//! A-2,32-40
//! ```
//!
//! Each chapter becomes one `<Chapter>.md` file per language.

use crate::config::PageSelection;
use crate::error::Rsc2MdError;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TocRow {
    #[serde(rename = "Chapter")]
    chapter: String,
    #[serde(rename = "Pages")]
    pages: String,
}

/// One table-of-contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub name: String,
    pub first_page: u32,
    pub last_page: u32,
}

impl Chapter {
    pub fn pages(&self) -> PageSelection {
        PageSelection::Range(self.first_page, self.last_page)
    }

    /// Output file name shared by both language directories.
    pub fn file_name(&self) -> String {
        format!("{}.md", self.name)
    }
}

/// Read a table of contents from disk.
pub fn read_toc(path: &Path) -> Result<Vec<Chapter>, Rsc2MdError> {
    let file = std::fs::File::open(path).map_err(|e| Rsc2MdError::TocReadFailed {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    parse_toc(file, path)
}

/// Parse a table of contents; `path` is only used in error messages.
pub fn parse_toc<R: Read>(source: R, path: &Path) -> Result<Vec<Chapter>, Rsc2MdError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut chapters = Vec::new();
    for (i, row) in reader.deserialize::<TocRow>().enumerate() {
        let row_no = i + 1;
        let invalid = |detail: String| Rsc2MdError::InvalidToc {
            path: path.to_path_buf(),
            row: row_no,
            detail,
        };

        let row = row.map_err(|source| Rsc2MdError::TocReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        validate_name(&row.chapter).map_err(invalid)?;
        let (first_page, last_page) = parse_range(&row.pages).map_err(invalid)?;
        chapters.push(Chapter {
            name: row.chapter,
            first_page,
            last_page,
        });
    }
    Ok(chapters)
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("empty chapter name".into());
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(format!("chapter name '{name}' is not a plain file name"));
    }
    Ok(())
}

fn parse_range(pages: &str) -> Result<(u32, u32), String> {
    let page = |p: &str| {
        p.trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid page number '{}' in '{pages}'", p.trim()))
    };
    let (first, last) = match pages.split_once('-') {
        Some((first, last)) => (page(first)?, page(last)?),
        None => {
            let p = page(pages)?;
            (p, p)
        }
    };
    if first > last {
        return Err(format!("page range '{pages}' runs backwards"));
    }
    Ok((first, last))
}
