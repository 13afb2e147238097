//! Layout XML loading: stream the extractor's output once and collect the
//! glyphs of every selected page.
//!
//! The document is a flat list of `<page id bbox>` elements holding, at any
//! depth, `<text font bbox size>c</text>` glyph elements. Extractors insert
//! attribute-less `<text> </text>` elements between words; those carry no
//! geometry and are skipped.
//!
//! Structural problems in the XML are fatal for the whole document. A glyph
//! with missing or unparseable attributes only fails its own page.

use super::glyph::{BoundingBox, Glyph};
use super::input::resolve_input;
use crate::config::PageSelection;
use crate::error::{PageError, Rsc2MdError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, trace};

/// The raw material of one page: its bounding box and ordered glyphs.
#[derive(Debug, Clone, PartialEq)]
pub struct PageGlyphs {
    pub id: u32,
    pub bbox: BoundingBox,
    pub glyphs: Vec<Glyph>,
}

/// Outcome of loading one page.
pub type LoadedPage = Result<PageGlyphs, PageError>;

/// Load the selected pages of a layout XML file, in document order.
pub fn load_pages(path: &Path, selection: &PageSelection) -> Result<Vec<LoadedPage>, Rsc2MdError> {
    let path = resolve_input(path)?;
    let file = std::fs::File::open(&path).map_err(|source| Rsc2MdError::InputReadFailed {
        path: path.clone(),
        source,
    })?;
    let pages = read_pages(BufReader::new(file), selection, &path.display().to_string())?;
    info!("Loaded {} page(s) from {}", pages.len(), path.display());
    Ok(pages)
}

/// Load the selected pages from an in-memory XML document.
pub fn parse_pages(xml: &str, selection: &PageSelection) -> Result<Vec<LoadedPage>, Rsc2MdError> {
    read_pages(xml.as_bytes(), selection, "<memory>")
}

/// Attributes of the `<text>` element being read.
#[derive(Default)]
struct TextElement {
    bbox: Option<String>,
    font: Option<String>,
    size: Option<String>,
    content: String,
}

/// The selected page being read.
struct OpenPage {
    id: u32,
    bbox: Result<BoundingBox, String>,
    glyphs: Vec<Glyph>,
    error: Option<PageError>,
}

impl OpenPage {
    fn fail(&mut self, detail: String) {
        if self.error.is_none() {
            self.error = Some(PageError::MalformedGlyph {
                page: self.id,
                detail,
            });
        }
    }

    fn push_text(&mut self, text: TextElement) {
        if self.error.is_some() {
            return;
        }
        let Some(bbox) = text.bbox else {
            if text.content.trim().is_empty() {
                trace!(page = self.id, "Skipping separator text element");
            } else {
                self.fail(format!("text {:?} has no bbox", text.content));
            }
            return;
        };
        match build_glyph(text.content, &bbox, text.font, text.size) {
            Ok(glyph) => self.glyphs.push(glyph),
            Err(detail) => self.fail(detail),
        }
    }

    fn close(self) -> LoadedPage {
        if let Some(err) = self.error {
            return Err(err);
        }
        let bbox = self.bbox.map_err(|detail| PageError::MalformedGlyph {
            page: self.id,
            detail,
        })?;
        debug!(page = self.id, glyphs = self.glyphs.len(), "Loaded page");
        Ok(PageGlyphs {
            id: self.id,
            bbox,
            glyphs: self.glyphs,
        })
    }
}

fn build_glyph(
    text: String,
    bbox: &str,
    font: Option<String>,
    size: Option<String>,
) -> Result<Glyph, String> {
    let bbox = BoundingBox::parse(bbox)?;
    let font = font.ok_or_else(|| format!("text {text:?} has no font"))?;
    let size = size
        .ok_or_else(|| format!("text {text:?} has no size"))?
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("text {text:?} has an invalid size"))?;
    let glyph = Glyph::from_bbox(text, bbox, size, font);
    glyph.validate()?;
    Ok(glyph)
}

/// Stream pages out of any buffered reader.
pub fn read_pages<R: BufRead>(
    source: R,
    selection: &PageSelection,
    source_name: &str,
) -> Result<Vec<LoadedPage>, Rsc2MdError> {
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();
    let mut pages = Vec::new();
    let mut page: Option<OpenPage> = None;
    let mut text: Option<TextElement> = None;

    let syntax = |reader: &Reader<R>, detail: String| Rsc2MdError::XmlSyntax {
        source_name: source_name.to_string(),
        position: reader.buffer_position(),
        detail,
    };

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(quick_xml::Error::Io(e)) => {
                return Err(Rsc2MdError::InputReadFailed {
                    path: source_name.into(),
                    source: std::io::Error::new(e.kind(), e.to_string()),
                })
            }
            Err(e) => return Err(syntax(&reader, e.to_string())),
        };

        match event {
            Event::Start(e) if e.name().as_ref() == b"page" => {
                page = open_page(&e, selection).map_err(|d| syntax(&reader, d))?;
            }
            Event::Empty(e) if e.name().as_ref() == b"page" => {
                if let Some(open) = open_page(&e, selection).map_err(|d| syntax(&reader, d))? {
                    pages.push(open.close());
                }
            }
            Event::End(e) if e.name().as_ref() == b"page" => {
                if let Some(open) = page.take() {
                    pages.push(open.close());
                }
            }
            Event::Start(e) if page.is_some() && e.name().as_ref() == b"text" => {
                let [bbox, font, size] = text_attributes(&e).map_err(|d| syntax(&reader, d))?;
                text = Some(TextElement {
                    bbox,
                    font,
                    size,
                    content: String::new(),
                });
            }
            Event::Empty(e) if e.name().as_ref() == b"text" => {
                if let Some(open) = page.as_mut() {
                    let [bbox, font, size] = text_attributes(&e).map_err(|d| syntax(&reader, d))?;
                    open.push_text(TextElement {
                        bbox,
                        font,
                        size,
                        content: String::new(),
                    });
                }
            }
            Event::Text(e) => {
                if let Some(current) = text.as_mut() {
                    let unescaped = e.unescape().map_err(|err| syntax(&reader, err.to_string()))?;
                    current.content.push_str(&unescaped);
                }
            }
            Event::CData(e) => {
                if let Some(current) = text.as_mut() {
                    current.content.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) if e.name().as_ref() == b"text" => {
                if let (Some(open), Some(current)) = (page.as_mut(), text.take()) {
                    open.push_text(current);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = page {
        return Err(syntax(
            &reader,
            format!("document ends inside page {}", open.id),
        ));
    }
    if pages.is_empty() {
        return Err(Rsc2MdError::NoPagesFound {
            selection: selection.to_string(),
        });
    }
    Ok(pages)
}

/// Start a page if it is selected.
fn open_page(e: &BytesStart<'_>, selection: &PageSelection) -> Result<Option<OpenPage>, String> {
    let attrs = attributes(e, &["id", "bbox"])?;
    let id = attrs[0]
        .as_deref()
        .and_then(|id| id.trim().parse::<u32>().ok())
        .ok_or_else(|| "page without a numeric id".to_string())?;
    if !selection.contains(id) {
        return Ok(None);
    }
    Ok(Some(OpenPage {
        id,
        bbox: attrs[1]
            .as_deref()
            .ok_or_else(|| format!("page {id} has no bbox"))
            .and_then(BoundingBox::parse)
            .and_then(|bbox| bbox.validate_page().map(|()| bbox)),
        glyphs: Vec::new(),
        error: None,
    }))
}

fn text_attributes(e: &BytesStart<'_>) -> Result<[Option<String>; 3], String> {
    let mut attrs = attributes(e, &["bbox", "font", "size"])?.into_iter();
    Ok([
        attrs.next().flatten(),
        attrs.next().flatten(),
        attrs.next().flatten(),
    ])
}

/// Unescaped values of the named attributes, `None` where absent.
fn attributes(e: &BytesStart<'_>, names: &[&str]) -> Result<Vec<Option<String>>, String> {
    let mut values = vec![None; names.len()];
    for attr in e.attributes().flatten() {
        let Some(slot) = names.iter().position(|n| n.as_bytes() == attr.key.as_ref()) else {
            continue;
        };
        let value = attr.unescape_value().map_err(|err| err.to_string())?;
        values[slot] = Some(value.into_owned());
    }
    Ok(values)
}
