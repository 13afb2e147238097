//! Input resolution: validate the user-supplied layout XML path.
//!
//! The loader streams the whole file, so a wrong input (a PDF passed by
//! mistake, an empty file) would otherwise surface as a confusing XML syntax
//! error deep inside the parse. We sniff the first non-blank byte for `<`
//! before returning so callers get a meaningful error instead.

use crate::error::Rsc2MdError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// How many leading bytes are inspected and reported on mismatch.
const SNIFF_LEN: usize = 64;

/// Validate that `path` exists, is readable and looks like an XML document.
pub fn resolve_input(path: &Path) -> Result<PathBuf, Rsc2MdError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(Rsc2MdError::FileNotFound { path });
    }

    let mut head = Vec::with_capacity(SNIFF_LEN);
    match std::fs::File::open(&path) {
        Ok(f) => {
            f.take(SNIFF_LEN as u64)
                .read_to_end(&mut head)
                .map_err(|source| Rsc2MdError::InputReadFailed {
                    path: path.clone(),
                    source,
                })?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Rsc2MdError::PermissionDenied { path });
        }
        Err(source) => {
            return Err(Rsc2MdError::InputReadFailed { path, source });
        }
    }

    if !looks_like_xml(&head) {
        return Err(Rsc2MdError::NotXml {
            path,
            magic: head.into_iter().take(8).collect(),
        });
    }

    debug!("Resolved layout XML: {}", path.display());
    Ok(path)
}

/// Whether the first non-whitespace byte (after an optional BOM) is `<`.
pub fn looks_like_xml(bytes: &[u8]) -> bool {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|&b| b == b'<')
}
