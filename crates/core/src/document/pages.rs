//! Page capping.

use lopdf::Document;
use tracing::debug;

use super::error::DocumentError;

/// A document reduced to its first pages.
#[derive(Debug, Clone)]
pub struct CappedDocument {
    /// PDF bytes of the reduced document.
    pub bytes: Vec<u8>,
    /// Pages in the source document.
    pub total_pages: u32,
    /// Pages kept.
    pub kept_pages: u32,
}

/// Keeps only the first `min(max_pages, total)` pages of a PDF.
///
/// Documents already within the limit are returned byte for byte.
pub fn cap_pages(source: &[u8], max_pages: u32) -> Result<CappedDocument, DocumentError> {
    let mut doc = Document::load_mem(source).map_err(|e| DocumentError::Pdf(e.to_string()))?;

    let pages = doc.get_pages();
    let total_pages = u32::try_from(pages.len()).unwrap_or(u32::MAX);
    if total_pages == 0 {
        return Err(DocumentError::NoPages);
    }

    let keep = total_pages.min(max_pages.max(1));
    if keep == total_pages {
        return Ok(CappedDocument {
            bytes: source.to_vec(),
            total_pages,
            kept_pages: keep,
        });
    }

    let dropped: Vec<u32> = pages.keys().copied().filter(|n| *n > keep).collect();
    doc.delete_pages(&dropped);
    doc.prune_objects();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| DocumentError::Write(e.to_string()))?;

    debug!(total_pages, kept_pages = keep, "capped document pages");

    Ok(CappedDocument {
        bytes,
        total_pages,
        kept_pages: keep,
    })
}
