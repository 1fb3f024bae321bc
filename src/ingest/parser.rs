use std::path::Path;

use lopdf::Document;
use tracing::warn;

use crate::error::{Error, Result};
use crate::types::RawPage;

/// Extracts per-page raw text from an uploaded document.
///
/// PDF bytes are parsed page by page; anything else is treated as UTF-8
/// plain text forming a single page. Pages whose extracted text is empty are
/// dropped, so page numbers in the output may be sparse but always match the
/// source document's numbering.
pub fn extract_pages(source_id: &str, bytes: &[u8]) -> Result<Vec<RawPage>> {
    if looks_like_pdf(bytes) {
        extract_pdf_pages(source_id, bytes)
    } else {
        extract_text_page(source_id, bytes)
    }
}

/// Derives the source id used in chunk ids from a file name: the stem with
/// anything outside `[A-Za-z0-9._-]` replaced by `_`.
pub fn source_id_from_name(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name);
    let sanitized: String = stem
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "document".to_string()
    } else {
        sanitized
    }
}

fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

fn extract_pdf_pages(source_id: &str, bytes: &[u8]) -> Result<Vec<RawPage>> {
    let document = Document::load_mem(bytes).map_err(|err| Error::Extraction {
        source_id: source_id.to_string(),
        reason: format!("malformed PDF: {err}"),
    })?;

    let mut pages = Vec::new();
    for (page_number, _) in document.get_pages() {
        let text = match document.extract_text(&[page_number]) {
            Ok(text) => text,
            Err(err) => {
                // A single unreadable page does not sink the document.
                warn!(source_id, page_number, %err, "skipping unreadable page");
                continue;
            }
        };
        if text.trim().is_empty() {
            continue;
        }
        pages.push(RawPage {
            source_id: source_id.to_string(),
            page_number,
            text,
        });
    }
    Ok(pages)
}

fn extract_text_page(source_id: &str, bytes: &[u8]) -> Result<Vec<RawPage>> {
    let text = std::str::from_utf8(bytes).map_err(|err| Error::Extraction {
        source_id: source_id.to_string(),
        reason: format!("not valid UTF-8 text: {err}"),
    })?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![RawPage {
        source_id: source_id.to_string(),
        page_number: 1,
        text: text.to_string(),
    }])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_becomes_one_page() {
        let pages = extract_pages("notes", b"some plain text").unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[0].text, "some plain text");
        assert_eq!(pages[0].source_id, "notes");
    }

    #[test]
    fn empty_text_yields_no_pages() {
        assert!(extract_pages("notes", b"  \n ").unwrap().is_empty());
    }

    #[test]
    fn invalid_utf8_is_an_extraction_error() {
        let err = extract_pages("notes", &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn truncated_pdf_is_an_extraction_error() {
        let err = extract_pages("doc", b"%PDF-1.7 not actually a pdf").unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn source_ids_come_from_sanitized_file_stems() {
        assert_eq!(source_id_from_name("Q3 Report.pdf"), "Q3_Report");
        assert_eq!(source_id_from_name("notes.txt"), "notes");
        assert_eq!(source_id_from_name("a/b/manual.pdf"), "manual");
        assert_eq!(source_id_from_name(""), "document");
    }
}
