//! Page decoders: lopdf for real documents, form-feed split for text dumps.

use std::io::Cursor;

use lopdf::Document;
use tracing::{debug, warn};

use super::{Page, PageDecoder};
use crate::error::FetchError;

/// Page separator written by `pdftotext`.
pub const PAGE_BREAK: char = '\x0c';

/// Extracts text page by page using lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfDecoder;

impl PageDecoder for PdfDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<Page>, FetchError> {
        let doc = Document::load_from(Cursor::new(bytes))
            .map_err(|e| FetchError::Decode(format!("failed to load PDF: {}", e)))?;

        let mut pages = Vec::new();
        for (page_num, _) in doc.get_pages() {
            let text = match doc.extract_text(&[page_num]) {
                Ok(text) => text,
                Err(e) => {
                    // Keep numbering stable; an empty page just never matches.
                    warn!("PdfDecoder: page {} has no extractable text: {}", page_num, e);
                    String::new()
                }
            };
            pages.push(Page::new(page_num, text));
        }

        if pages.is_empty() {
            return Err(FetchError::Decode("PDF has no pages".to_string()));
        }
        debug!("PdfDecoder: decoded {} pages", pages.len());
        Ok(pages)
    }
}

/// Treats the bytes as UTF-8 text with pages separated by form feeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDecoder;

impl PageDecoder for TextDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<Page>, FetchError> {
        let text = String::from_utf8_lossy(bytes);
        let mut chunks: Vec<&str> = text.split(PAGE_BREAK).collect();
        // pdftotext terminates the last page with a form feed too.
        if chunks.len() > 1 && chunks.last().is_some_and(|c| c.trim().is_empty()) {
            chunks.pop();
        }
        Ok(chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| Page::new(i as u32 + 1, chunk))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_decoder_splits_on_form_feed() {
        let pages = TextDecoder.decode(b"first page\x0csecond page\x0c").unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0], Page::new(1, "first page"));
        assert_eq!(pages[1].page_num, 2);
    }

    #[test]
    fn test_text_decoder_single_page() {
        let pages = TextDecoder.decode(b"no breaks here").unwrap();
        assert_eq!(pages, vec![Page::new(1, "no breaks here")]);
    }

    #[test]
    fn test_text_decoder_is_lossy() {
        let pages = TextDecoder.decode(b"Cote d\xffIvoire").unwrap();
        assert!(pages[0].text.starts_with("Cote d"));
    }

    #[test]
    fn test_pdf_decoder_rejects_garbage() {
        let err = PdfDecoder.decode(b"not a pdf").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
