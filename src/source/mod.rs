//! Document sources and page decoders.
//!
//! A [`DocumentSource`] turns an address into bytes and a [`PageDecoder`]
//! turns bytes into per-page text. The collector only talks to these two
//! traits, so tests can swap the network for an in-memory map.

pub mod http;
pub mod memory;
pub mod pdf;

use crate::error::FetchError;

/// Text of a single page (always 1-indexed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub page_num: u32,
    pub text: String,
}

impl Page {
    pub fn new(page_num: u32, text: impl Into<String>) -> Self {
        Self {
            page_num,
            text: text.into(),
        }
    }
}

/// Fetches raw document bytes by address.
#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self, address: &str) -> Result<Vec<u8>, FetchError>;
}

/// Splits a fetched document into page text.
pub trait PageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<Page>, FetchError>;
}

/// Known decoder identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderKind {
    Pdf,
    Text,
}

impl DecoderKind {
    /// Parse a CLI string into a decoder kind.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pdf" => Some(Self::Pdf),
            "text" | "txt" => Some(Self::Text),
            _ => None,
        }
    }

    /// PDF when the bytes carry the `%PDF` magic, text otherwise.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(b"%PDF") {
            Self::Pdf
        } else {
            Self::Text
        }
    }
}

/// Picks the PDF or text decoder per document by sniffing its bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoDecoder;

impl PageDecoder for AutoDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<Page>, FetchError> {
        match DecoderKind::sniff(bytes) {
            DecoderKind::Pdf => pdf::PdfDecoder.decode(bytes),
            DecoderKind::Text => pdf::TextDecoder.decode(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_kind() {
        assert_eq!(DecoderKind::from_str("txt"), Some(DecoderKind::Text));
        assert_eq!(DecoderKind::from_str("docx"), None);
        assert_eq!(DecoderKind::sniff(b"%PDF-1.4\n..."), DecoderKind::Pdf);
        assert_eq!(DecoderKind::sniff(b"BARITE"), DecoderKind::Text);
    }

    #[test]
    fn test_auto_decoder_handles_text() {
        let pages = AutoDecoder.decode(b"one\x0ctwo").unwrap();
        assert_eq!(pages, vec![Page::new(1, "one"), Page::new(2, "two")]);
    }

    #[test]
    fn test_auto_decoder_rejects_broken_pdf() {
        let err = AutoDecoder.decode(b"%PDF-1.4 truncated").unwrap_err();
        assert_eq!(err.kind(), "decode");
    }
}
