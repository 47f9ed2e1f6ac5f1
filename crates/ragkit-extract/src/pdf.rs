//! PDF parser built on lopdf.
//!
//! Text is extracted page by page with a marker line between pages, and the
//! document information dictionary is copied into the file metadata.

use async_trait::async_trait;
use lopdf::{Document, Object};
use ragkit_core::{DocumentParser, DocumentType, Metadata, ParseError, ParsedDocument};
use std::path::Path;
use tracing::debug;

/// Info dictionary fields copied into file metadata, with their target keys.
const INFO_FIELDS: &[(&[u8], &str)] = &[
    (b"Title", "title"),
    (b"Author", "author"),
    (b"Subject", "subject"),
    (b"Creator", "creator"),
    (b"Producer", "producer"),
    (b"CreationDate", "creation_date"),
    (b"ModDate", "modification_date"),
];

/// Parser for PDF files.
pub struct PdfParser;

impl PdfParser {
    /// Create a new PDF parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentParser for PdfParser {
    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn supported_types(&self) -> &[&str] {
        &["application/pdf"]
    }

    async fn parse(&self, path: &Path) -> Result<ParsedDocument, ParseError> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.parse_bytes(&bytes, name).await
    }

    async fn parse_bytes(&self, data: &[u8], name: &str) -> Result<ParsedDocument, ParseError> {
        debug!(name, size = data.len(), "parsing pdf");
        let size = data.len();
        let data = data.to_vec();

        // lopdf is blocking; keep it off the async worker threads.
        let parsed = tokio::task::spawn_blocking(move || extract_pdf(&data))
            .await
            .map_err(|e| ParseError::Malformed(format!("pdf task failed: {e}")))??;

        let mut file_metadata = parsed.info;
        file_metadata.insert("size_bytes".to_string(), size.into());
        file_metadata.insert("mime_type".to_string(), "application/pdf".into());
        file_metadata.insert("page_count".to_string(), parsed.page_count.into());

        let title = file_metadata
            .get("title")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(ParsedDocument {
            content: parsed.text,
            document_type: DocumentType::Pdf,
            file_metadata,
            title,
        })
    }
}

struct PdfExtraction {
    text: String,
    page_count: u32,
    info: Metadata,
}

/// Extract page texts and the info dictionary from PDF bytes.
fn extract_pdf(bytes: &[u8]) -> Result<PdfExtraction, ParseError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| ParseError::Malformed(format!("pdf load failed: {e}")))?;

    let pages = doc.get_pages();
    let page_count = pages.len() as u32;

    let mut text = String::new();
    for (index, page_num) in pages.keys().enumerate() {
        let page_text = doc
            .extract_text(&[*page_num])
            .map_err(|e| ParseError::Malformed(format!("page {page_num}: {e}")))?;

        if index > 0 {
            text.push_str(&format!("\n--- Page {page_num} ---\n"));
        }
        text.push_str(&page_text);
    }

    Ok(PdfExtraction {
        text,
        page_count,
        info: read_info_dictionary(&doc),
    })
}

/// Copy the document information dictionary into a metadata map.
fn read_info_dictionary(doc: &Document) -> Metadata {
    let mut info = Metadata::new();

    let dict = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|obj| obj.as_reference().ok())
        .and_then(|id| doc.get_dictionary(id).ok());

    let Some(dict) = dict else {
        return info;
    };

    for (key, target) in INFO_FIELDS {
        if let Ok(obj) = dict.get(key) {
            if let Some(value) = pdf_string(obj) {
                if !value.is_empty() {
                    info.insert((*target).to_string(), value.into());
                }
            }
        }
    }

    info
}

/// Decode a PDF string object.
///
/// UTF-16BE strings carry a BOM; everything else is treated as
/// PDFDocEncoding, which agrees with Latin-1 for the printable range.
fn pdf_string(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => {
            if bytes.starts_with(&[0xFE, 0xFF]) {
                let units: Vec<u16> = bytes[2..]
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                Some(String::from_utf16_lossy(&units))
            } else {
                Some(bytes.iter().map(|&b| b as char).collect())
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_malformed_pdf_fails() {
        let result = PdfParser::new().parse_bytes(b"not a pdf", "broken.pdf").await;
        assert!(matches!(result, Err(ParseError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let result = PdfParser::new().parse(Path::new("/nonexistent/x.pdf")).await;
        assert!(matches!(result, Err(ParseError::Io(_))));
    }

    #[test]
    fn test_can_parse_pdf_extension() {
        let parser = PdfParser::new();
        assert!(parser.can_parse(Path::new("report.pdf"), "application/octet-stream"));
        assert!(parser.can_parse(Path::new("blob"), "application/pdf"));
        assert!(!parser.can_parse(Path::new("a.txt"), "text/plain"));
    }

    #[test]
    fn test_pdf_string_latin1() {
        let obj = Object::String(vec![b'c', b'a', b'f', 0xE9], lopdf::StringFormat::Literal);
        assert_eq!(pdf_string(&obj).as_deref(), Some("café"));
    }

    #[test]
    fn test_pdf_string_utf16be() {
        // BOM + "Hi"
        let obj = Object::String(
            vec![0xFE, 0xFF, 0x00, b'H', 0x00, b'i'],
            lopdf::StringFormat::Literal,
        );
        assert_eq!(pdf_string(&obj).as_deref(), Some("Hi"));
    }

    #[test]
    fn test_pdf_string_non_string_object() {
        assert!(pdf_string(&Object::Integer(3)).is_none());
    }
}
