//! Parser registry and dispatch.

use ragkit_core::{DocumentParser, ParseError, ParsedDocument};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Registry of document parsers.
///
/// Dispatch order follows the parsing contract: file extension first, MIME
/// type second, and unknown sources fall back to the plain-text parser.
pub struct ParserRegistry {
    parsers: Vec<Arc<dyn DocumentParser>>,
    fallback: Arc<dyn DocumentParser>,
}

impl ParserRegistry {
    /// Create a registry with the given fallback parser.
    pub fn with_fallback<P: DocumentParser + 'static>(fallback: P) -> Self {
        Self {
            parsers: Vec::new(),
            fallback: Arc::new(fallback),
        }
    }

    /// Registry preloaded with every standard parser.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::with_fallback(crate::TextParser::new());
        registry.register(crate::TextParser::new());
        registry.register(crate::HtmlParser::new());
        registry.register(crate::PdfParser::new());
        registry.register(crate::DocxParser::new());
        registry.register(crate::MediaParser::new());
        registry
    }

    /// Register a parser; earlier registrations win ties.
    pub fn register<P: DocumentParser + 'static>(&mut self, parser: P) {
        self.parsers.push(Arc::new(parser));
    }

    /// Select the parser for a file name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Arc<dyn DocumentParser> {
        let path = Path::new(name);
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        // Extension match first.
        if let Some(ext) = &ext {
            for parser in &self.parsers {
                if parser.supported_extensions().contains(&ext.as_str()) {
                    return Arc::clone(parser);
                }
            }
        }

        // Then MIME type.
        if let Some(mime) = mime_guess::from_path(path).first_raw() {
            for parser in &self.parsers {
                if parser.supported_types().contains(&mime) {
                    return Arc::clone(parser);
                }
            }
        }

        // Unknown sources are treated as plain text.
        debug!(name, "no parser matched, defaulting to text");
        Arc::clone(&self.fallback)
    }

    /// Parse a file from disk.
    pub async fn parse_path(&self, path: &Path) -> Result<ParsedDocument, ParseError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        self.resolve(&name).parse(path).await
    }

    /// Parse an in-memory blob; `name` drives dispatch.
    pub async fn parse_bytes(&self, data: &[u8], name: &str) -> Result<ParsedDocument, ParseError> {
        self.resolve(name).parse_bytes(data, name).await
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragkit_core::DocumentType;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_dispatch_by_extension() {
        let registry = ParserRegistry::standard();

        let parsed = registry.parse_bytes(b"hello", "note.txt").await.unwrap();
        assert_eq!(parsed.document_type, DocumentType::Text);

        let parsed = registry.parse_bytes(b"# hi", "readme.md").await.unwrap();
        assert_eq!(parsed.document_type, DocumentType::Markdown);

        let parsed = registry
            .parse_bytes(b"<p>x</p>", "page.html")
            .await
            .unwrap();
        assert_eq!(parsed.document_type, DocumentType::Html);
    }

    #[tokio::test]
    async fn test_unknown_extension_defaults_to_text() {
        let registry = ParserRegistry::standard();
        let parsed = registry.parse_bytes(b"raw data", "file.zzz").await.unwrap();
        assert_eq!(parsed.document_type, DocumentType::Text);
        assert_eq!(parsed.content, "raw data");
    }

    #[tokio::test]
    async fn test_no_extension_defaults_to_text() {
        let registry = ParserRegistry::standard();
        let parsed = registry.parse_bytes(b"plain", "README").await.unwrap();
        assert_eq!(parsed.document_type, DocumentType::Text);
    }

    #[tokio::test]
    async fn test_parse_path_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "from disk").unwrap();

        let registry = ParserRegistry::standard();
        let parsed = registry.parse_path(&path).await.unwrap();
        assert_eq!(parsed.content, "from disk");
    }

    #[tokio::test]
    async fn test_media_dispatch() {
        let registry = ParserRegistry::standard();
        let parsed = registry.parse_bytes(b"xx", "photo.jpg").await.unwrap();
        assert_eq!(parsed.document_type, DocumentType::Image);
        assert!(parsed.content.is_empty());
    }

    #[test]
    fn test_resolve_pdf() {
        let registry = ParserRegistry::standard();
        let parser = registry.resolve("report.pdf");
        assert!(parser.supported_extensions().contains(&"pdf"));
    }
}
