//! Plain text and Markdown parser.

use async_trait::async_trait;
use ragkit_core::{DocumentParser, DocumentType, Metadata, ParseError, ParsedDocument};
use std::path::Path;
use tokio::fs;

/// Parser for plain text and Markdown files.
///
/// Files are read as UTF-8; on encoding errors the bytes are re-decoded as
/// ISO-8859-1 and the effective encoding is recorded in the file metadata.
pub struct TextParser;

impl TextParser {
    /// Create a new text parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentParser for TextParser {
    fn supported_extensions(&self) -> &[&str] {
        &["txt", "md", "markdown", "text", "log", "csv", "json", "yaml", "yml", "toml"]
    }

    fn supported_types(&self) -> &[&str] {
        &["text/plain", "text/markdown", "text/x-markdown", "text/csv"]
    }

    async fn parse(&self, path: &Path) -> Result<ParsedDocument, ParseError> {
        let bytes = fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.parse_bytes(&bytes, name).await
    }

    async fn parse_bytes(&self, data: &[u8], name: &str) -> Result<ParsedDocument, ParseError> {
        let (content, encoding) = decode_text(data);

        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let document_type = match ext.to_ascii_lowercase().as_str() {
            "md" | "markdown" => DocumentType::Markdown,
            _ => DocumentType::Text,
        };

        let mut file_metadata = Metadata::new();
        file_metadata.insert("size_bytes".to_string(), data.len().into());
        file_metadata.insert(
            "mime_type".to_string(),
            mime_guess::from_path(name)
                .first_or_text_plain()
                .to_string()
                .into(),
        );
        file_metadata.insert("encoding".to_string(), encoding.into());

        Ok(ParsedDocument {
            content,
            document_type,
            file_metadata,
            title: None,
        })
    }
}

/// Decode bytes as UTF-8, retrying as ISO-8859-1 on failure.
///
/// Returns the decoded text and the name of the effective encoding.
pub(crate) fn decode_text(data: &[u8]) -> (String, &'static str) {
    match std::str::from_utf8(data) {
        Ok(s) => (s.to_string(), "utf-8"),
        // ISO-8859-1 maps every byte to the code point of the same value.
        Err(_) => (data.iter().map(|&b| b as char).collect(), "iso-8859-1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_parse_utf8_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "Hello, world!").unwrap();

        let parsed = TextParser::new().parse(&path).await.unwrap();

        assert_eq!(parsed.content, "Hello, world!");
        assert_eq!(parsed.document_type, DocumentType::Text);
        assert_eq!(parsed.file_metadata["encoding"], "utf-8");
        assert_eq!(parsed.file_metadata["size_bytes"], 13);
    }

    #[tokio::test]
    async fn test_parse_markdown_extension() {
        let parsed = TextParser::new()
            .parse_bytes(b"# Title\n\nBody", "readme.md")
            .await
            .unwrap();
        assert_eq!(parsed.document_type, DocumentType::Markdown);
        assert!(parsed.content.starts_with("# Title"));
    }

    #[tokio::test]
    async fn test_latin1_fallback_recorded() {
        // 0xE9 is 'é' in ISO-8859-1 and invalid standalone UTF-8.
        let parsed = TextParser::new()
            .parse_bytes(&[b'c', b'a', b'f', 0xE9], "menu.txt")
            .await
            .unwrap();
        assert_eq!(parsed.content, "café");
        assert_eq!(parsed.file_metadata["encoding"], "iso-8859-1");
    }

    #[tokio::test]
    async fn test_inner_whitespace_preserved() {
        let parsed = TextParser::new()
            .parse_bytes(b"a  b\n\n  c", "spaced.txt")
            .await
            .unwrap();
        assert_eq!(parsed.content, "a  b\n\n  c");
    }

    #[tokio::test]
    async fn test_parse_missing_file_fails() {
        let result = TextParser::new().parse(Path::new("/nonexistent/f.txt")).await;
        assert!(matches!(result, Err(ParseError::Io(_))));
    }

    #[test]
    fn test_can_parse_by_extension() {
        let parser = TextParser::new();
        assert!(parser.can_parse(Path::new("a.txt"), "application/octet-stream"));
        assert!(parser.can_parse(Path::new("a.MD"), "application/octet-stream"));
        assert!(!parser.can_parse(Path::new("a.pdf"), "application/pdf"));
    }

    #[test]
    fn test_decode_text_utf8() {
        let (s, enc) = decode_text("héllo".as_bytes());
        assert_eq!(s, "héllo");
        assert_eq!(enc, "utf-8");
    }
}
