//! HTML parser: strips script/style blocks, then tags, then collapses
//! whitespace.

use async_trait::async_trait;
use ragkit_core::{DocumentParser, DocumentType, Metadata, ParseError, ParsedDocument};
use std::path::Path;
use tokio::fs;

use crate::text::decode_text;

/// Parser for HTML files.
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentParser for HtmlParser {
    fn supported_extensions(&self) -> &[&str] {
        &["html", "htm", "xhtml"]
    }

    fn supported_types(&self) -> &[&str] {
        &["text/html", "application/xhtml+xml"]
    }

    async fn parse(&self, path: &Path) -> Result<ParsedDocument, ParseError> {
        let bytes = fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.parse_bytes(&bytes, name).await
    }

    async fn parse_bytes(&self, data: &[u8], _name: &str) -> Result<ParsedDocument, ParseError> {
        let (html, encoding) = decode_text(data);

        let title = extract_title(&html);
        let content = strip_html(&html);

        let mut file_metadata = Metadata::new();
        file_metadata.insert("size_bytes".to_string(), data.len().into());
        file_metadata.insert("mime_type".to_string(), "text/html".into());
        file_metadata.insert("encoding".to_string(), encoding.into());

        Ok(ParsedDocument {
            content,
            document_type: DocumentType::Html,
            file_metadata,
            title,
        })
    }
}

/// Strip an HTML document down to its visible text.
///
/// Script and style elements are removed including their content, every
/// remaining tag is dropped, and whitespace runs collapse to single spaces.
pub fn strip_html(html: &str) -> String {
    let without_scripts = remove_element(html, "script");
    let without_styles = remove_element(&without_scripts, "style");

    let mut text = String::with_capacity(without_styles.len());
    let mut in_tag = false;
    for c in without_styles.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                // Tags act as separators so adjacent elements don't fuse.
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    let decoded = decode_entities(&text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove `<name ...>...</name>` blocks, case-insensitively.
fn remove_element(html: &str, name: &str) -> String {
    // ASCII lowercasing preserves byte offsets into the original.
    let lower = html.to_ascii_lowercase();
    let open = format!("<{name}");
    let close = format!("</{name}>");

    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some(rel) = lower[pos..].find(&open) {
        let start = pos + rel;
        out.push_str(&html[pos..start]);
        match lower[start..].find(&close) {
            Some(rel_end) => pos = start + rel_end + close.len(),
            None => {
                // Unclosed block swallows the rest of the document.
                return out;
            }
        }
    }
    out.push_str(&html[pos..]);
    out
}

/// Decode the handful of entities that matter for plain-text search.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Pull the `<title>` element content, if present.
fn extract_title(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let start = lower.find("<title")?;
    let open_end = html[start..].find('>')? + start + 1;
    let close = lower[open_end..].find("</title>")? + open_end;
    let title = html[open_end..close].trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}
