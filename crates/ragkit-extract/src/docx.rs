//! DOCX parser built on zip + quick-xml.
//!
//! Body paragraphs are concatenated with blank lines, then each table is
//! emitted with a labeled header and pipe-joined rows. Core properties are
//! copied into the file metadata.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use ragkit_core::{DocumentParser, DocumentType, Metadata, ParseError, ParsedDocument};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Maximum decompressed bytes read from a single ZIP entry.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Core property elements copied into file metadata (local name, target key).
const CORE_PROPERTIES: &[(&[u8], &str)] = &[
    (b"title", "title"),
    (b"creator", "author"),
    (b"subject", "subject"),
    (b"description", "description"),
    (b"keywords", "keywords"),
    (b"created", "created"),
    (b"modified", "modified"),
    (b"lastModifiedBy", "last_modified_by"),
];

/// Parser for DOCX files.
pub struct DocxParser;

impl DocxParser {
    /// Create a new DOCX parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentParser for DocxParser {
    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }

    fn supported_types(&self) -> &[&str] {
        &["application/vnd.openxmlformats-officedocument.wordprocessingml.document"]
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
        debug!(name, size = data.len(), "parsing docx");
        let size = data.len();
        let data = data.to_vec();

        let (content, mut file_metadata) = tokio::task::spawn_blocking(move || extract_docx(&data))
            .await
            .map_err(|e| ParseError::Malformed(format!("docx task failed: {e}")))??;

        file_metadata.insert("size_bytes".to_string(), size.into());
        file_metadata.insert(
            "mime_type".to_string(),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document".into(),
        );

        let title = file_metadata
            .get("title")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(ParsedDocument {
            content,
            document_type: DocumentType::Docx,
            file_metadata,
            title,
        })
    }
}

fn extract_docx(bytes: &[u8]) -> Result<(String, Metadata), ParseError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ParseError::Malformed(format!("not a docx archive: {e}")))?;

    let document_xml = read_entry(&mut archive, "word/document.xml")?
        .ok_or_else(|| ParseError::Malformed("word/document.xml not found".to_string()))?;
    let body = parse_document_xml(&document_xml)?;

    // Core properties are optional.
    let metadata = match read_entry(&mut archive, "docProps/core.xml")? {
        Some(xml) => parse_core_properties(&xml).unwrap_or_default(),
        None => Metadata::new(),
    };

    Ok((body, metadata))
}

/// Read one ZIP entry with a decompressed-size bound.
fn read_entry(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<Vec<u8>>, ParseError> {
    let entry = match archive.by_name(name) {
        Ok(e) => e,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ParseError::Malformed(format!("{name}: {e}"))),
    };

    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| ParseError::Malformed(format!("{name}: {e}")))?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ParseError::Malformed(format!(
            "{name} exceeds size limit ({MAX_XML_ENTRY_BYTES} bytes)"
        )));
    }
    Ok(Some(out))
}

/// Walk `word/document.xml`, collecting body paragraphs and tables.
fn parse_document_xml(xml: &[u8]) -> Result<String, ParseError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut paragraphs: Vec<String> = Vec::new();
    let mut tables: Vec<Vec<Vec<String>>> = Vec::new();

    let mut table_depth = 0usize;
    let mut current_rows: Vec<Vec<String>> = Vec::new();
    let mut current_cells: Vec<String> = Vec::new();
    let mut cell_text = String::new();
    let mut para_text = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"tbl" => {
                    table_depth += 1;
                    if table_depth == 1 {
                        current_rows.clear();
                    }
                }
                b"tr" if table_depth == 1 => current_cells.clear(),
                b"tc" if table_depth == 1 => cell_text.clear(),
                b"p" if table_depth == 0 => para_text.clear(),
                b"t" => in_text_run = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"tbl" => {
                    table_depth = table_depth.saturating_sub(1);
                    if table_depth == 0 && !current_rows.is_empty() {
                        tables.push(std::mem::take(&mut current_rows));
                    }
                }
                b"tr" if table_depth == 1 => {
                    if !current_cells.is_empty() {
                        current_rows.push(std::mem::take(&mut current_cells));
                    }
                }
                b"tc" if table_depth == 1 => {
                    current_cells.push(cell_text.trim().to_string());
                }
                b"p" if table_depth == 0 => {
                    let trimmed = para_text.trim();
                    if !trimmed.is_empty() {
                        paragraphs.push(trimmed.to_string());
                    }
                }
                b"t" => in_text_run = false,
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                let text = t
                    .unescape()
                    .map_err(|e| ParseError::Malformed(format!("document.xml: {e}")))?;
                if table_depth > 0 {
                    cell_text.push_str(&text);
                } else {
                    para_text.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Malformed(format!("document.xml: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    let mut content = paragraphs.join("\n\n");
    for (i, rows) in tables.iter().enumerate() {
        if !content.is_empty() {
            content.push_str("\n\n");
        }
        content.push_str(&format!("Table {}:\n", i + 1));
        let lines: Vec<String> = rows.iter().map(|cells| cells.join(" | ")).collect();
        content.push_str(&lines.join("\n"));
    }

    Ok(content)
}

/// Read `docProps/core.xml` into a metadata map.
fn parse_core_properties(xml: &[u8]) -> Result<Metadata, ParseError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut metadata = Metadata::new();
    let mut current: Option<&'static str> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                current = CORE_PROPERTIES
                    .iter()
                    .find(|(local, _)| e.local_name().as_ref() == *local)
                    .map(|(_, key)| *key);
            }
            Ok(Event::Text(t)) => {
                if let Some(key) = current {
                    let value = t
                        .unescape()
                        .map_err(|e| ParseError::Malformed(format!("core.xml: {e}")))?;
                    if !value.trim().is_empty() {
                        metadata.insert(key.to_string(), value.trim().into());
                    }
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Malformed(format!("core.xml: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    Ok(metadata)
}
