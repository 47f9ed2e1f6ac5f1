//! # ragkit-extract
//!
//! Document parsers for ragkit.
//!
//! Maps a source (path or byte blob) to extracted content, a media-type
//! classification, and system-derived file metadata. Dispatch goes by file
//! extension first, MIME type second, and defaults to plain text.
//!
//! | Parser | Formats |
//! |--------|---------|
//! | [`TextParser`] | Plain text, Markdown (UTF-8 with ISO-8859-1 retry) |
//! | [`HtmlParser`] | HTML (script/style removal, tag strip, whitespace collapse) |
//! | [`PdfParser`] | PDF (page-by-page text, info dictionary) |
//! | [`DocxParser`] | DOCX (paragraphs, labeled tables, core properties) |
//! | [`MediaParser`] | PNG/JPG/GIF/WebP and MP3/WAV/M4A (metadata only) |
//!
//! [`ParserRegistry`] wires the parsers together and applies the dispatch
//! rules.

pub mod docx;
pub mod html;
pub mod media;
pub mod pdf;
pub mod registry;
pub mod text;

pub use docx::DocxParser;
pub use html::HtmlParser;
pub use media::MediaParser;
pub use pdf::PdfParser;
pub use registry::ParserRegistry;
pub use text::TextParser;
