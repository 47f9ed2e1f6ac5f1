//! Prompt construction for metadata generation.

use ragkit_core::{ChatMessage, Document, DocumentType};

use crate::schema::{FieldKind, MetadataSchema};

/// Content preview included in prompts is capped at this many characters.
const PREVIEW_CHARS: usize = 2000;

/// Build the chat messages for a metadata generation request.
///
/// The system message pins the response to a strict JSON object matching
/// the schema; the user message carries type-specific instructions, a
/// bounded content preview, and the file metadata for PDFs and media.
pub fn build_messages(
    document: &Document,
    content: &str,
    schema: &MetadataSchema,
) -> Vec<ChatMessage> {
    let mut field_lines = String::new();
    for field in schema.fields {
        let requirement = if field.required { "required" } else { "optional" };
        let kind = match field.kind {
            FieldKind::Text => "string".to_string(),
            FieldKind::TextArray { max_items } => {
                format!("array of strings, at most {max_items}")
            }
            FieldKind::Enum(allowed) => format!("one of: {}", allowed.join(", ")),
            FieldKind::EnumArray { allowed, max_items } => {
                format!("array (at most {max_items}) of: {}", allowed.join(", "))
            }
        };
        field_lines.push_str(&format!("- {} ({requirement}): {kind}\n", field.name));
    }

    let system = format!(
        "You extract document metadata. Respond with a single JSON object and \
         no other text. Fields:\n{field_lines}"
    );

    let mut user = String::new();
    user.push_str(type_instructions(document.document_type));
    user.push_str(&format!("\n\nTitle: {}\n", document.title));

    if include_file_metadata(document.document_type) && !document.file_metadata.is_empty() {
        user.push_str(&format!(
            "File metadata: {}\n",
            serde_json::Value::Object(document.file_metadata.clone())
        ));
    }

    let preview: String = content.chars().take(PREVIEW_CHARS).collect();
    if !preview.is_empty() {
        user.push_str(&format!("\nContent:\n{preview}\n"));
    }

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Content-type-specific instructions.
fn type_instructions(document_type: DocumentType) -> &'static str {
    match document_type {
        DocumentType::Image => {
            "Describe the image and classify its scene based on the available \
             description and file metadata."
        }
        DocumentType::Audio => {
            "Summarize the audio transcript and classify the kind of recording."
        }
        DocumentType::Pdf => {
            "Summarize this PDF document and classify what kind of document it is."
        }
        DocumentType::Mixed => {
            "This document mixes modalities. Summarize it, list the modalities \
             present, and name the dominant one."
        }
        _ => "Summarize the document, extract its key terms, and classify it.",
    }
}

/// File metadata is prompt-relevant for PDFs and stored media.
fn include_file_metadata(document_type: DocumentType) -> bool {
    matches!(
        document_type,
        DocumentType::Pdf | DocumentType::Image | DocumentType::Audio
    )
}
