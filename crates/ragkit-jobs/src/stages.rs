//! The three pipeline stages: extract text, generate metadata, generate
//! embeddings.
//!
//! Every stage is idempotent and treats a missing document as a
//! successful no-op. Failures move the document to `error`; the caller
//! decides whether to surface or swallow the returned error.

use chrono::Utc;
use ragkit_core::{
    AudioContent, ChunkParams, ContentRecord, DocumentError, DocumentStatus, DocumentType,
    Embedding, Error, ImageContent, Metadata, Result, TextContent,
};
use serde_json::Value;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::runner::JobContext;

/// Extract content from the attached file into a new content record.
///
/// Precondition: a file blob is attached and the document has no content
/// records yet. Empty extraction from an extractable format moves the
/// document to `error`.
pub async fn extract_text(ctx: &JobContext, document_id: Uuid) -> Result<()> {
    let Some(mut document) = ctx.store.get_document(document_id).await? else {
        debug!(%document_id, "extract_text: document gone, nothing to do");
        return Ok(());
    };

    let contents = ctx.store.contents_for_document(document_id).await?;
    if !contents.is_empty() {
        debug!(%document_id, "extract_text: content already present, skipping");
        return Ok(());
    }

    let Some(blob) = document.file_blob.clone() else {
        debug!(%document_id, "extract_text: no file attached, skipping");
        return Ok(());
    };

    ctx.store
        .set_status(document_id, DocumentStatus::Processing)
        .await?;

    let name = file_name(&document.location);
    let parsed = match ctx.parsers.parse_bytes(&blob, &name).await {
        Ok(parsed) => parsed,
        Err(e) => {
            error!(%document_id, error = %e, "extraction failed");
            let _ = ctx
                .store
                .set_status(document_id, DocumentStatus::Error)
                .await;
            return Err(Error::Parse(e));
        }
    };

    // File-derived metadata lands in the file namespace only.
    for (key, value) in parsed.file_metadata {
        document.file_metadata.insert(key, value);
    }
    if document.title.is_empty() {
        if let Some(title) = parsed.title {
            document.title = title;
        }
    }

    let record = match document.document_type {
        DocumentType::Image => ContentRecord::Image(ImageContent {
            id: Uuid::new_v4(),
            document_id,
            description: None,
            alt_text: None,
            data: Some(blob),
            metadata: Metadata::new(),
            created_at: Utc::now(),
        }),
        DocumentType::Audio => ContentRecord::Audio(AudioContent {
            id: Uuid::new_v4(),
            document_id,
            transcript: None,
            duration_secs: document
                .file_metadata
                .get("duration_secs")
                .and_then(Value::as_f64),
            sample_rate: document
                .file_metadata
                .get("sample_rate")
                .and_then(Value::as_u64)
                .map(|v| v as u32),
            data: Some(blob),
            metadata: Metadata::new(),
            created_at: Utc::now(),
        }),
        _ => {
            if parsed.content.trim().is_empty() {
                error!(%document_id, "extraction produced no content");
                let _ = ctx
                    .store
                    .set_status(document_id, DocumentStatus::Error)
                    .await;
                return Err(Error::Document(DocumentError::NoContent(document_id)));
            }
            ContentRecord::Text(TextContent {
                id: Uuid::new_v4(),
                document_id,
                content: parsed.content,
                embedding_model: Some(ctx.gateway.embedding_model()),
                chunk_size: ctx.chunk_params.chunk_size,
                overlap: ctx.chunk_params.overlap,
                metadata: Metadata::new(),
                created_at: Utc::now(),
            })
        }
    };

    ctx.store.update_document(&document).await?;
    ctx.store.insert_content(&record).await?;
    info!(%document_id, kind = %record.kind(), "content extracted");
    Ok(())
}

/// Generate and merge AI metadata; a no-op when the required keys are
/// already present.
pub async fn generate_metadata(ctx: &JobContext, document_id: Uuid) -> Result<()> {
    let Some(mut document) = ctx.store.get_document(document_id).await? else {
        debug!(%document_id, "generate_metadata: document gone, nothing to do");
        return Ok(());
    };

    if ctx.generator.required_present(&document) {
        debug!(%document_id, "generate_metadata: required keys present, skipping");
        return Ok(());
    }

    let contents = ctx.store.contents_for_document(document_id).await?;
    let content_text: String = contents
        .iter()
        .filter_map(ContentRecord::embeddable_text)
        .collect::<Vec<_>>()
        .join("\n\n");

    document.metadata = ctx.generator.generate(&document, &content_text).await;
    ctx.store.update_document(&document).await?;
    info!(%document_id, "metadata generated");
    Ok(())
}

/// Chunk each content record and persist one embedding per chunk; a
/// no-op when the document already has embeddings.
pub async fn generate_embeddings(
    ctx: &JobContext,
    document_id: Uuid,
    params: Option<ChunkParams>,
) -> Result<()> {
    if ctx.store.get_document(document_id).await?.is_none() {
        debug!(%document_id, "generate_embeddings: document gone, nothing to do");
        return Ok(());
    }

    let existing = ctx.store.embeddings_for_document(document_id).await?;
    if !existing.is_empty() {
        debug!(%document_id, count = existing.len(), "embeddings already exist, skipping");
        return Ok(());
    }

    let contents = ctx.store.contents_for_document(document_id).await?;
    let model = ctx.gateway.embedding_model();
    let mut total = 0usize;

    for record in &contents {
        let Some(text) = record.embeddable_text() else {
            continue;
        };

        let content_params = match record {
            ContentRecord::Text(c) => ChunkParams::new(c.chunk_size, c.overlap),
            _ => ctx.chunk_params,
        };
        let effective = params.unwrap_or(content_params);

        let chunks = ctx.chunkers.chunk(None, text, &effective);
        if chunks.is_empty() {
            continue;
        }

        let vectors = ctx.gateway.embed_batch(&chunks).await;

        let mut embedding_metadata = Metadata::new();
        embedding_metadata.insert("chunk_size".to_string(), effective.chunk_size.into());
        embedding_metadata.insert("overlap".to_string(), effective.overlap.into());

        let mut chunk_index = 0u32;
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            // A missing embedding is skipped, not an error.
            let Some(vector) = vector else {
                continue;
            };

            let embedding = Embedding {
                id: Uuid::new_v4(),
                content_kind: record.kind(),
                content_id: record.id(),
                chunk_index,
                content: chunk,
                vector,
                embedding_model: model.clone(),
                usage_count: 0,
                returned_at: None,
                metadata: embedding_metadata.clone(),
                created_at: Utc::now(),
            };
            ctx.store.insert_embedding(&embedding).await?;
            chunk_index += 1;
            total += 1;
        }
    }

    info!(%document_id, embeddings = total, "embeddings generated");
    Ok(())
}

/// Mark a document processed after a successful pipeline run.
pub async fn finalize(ctx: &JobContext, document_id: Uuid) -> Result<()> {
    if let Some(document) = ctx.store.get_document(document_id).await? {
        match document.status {
            DocumentStatus::Error => {}
            // A document whose stages were all no-ops never left pending;
            // it still walks the legal transition path.
            DocumentStatus::Pending => {
                ctx.store
                    .set_status(document_id, DocumentStatus::Processing)
                    .await?;
                ctx.store
                    .set_status(document_id, DocumentStatus::Processed)
                    .await?;
            }
            _ => {
                ctx.store
                    .set_status(document_id, DocumentStatus::Processed)
                    .await?;
            }
        }
    }
    Ok(())
}

/// Extract the file-name portion of a location for parser dispatch.
fn file_name(location: &str) -> String {
    location
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(location)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_location() {
        assert_eq!(file_name("/a/b/c.txt"), "c.txt");
        assert_eq!(file_name("c.txt"), "c.txt");
        assert_eq!(file_name("C:\\docs\\r.pdf"), "r.pdf");
        assert_eq!(file_name("inline://text"), "text");
    }
}
