//! Metadata generation: prompt, validate, merge, fallback.

use ragkit_core::{ChatOptions, Document, DocumentType, Metadata};
use ragkit_llm::{LlmGateway, LlmTask};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::prompt::build_messages;
use crate::schema::{merge_under, schema_for};

/// Keywords requested from the fallback extractor.
const FALLBACK_KEYWORD_COUNT: usize = 10;

/// Generates schema-conforming, AI-derived metadata for documents.
pub struct MetadataGenerator {
    gateway: Arc<LlmGateway>,
}

impl MetadataGenerator {
    /// Create a generator over the given gateway.
    pub fn new(gateway: Arc<LlmGateway>) -> Self {
        Self { gateway }
    }

    /// Whether `document` already carries every required metadata key.
    pub fn required_present(&self, document: &Document) -> bool {
        schema_for(document.document_type).required_present(&document.metadata)
    }

    /// Generate metadata for `document` and merge it under the existing
    /// metadata (caller-set values win).
    ///
    /// Provider failures degrade to deterministic fallback synthesis;
    /// validation problems are logged but never fail the call.
    pub async fn generate(&self, document: &Document, content: &str) -> Metadata {
        let schema = schema_for(document.document_type);
        let messages = build_messages(document, content, schema);
        let options = ChatOptions {
            json: true,
            ..ChatOptions::default()
        };

        let generated = match self.gateway.chat(LlmTask::Metadata, &messages, &options).await {
            Ok(response) => match extract_json_object(&response) {
                Some(parsed) => parsed,
                None => {
                    warn!(
                        document_id = %document.id,
                        "metadata response was not a JSON object, using fallback"
                    );
                    self.fallback_metadata(document, content).await
                }
            },
            Err(e) => {
                warn!(document_id = %document.id, error = %e, "metadata generation degraded to fallback");
                self.fallback_metadata(document, content).await
            }
        };

        let outcome = schema.validate(&generated);
        for reason in &outcome.dropped {
            warn!(document_id = %document.id, schema = schema.name, reason, "dropped metadata field");
        }
        if !outcome.missing_required.is_empty() {
            tracing::error!(
                document_id = %document.id,
                schema = schema.name,
                missing = ?outcome.missing_required,
                "generated metadata is missing required fields"
            );
        }

        debug!(
            document_id = %document.id,
            fields = outcome.metadata.len(),
            "metadata generated"
        );
        merge_under(&document.metadata, outcome.metadata)
    }

    /// Deterministic metadata synthesis when no provider is available.
    ///
    /// Fills every required field of the document's schema from the
    /// fallback summarizer and keyword extractor plus neutral enum
    /// defaults.
    async fn fallback_metadata(&self, document: &Document, content: &str) -> Metadata {
        let source = if content.trim().is_empty() {
            document.title.as_str()
        } else {
            content
        };

        let mut metadata = Metadata::new();
        let summary = self.gateway.summarize(source, None).await;
        metadata.insert("summary".to_string(), summary.into());
        metadata.insert("classification".to_string(), "other".into());

        match document.document_type {
            DocumentType::Image => {
                metadata.insert("description".to_string(), document.title.clone().into());
                metadata.insert("scene_type".to_string(), "other".into());
            }
            DocumentType::Audio => {
                metadata.insert("content_type".to_string(), "other".into());
            }
            DocumentType::Pdf => {
                metadata.insert("document_type".to_string(), "other".into());
                let keywords = self.gateway.extract_keywords(source, FALLBACK_KEYWORD_COUNT).await;
                metadata.insert("keywords".to_string(), keywords.into());
            }
            DocumentType::Mixed => {
                metadata.insert("content_types".to_string(), vec!["text".to_string()].into());
                metadata.insert("primary_content_type".to_string(), "text".into());
            }
            _ => {
                let keywords = self.gateway.extract_keywords(source, FALLBACK_KEYWORD_COUNT).await;
                metadata.insert("keywords".to_string(), keywords.into());
            }
        }

        metadata
    }
}

/// Pull the first JSON object out of a chat response.
///
/// Providers wrap JSON in prose or code fences often enough that the
/// object is located positionally rather than parsed whole.
fn extract_json_object(response: &str) -> Option<Metadata> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&response[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use ragkit_llm::{Credentials, LlmConfig, ProviderId};
    use serde_json::json;

    fn gateway_without_credentials() -> Arc<LlmGateway> {
        Arc::new(
            LlmGateway::new(LlmConfig {
                summary_min_content_length: 10,
                ..LlmConfig::default()
            })
            .unwrap(),
        )
    }

    fn gateway_with_ollama(endpoint: String) -> Arc<LlmGateway> {
        Arc::new(
            LlmGateway::new(LlmConfig {
                default_provider: ProviderId::Ollama,
                credentials: Credentials {
                    ollama_endpoint: Some(endpoint),
                    ..Credentials::default()
                },
                max_retries: 0,
                ..LlmConfig::default()
            })
            .unwrap(),
        )
    }

    #[test]
    fn test_extract_json_object_plain() {
        let parsed = extract_json_object(r#"{"summary": "s"}"#).unwrap();
        assert_eq!(parsed["summary"], "s");
    }

    #[test]
    fn test_extract_json_object_fenced() {
        let response = "Here you go:\n```json\n{\"summary\": \"s\"}\n```\n";
        let parsed = extract_json_object(response).unwrap();
        assert_eq!(parsed["summary"], "s");
    }

    #[test]
    fn test_extract_json_object_garbage() {
        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object("}{").is_none());
        assert!(extract_json_object("[1, 2]").is_none());
    }

    #[tokio::test]
    async fn test_generate_from_provider_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(json!({
                    "response": r#"{"summary": "about databases", "keywords": ["sql", "index"], "classification": "documentation", "sentiment": "neutral"}"#,
                    "done": true
                }));
            })
            .await;

        let generator = MetadataGenerator::new(gateway_with_ollama(server.base_url()));
        let document = Document::new("/d", "db notes", DocumentType::Text);
        let metadata = generator.generate(&document, "database content").await;

        assert_eq!(metadata["summary"], "about databases");
        assert_eq!(metadata["classification"], "documentation");
        // Unknown fields are dropped with a warning.
        assert!(!metadata.contains_key("sentiment"));
    }

    #[tokio::test]
    async fn test_generate_fallback_fills_required_fields() {
        let generator = MetadataGenerator::new(gateway_without_credentials());
        let document = Document::new("/d", "t", DocumentType::Text);
        let content = "Networking stacks route packets. Routers forward datagrams between hosts.";
        let metadata = generator.generate(&document, content).await;

        let summary = metadata["summary"].as_str().unwrap();
        assert!(!summary.is_empty());
        assert!(summary.len() <= 500);
        assert_eq!(metadata["classification"], "other");
        assert!(metadata["keywords"].as_array().is_some());
    }

    #[tokio::test]
    async fn test_generate_merges_under_existing() {
        let generator = MetadataGenerator::new(gateway_without_credentials());
        let mut document = Document::new("/d", "t", DocumentType::Text);
        document
            .metadata
            .insert("summary".to_string(), "caller wrote this".into());

        let metadata = generator
            .generate(&document, "content long enough to summarize with sentences.")
            .await;

        assert_eq!(metadata["summary"], "caller wrote this");
        assert!(metadata.contains_key("classification"));
    }

    #[tokio::test]
    async fn test_generate_idempotent_given_same_inputs() {
        let generator = MetadataGenerator::new(gateway_without_credentials());
        let document = Document::new("/d", "t", DocumentType::Text);
        let content = "Deterministic fallback produces the same metadata each run. Always.";

        let first = generator.generate(&document, content).await;
        let second = generator.generate(&document, content).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_fallback_mixed_document_fields() {
        let generator = MetadataGenerator::new(gateway_without_credentials());
        let document = Document::new("/d", "t", DocumentType::Mixed);
        let metadata = generator.generate(&document, "mixed body content here.").await;

        assert_eq!(metadata["primary_content_type"], "text");
        assert_eq!(metadata["content_types"], json!(["text"]));
    }

    #[test]
    fn test_required_present_delegates_to_schema() {
        let generator = MetadataGenerator::new(gateway_without_credentials());
        let mut document = Document::new("/d", "t", DocumentType::Text);
        assert!(!generator.required_present(&document));

        document.metadata = json!({
            "summary": "s",
            "keywords": ["k"],
            "classification": "other"
        })
        .as_object()
        .unwrap()
        .clone();
        assert!(generator.required_present(&document));
    }
}
