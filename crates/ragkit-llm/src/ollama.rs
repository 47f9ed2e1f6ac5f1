//! Local Ollama client.

use async_trait::async_trait;
use ragkit_core::{ChatMessage, ChatOptions, EmbeddingError, GenerationError, LlmProvider};
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde_json::json;

use crate::http::post_json;
use crate::response::{parse_chat, parse_embeddings};

const DEFAULT_OLLAMA_ENDPOINT: &str = "http://127.0.0.1:11434";

/// Client for a local Ollama runtime.
///
/// No credential is required; construction always succeeds and failures
/// surface per-call when the runtime is unreachable.
pub struct OllamaProvider {
    http: Client,
    endpoint: String,
    max_retries: u32,
}

impl OllamaProvider {
    /// Create a client against `endpoint`, defaulting to the local runtime.
    pub fn new(http: Client, endpoint: Option<String>, max_retries: u32) -> Self {
        let endpoint = endpoint
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_OLLAMA_ENDPOINT.to_string());
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            max_retries,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn embed(
        &self,
        model: &str,
        inputs: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let body = json!({
            "model": model,
            "input": inputs,
        });

        let url = format!("{}/api/embed", self.endpoint);
        let value = post_json(&self.http, &url, HeaderMap::new(), &body, self.max_retries)
            .await
            .map_err(EmbeddingError::Provider)?;

        let vectors = parse_embeddings(&value)?;
        if vectors.len() != inputs.len() {
            return Err(EmbeddingError::Provider(format!(
                "ollama returned {} embeddings for {} inputs",
                vectors.len(),
                inputs.len()
            )));
        }
        Ok(vectors)
    }

    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, GenerationError> {
        let prompt: String = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut body = json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
            "options": {"temperature": options.temperature},
        });
        if options.json {
            body["format"] = json!("json");
        }

        let url = format!("{}/api/generate", self.endpoint);
        let value = post_json(&self.http, &url, HeaderMap::new(), &body, self.max_retries)
            .await
            .map_err(GenerationError::Provider)?;

        parse_chat(&value).map(|s| s.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_default_endpoint() {
        let provider = OllamaProvider::new(Client::new(), None, 0);
        assert_eq!(provider.endpoint, DEFAULT_OLLAMA_ENDPOINT);
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let provider =
            OllamaProvider::new(Client::new(), Some("http://host:11434/".to_string()), 0);
        assert_eq!(provider.endpoint, "http://host:11434");
    }

    #[tokio::test]
    async fn test_embed_parses_embeddings_shape() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/embed");
                then.status(200).json_body(serde_json::json!({
                    "embeddings": [[0.1, 0.2, 0.3]]
                }));
            })
            .await;

        let provider = OllamaProvider::new(Client::new(), Some(server.base_url()), 0);
        let vectors = provider
            .embed("nomic-embed-text", &["hello".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![0.1, 0.2, 0.3]]);
    }

    #[tokio::test]
    async fn test_embed_count_mismatch_fails() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/embed");
                then.status(200)
                    .json_body(serde_json::json!({"embeddings": [[0.1]]}));
            })
            .await;

        let provider = OllamaProvider::new(Client::new(), Some(server.base_url()), 0);
        let err = provider
            .embed("m", &["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::Provider(_)));
    }

    #[tokio::test]
    async fn test_chat_parses_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(serde_json::json!({
                    "response": "  generated text  ",
                    "done": true
                }));
            })
            .await;

        let provider = OllamaProvider::new(Client::new(), Some(server.base_url()), 0);
        let text = provider
            .chat("llama3.2", &[ChatMessage::user("hi")], &ChatOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "generated text");
    }

    #[tokio::test]
    async fn test_unreachable_runtime_surfaces_provider_error() {
        let provider = OllamaProvider::new(
            Client::builder()
                .timeout(std::time::Duration::from_millis(200))
                .build()
                .unwrap(),
            Some("http://127.0.0.1:1".to_string()),
            0,
        );
        let err = provider.embed("m", &["x".to_string()]).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Provider(_)));
    }
}
