//! Google Generative Language API client.

use async_trait::async_trait;
use ragkit_core::{
    ChatMessage, ChatOptions, ConfigError, EmbeddingError, GenerationError, LlmProvider,
};
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde_json::{json, Value};

use crate::http::post_json;

const GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Google Generative Language API.
#[derive(Debug)]
pub struct GoogleProvider {
    http: Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl GoogleProvider {
    /// Create a client; fails when no API key is configured.
    pub fn new(http: Client, api_key: Option<String>, max_retries: u32) -> Result<Self, ConfigError> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingCredential("GOOGLE_API_KEY".to_string()))?;
        Ok(Self {
            http,
            base_url: GOOGLE_BASE_URL.to_string(),
            api_key,
            max_retries,
        })
    }

    #[cfg(test)]
    fn with_base_url(http: Client, base_url: String, api_key: String) -> Self {
        Self {
            http,
            base_url,
            api_key,
            max_retries: 0,
        }
    }
}

#[async_trait]
impl LlmProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn embed(
        &self,
        model: &str,
        inputs: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let requests: Vec<Value> = inputs
            .iter()
            .map(|text| {
                json!({
                    "model": format!("models/{model}"),
                    "content": {"parts": [{"text": text}]},
                })
            })
            .collect();
        let body = json!({"requests": requests});

        let url = format!(
            "{}/models/{}:batchEmbedContents?key={}",
            self.base_url, model, self.api_key
        );
        let value = post_json(&self.http, &url, HeaderMap::new(), &body, self.max_retries)
            .await
            .map_err(EmbeddingError::Provider)?;

        // {"embeddings": [{"values": [...]}, ...]}
        let embeddings = value
            .get("embeddings")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                EmbeddingError::UnrecognizedShape("missing embeddings array".to_string())
            })?;

        embeddings
            .iter()
            .map(|e| {
                e.get("values")
                    .and_then(Value::as_array)
                    .ok_or_else(|| {
                        EmbeddingError::UnrecognizedShape("embedding missing values".to_string())
                    })
                    .map(|vals| {
                        vals.iter()
                            .filter_map(Value::as_f64)
                            .map(|f| f as f32)
                            .collect()
                    })
            })
            .collect()
    }

    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, GenerationError> {
        // Gemini takes one contents array; system text becomes a leading part.
        let text: String = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let body = json!({
            "contents": [{"parts": [{"text": text}]}],
            "generationConfig": {
                "maxOutputTokens": options.max_tokens,
                "temperature": options.temperature,
            },
        });

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );
        let value = post_json(&self.http, &url, HeaderMap::new(), &body, self.max_retries)
            .await
            .map_err(GenerationError::Provider)?;

        value
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|c| c.first())
            .and_then(|c| c.pointer("/content/parts/0/text"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                GenerationError::UnrecognizedShape("missing candidates text".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_requires_api_key() {
        let err = GoogleProvider::new(Client::new(), None, 0).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(_)));
    }

    #[tokio::test]
    async fn test_embed_parses_values() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/text-embedding-004:batchEmbedContents");
                then.status(200).json_body(serde_json::json!({
                    "embeddings": [{"values": [0.5, 0.6]}]
                }));
            })
            .await;

        let provider =
            GoogleProvider::with_base_url(Client::new(), server.base_url(), "k".to_string());
        let vectors = provider
            .embed("text-embedding-004", &["x".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![0.5, 0.6]]);
    }

    #[tokio::test]
    async fn test_chat_parses_candidates() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/gemini-2.0-flash:generateContent");
                then.status(200).json_body(serde_json::json!({
                    "candidates": [
                        {"content": {"parts": [{"text": "gemini says hi"}]}}
                    ]
                }));
            })
            .await;

        let provider =
            GoogleProvider::with_base_url(Client::new(), server.base_url(), "k".to_string());
        let text = provider
            .chat(
                "gemini-2.0-flash",
                &[ChatMessage::user("hi")],
                &ChatOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(text, "gemini says hi");
    }

    #[tokio::test]
    async fn test_chat_unknown_shape_fails() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/m:generateContent");
                then.status(200).json_body(serde_json::json!({"weird": 1}));
            })
            .await;

        let provider =
            GoogleProvider::with_base_url(Client::new(), server.base_url(), "k".to_string());
        let err = provider
            .chat("m", &[ChatMessage::user("hi")], &ChatOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::UnrecognizedShape(_)));
    }
}
