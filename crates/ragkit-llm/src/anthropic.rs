//! Anthropic messages API client.
//!
//! Anthropic has no embeddings endpoint; embedding calls return a typed
//! "not supported" error that the gateway routes to the fallback path.

use async_trait::async_trait;
use ragkit_core::{
    ChatMessage, ChatOptions, ConfigError, EmbeddingError, GenerationError, LlmProvider,
};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde_json::json;

use crate::http::post_json;
use crate::response::parse_chat;

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for the Anthropic messages API.
#[derive(Debug)]
pub struct AnthropicProvider {
    http: Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl AnthropicProvider {
    /// Create a client; fails when no API key is configured.
    pub fn new(http: Client, api_key: Option<String>, max_retries: u32) -> Result<Self, ConfigError> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingCredential("ANTHROPIC_API_KEY".to_string()))?;
        Ok(Self {
            http,
            base_url: ANTHROPIC_BASE_URL.to_string(),
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

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.api_key) {
            headers.insert("x-api-key", value);
        }
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn embed(
        &self,
        _model: &str,
        _inputs: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::NotSupported("anthropic".to_string()))
    }

    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, GenerationError> {
        // System messages travel in a dedicated field.
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == "system")
            .map(|m| m.content.as_str())
            .collect();
        let turns: Vec<&ChatMessage> = messages.iter().filter(|m| m.role != "system").collect();

        let mut body = json!({
            "model": model,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
            "messages": turns,
        });
        if !system.is_empty() {
            body["system"] = json!(system.join("\n"));
        }

        let url = format!("{}/v1/messages", self.base_url);
        let value = post_json(&self.http, &url, self.headers(), &body, self.max_retries)
            .await
            .map_err(GenerationError::Provider)?;

        parse_chat(&value)
    }
}
