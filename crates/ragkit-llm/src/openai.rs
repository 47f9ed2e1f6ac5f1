//! OpenAI-compatible provider client.
//!
//! The same wire protocol serves OpenAI itself, Azure OpenAI deployments,
//! OpenRouter, and the HuggingFace router; only base URL and auth header
//! differ, so one client covers all four.

use async_trait::async_trait;
use ragkit_core::{
    ChatMessage, ChatOptions, ConfigError, EmbeddingError, GenerationError, LlmProvider,
};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde_json::json;

use crate::http::post_json;
use crate::response::{parse_chat, parse_embeddings};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const HUGGINGFACE_BASE_URL: &str = "https://router.huggingface.co/v1";

/// How the API key travels in request headers.
#[derive(Debug, Clone, Copy)]
enum AuthStyle {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `api-key: <key>` (Azure OpenAI)
    ApiKeyHeader,
}

/// Client for any OpenAI-compatible endpoint.
#[derive(Debug)]
pub struct OpenAiCompatible {
    name: &'static str,
    http: Client,
    base_url: String,
    api_key: String,
    auth: AuthStyle,
    max_retries: u32,
}

impl OpenAiCompatible {
    /// Client for the OpenAI API.
    pub fn openai(http: Client, api_key: Option<String>, max_retries: u32) -> Result<Self, ConfigError> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingCredential("OPENAI_API_KEY".to_string()))?;
        Ok(Self {
            name: "openai",
            http,
            base_url: OPENAI_BASE_URL.to_string(),
            api_key,
            auth: AuthStyle::Bearer,
            max_retries,
        })
    }

    /// Client for an Azure OpenAI deployment.
    pub fn azure(
        http: Client,
        endpoint: Option<String>,
        api_key: Option<String>,
        max_retries: u32,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingCredential("AZURE_OPENAI_API_KEY".to_string()))?;
        let endpoint = endpoint
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ConfigError::MissingOption("azure_openai_endpoint".to_string()))?;
        Ok(Self {
            name: "azure",
            http,
            base_url: endpoint.trim_end_matches('/').to_string(),
            api_key,
            auth: AuthStyle::ApiKeyHeader,
            max_retries,
        })
    }

    /// Client for OpenRouter.
    pub fn openrouter(http: Client, api_key: Option<String>, max_retries: u32) -> Result<Self, ConfigError> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingCredential("OPENROUTER_API_KEY".to_string()))?;
        Ok(Self {
            name: "openrouter",
            http,
            base_url: OPENROUTER_BASE_URL.to_string(),
            api_key,
            auth: AuthStyle::Bearer,
            max_retries,
        })
    }

    /// Client for the HuggingFace inference router.
    pub fn huggingface(http: Client, api_key: Option<String>, max_retries: u32) -> Result<Self, ConfigError> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingCredential("HUGGINGFACE_API_KEY".to_string()))?;
        Ok(Self {
            name: "huggingface",
            http,
            base_url: HUGGINGFACE_BASE_URL.to_string(),
            api_key,
            auth: AuthStyle::Bearer,
            max_retries,
        })
    }

    /// Client against an arbitrary base URL, for tests and self-hosted
    /// gateways.
    pub fn with_base_url(http: Client, base_url: String, api_key: String) -> Self {
        Self {
            name: "openai",
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            auth: AuthStyle::Bearer,
            max_retries: 0,
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        match self.auth {
            AuthStyle::Bearer => {
                if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
                    headers.insert("Authorization", value);
                }
            }
            AuthStyle::ApiKeyHeader => {
                if let Ok(value) = HeaderValue::from_str(&self.api_key) {
                    headers.insert("api-key", value);
                }
            }
        }
        headers
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatible {
    fn name(&self) -> &str {
        self.name
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

        let url = format!("{}/embeddings", self.base_url);
        let value = post_json(&self.http, &url, self.headers(), &body, self.max_retries)
            .await
            .map_err(EmbeddingError::Provider)?;

        let vectors = parse_embeddings(&value)?;
        if vectors.len() != inputs.len() {
            return Err(EmbeddingError::Provider(format!(
                "{} returned {} embeddings for {} inputs",
                self.name,
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
        let mut body = json!({
            "model": model,
            "messages": messages,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
        });
        if options.json {
            body["response_format"] = json!({"type": "json_object"});
        }

        let url = format!("{}/chat/completions", self.base_url);
        let value = post_json(&self.http, &url, self.headers(), &body, self.max_retries)
            .await
            .map_err(GenerationError::Provider)?;

        parse_chat(&value)
    }
}
