//! The LLM gateway: one capability surface over every provider.
//!
//! The gateway resolves `(provider, model)` per task, cleans inputs, and
//! degrades to the deterministic fallbacks when a provider is missing a
//! credential or a call fails. Degraded mode is logged at `warn` and never
//! surfaces as an error to callers.

use ragkit_core::{ChatMessage, ChatOptions, ConfigError, GenerationError, LlmProvider};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::anthropic::AnthropicProvider;
use crate::config::{LlmConfig, LlmTask, ProviderId};
use crate::fallback;
use crate::google::GoogleProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiCompatible;

/// Inputs are truncated at this many characters before any provider call.
const MAX_INPUT_CHARS: usize = 8000;

/// Gateway over embedding and chat completion providers.
pub struct LlmGateway {
    config: LlmConfig,
    http: Client,
}

impl LlmGateway {
    /// Create a gateway.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be constructed.
    pub fn new(config: LlmConfig) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                option: "request_timeout_secs".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { config, http })
    }

    /// The configured embedding model name, task overrides applied.
    pub fn embedding_model(&self) -> String {
        self.config.model_for(LlmTask::Embedding).1
    }

    /// The embedding dimension used for fallback vectors.
    pub fn embedding_dimension(&self) -> usize {
        self.config.embedding_dimension
    }

    /// The active configuration.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Construct the provider client for `id`.
    fn build_provider(&self, id: ProviderId) -> Result<Arc<dyn LlmProvider>, ConfigError> {
        let creds = &self.config.credentials;
        let retries = self.config.max_retries;
        let http = self.http.clone();

        Ok(match id {
            ProviderId::OpenAi => Arc::new(OpenAiCompatible::openai(
                http,
                creds.openai_api_key.clone(),
                retries,
            )?),
            ProviderId::Azure => Arc::new(OpenAiCompatible::azure(
                http,
                creds.azure_openai_endpoint.clone(),
                creds.azure_openai_api_key.clone(),
                retries,
            )?),
            ProviderId::OpenRouter => Arc::new(OpenAiCompatible::openrouter(
                http,
                creds.openrouter_api_key.clone(),
                retries,
            )?),
            ProviderId::HuggingFace => Arc::new(OpenAiCompatible::huggingface(
                http,
                creds.huggingface_api_key.clone(),
                retries,
            )?),
            ProviderId::Anthropic => Arc::new(AnthropicProvider::new(
                http,
                creds.anthropic_api_key.clone(),
                retries,
            )?),
            ProviderId::Google => Arc::new(GoogleProvider::new(
                http,
                creds.google_api_key.clone(),
                retries,
            )?),
            ProviderId::Ollama => {
                Arc::new(OllamaProvider::new(http, creds.ollama_endpoint.clone(), retries))
            }
        })
    }

    // ------------------------------------------------------------------
    // Embeddings
    // ------------------------------------------------------------------

    /// Embed one text. Empty input yields `None` without any provider call;
    /// provider failures degrade to a deterministic pseudo-vector.
    pub async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let cleaned = clean_input(text);
        if cleaned.is_empty() {
            return None;
        }
        self.embed_batch(&[cleaned]).await.into_iter().next().flatten()
    }

    /// Embed a batch. Output is aligned with the input; empty inputs map to
    /// `None`.
    pub async fn embed_batch(&self, texts: &[String]) -> Vec<Option<Vec<f32>>> {
        let cleaned: Vec<(usize, String)> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| (i, clean_input(t)))
            .filter(|(_, t)| !t.is_empty())
            .collect();

        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        if cleaned.is_empty() {
            return results;
        }

        let inputs: Vec<String> = cleaned.iter().map(|(_, t)| t.clone()).collect();
        let (provider_id, model) = self.config.model_for(LlmTask::Embedding);

        let vectors = match self.build_provider(provider_id) {
            Ok(provider) => match provider.embed(&model, &inputs).await {
                Ok(vectors) => {
                    debug!(provider = %provider_id, model, count = vectors.len(), "embedded batch");
                    Some(vectors)
                }
                Err(e) => {
                    warn!(provider = %provider_id, error = %e, "embedding call failed, using deterministic fallback");
                    None
                }
            },
            Err(e) => {
                warn!(provider = %provider_id, error = %e, "embedding provider unavailable, using deterministic fallback");
                None
            }
        };

        let dimension = self.config.embedding_dimension;
        let vectors = vectors.unwrap_or_else(|| {
            inputs
                .iter()
                .map(|t| fallback::pseudo_embedding(t, dimension))
                .collect()
        });

        for ((original_index, _), vector) in cleaned.into_iter().zip(vectors) {
            results[original_index] = Some(vector);
        }
        results
    }

    // ------------------------------------------------------------------
    // Summarization
    // ------------------------------------------------------------------

    /// Summarize `text` to at most `max_length` characters.
    ///
    /// Returns early with the original text when it is shorter than the
    /// configured minimum or summarization is disabled; degrades to the
    /// extractive fallback on provider failure.
    pub async fn summarize(&self, text: &str, max_length: Option<usize>) -> String {
        let text = text.trim();
        if text.is_empty() {
            return String::new();
        }

        let max_length = max_length.unwrap_or(self.config.summary_max_length);
        if !self.config.summarization_enabled || text.len() < self.config.summary_min_content_length
        {
            return text.to_string();
        }

        let (provider_id, model) = self.config.model_for(LlmTask::Summarization);
        let prompt = format!(
            "Summarize the following content in at most {max_length} characters. \
             Respond with the summary only.\n\n{}",
            clean_input(text)
        );
        let messages = [ChatMessage::user(prompt)];
        let options = ChatOptions::default();

        match self.try_chat(provider_id, &model, &messages, &options).await {
            Ok(summary) => truncate_chars(summary.trim(), max_length),
            Err(e) => {
                warn!(provider = %provider_id, error = %e, "summarization failed, using extractive fallback");
                fallback::extractive_summary(text, max_length)
            }
        }
    }

    // ------------------------------------------------------------------
    // Keywords
    // ------------------------------------------------------------------

    /// Extract up to `max` keywords, importance-descending.
    pub async fn extract_keywords(&self, text: &str, max: usize) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() || max == 0 {
            return vec![];
        }

        let (provider_id, model) = self.config.model_for(LlmTask::Keywords);
        let prompt = format!(
            "Extract up to {max} keywords from the following content, ordered by \
             importance. Respond with one keyword per line and nothing else.\n\n{}",
            clean_input(text)
        );
        let messages = [ChatMessage::user(prompt)];
        let options = ChatOptions::default();

        match self.try_chat(provider_id, &model, &messages, &options).await {
            Ok(response) => parse_keyword_list(&response, max),
            Err(e) => {
                warn!(provider = %provider_id, error = %e, "keyword extraction failed, using frequency fallback");
                fallback::frequency_keywords(text, max)
            }
        }
    }

    // ------------------------------------------------------------------
    // Chat
    // ------------------------------------------------------------------

    /// Run a chat completion for `task`. Unlike [`summarize`] and
    /// [`extract_keywords`] this surfaces errors so callers with their own
    /// fallback (the metadata generator) can decide what to do.
    ///
    /// [`summarize`]: Self::summarize
    /// [`extract_keywords`]: Self::extract_keywords
    pub async fn chat(
        &self,
        task: LlmTask,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, GenerationError> {
        let (provider_id, model) = self.config.model_for(task);
        self.try_chat(provider_id, &model, messages, options).await
    }

    async fn try_chat(
        &self,
        provider_id: ProviderId,
        model: &str,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, GenerationError> {
        let provider = self
            .build_provider(provider_id)
            .map_err(|e| GenerationError::Provider(e.to_string()))?;
        provider.chat(model, messages, options).await
    }
}

/// Collapse whitespace runs to single spaces and truncate long inputs.
pub fn clean_input(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, MAX_INPUT_CHARS)
}

/// Truncate at a character boundary.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

/// Parse a provider keyword response: one keyword per line or comma list,
/// numbering stripped, short tokens dropped, de-duplicated, capped.
fn parse_keyword_list(response: &str, max: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut keywords = Vec::new();

    for part in response.lines().flat_map(|l| l.split(',')) {
        let word = strip_numbering(part).trim().to_lowercase();
        if word.len() < 2 {
            continue;
        }
        if seen.insert(word.clone()) {
            keywords.push(word);
        }
        if keywords.len() == max {
            break;
        }
    }

    keywords
}

/// Remove leading list markers like `1.`, `2)`, `-`, `*`.
fn strip_numbering(s: &str) -> &str {
    s.trim_start()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches(['.', ')', '-', '*'])
        .trim_start()
}
