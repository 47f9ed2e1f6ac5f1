//! Gateway configuration: providers, credentials, models, and task
//! overrides.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Supported provider backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Anthropic,
    Google,
    Azure,
    Ollama,
    HuggingFace,
    OpenRouter,
}

impl ProviderId {
    /// Parse a provider name as used in `"provider/model"` overrides.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "anthropic" => Some(Self::Anthropic),
            "google" => Some(Self::Google),
            "azure" => Some(Self::Azure),
            "ollama" => Some(Self::Ollama),
            "huggingface" => Some(Self::HuggingFace),
            "openrouter" => Some(Self::OpenRouter),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Azure => "azure",
            Self::Ollama => "ollama",
            Self::HuggingFace => "huggingface",
            Self::OpenRouter => "openrouter",
        };
        f.write_str(s)
    }
}

/// Gateway tasks that can carry per-task model overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmTask {
    Embedding,
    Summarization,
    Keywords,
    Metadata,
}

/// Provider credentials, read from the environment with in-process
/// overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub azure_openai_api_key: Option<String>,
    pub azure_openai_endpoint: Option<String>,
    pub ollama_endpoint: Option<String>,
    pub huggingface_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
}

impl Credentials {
    /// Read credentials from the recognized environment variables.
    pub fn from_env() -> Self {
        let get = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            openai_api_key: get("OPENAI_API_KEY"),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            google_api_key: get("GOOGLE_API_KEY"),
            azure_openai_api_key: get("AZURE_OPENAI_API_KEY"),
            azure_openai_endpoint: get("AZURE_OPENAI_ENDPOINT"),
            ollama_endpoint: get("OLLAMA_ENDPOINT"),
            huggingface_api_key: get("HUGGINGFACE_API_KEY"),
            openrouter_api_key: get("OPENROUTER_API_KEY"),
        }
    }
}

/// Configuration for the LLM gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider used when no task override applies
    pub default_provider: ProviderId,
    /// Credentials per provider
    pub credentials: Credentials,
    /// Default embedding model
    pub embedding_model: String,
    /// Default chat model
    pub chat_model: String,
    /// Per-task overrides as `"provider/model"` or bare model names
    pub task_models: HashMap<LlmTask, String>,
    /// Dimension advertised by the embedding model; also the dimension of
    /// fallback pseudo-vectors
    pub embedding_dimension: usize,
    /// Disable summarization entirely
    pub summarization_enabled: bool,
    /// Inputs shorter than this are returned unsummarized
    pub summary_min_content_length: usize,
    /// Upper bound on generated summary length in characters
    pub summary_max_length: usize,
    /// Per-call HTTP timeout
    pub request_timeout_secs: u64,
    /// Retries for rate-limited and server-error responses
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: ProviderId::OpenAi,
            credentials: Credentials::default(),
            embedding_model: "text-embedding-3-small".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            task_models: HashMap::new(),
            embedding_dimension: 1536,
            summarization_enabled: true,
            summary_min_content_length: 100,
            summary_max_length: 500,
            request_timeout_secs: 30,
            max_retries: 2,
        }
    }
}

impl LlmConfig {
    /// Config with credentials pulled from the environment.
    pub fn from_env() -> Self {
        Self {
            credentials: Credentials::from_env(),
            ..Self::default()
        }
    }

    /// Resolve the `(provider, model)` pair for a task.
    ///
    /// Task overrides written as `"provider/model"` select both; a bare
    /// model name keeps the default provider.
    pub fn model_for(&self, task: LlmTask) -> (ProviderId, String) {
        let default_model = match task {
            LlmTask::Embedding => &self.embedding_model,
            _ => &self.chat_model,
        };

        match self.task_models.get(&task) {
            Some(spec) => match spec.split_once('/') {
                Some((provider, model)) => match ProviderId::parse(provider) {
                    Some(id) => (id, model.to_string()),
                    // Slash inside a bare model name (e.g. HF repo ids).
                    None => (self.default_provider, spec.clone()),
                },
                None => (self.default_provider, spec.clone()),
            },
            None => (self.default_provider, default_model.clone()),
        }
    }
}
