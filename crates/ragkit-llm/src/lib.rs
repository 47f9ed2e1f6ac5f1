//! # ragkit-llm
//!
//! LLM provider gateway for ragkit.
//!
//! One capability surface over embedding and chat completion providers,
//! with provider selection, per-task `"provider/model"` overrides, and
//! deterministic fallbacks when a provider is unconfigured or failing.
//!
//! ## Providers
//!
//! | Provider | Embeddings | Chat | Notes |
//! |----------|-----------|------|-------|
//! | [`OpenAiCompatible`] | yes | yes | also serves Azure, OpenRouter, HuggingFace |
//! | [`AnthropicProvider`] | no | yes | embedding calls route to fallback |
//! | [`GoogleProvider`] | yes | yes | Generative Language API |
//! | [`OllamaProvider`] | yes | yes | local runtime, no credential |
//!
//! ## Degraded mode
//!
//! A missing credential or failed call never surfaces as an error from the
//! gateway's embed/summarize/keyword operations. Instead the deterministic
//! fallbacks in [`fallback`] take over and the degradation is logged at
//! `warn`.

pub mod anthropic;
pub mod config;
pub mod fallback;
pub mod gateway;
mod http;
pub mod google;
pub mod ollama;
pub mod openai;
pub mod response;

pub use anthropic::AnthropicProvider;
pub use config::{Credentials, LlmConfig, LlmTask, ProviderId};
pub use gateway::{clean_input, LlmGateway};
pub use google::GoogleProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiCompatible;
