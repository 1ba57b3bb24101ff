//! Shared types used across all modules.
//!
//! Chat messages, session state, rule snippets and provider names live
//! here so other modules import from one place rather than reaching into
//! each other's internals.

pub mod message;
pub mod rule;
pub mod session;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use message::{ChatMessage, Role};
pub use rule::{RuleQuery, RuleSearchResult, RuleSnippet};
pub use session::SessionState;

/// Default language tag when none was detected or chosen.
pub const DEFAULT_LANGUAGE: &str = "text";

/// Supported LLM provider backends.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderName {
    Anthropic,
    #[default]
    #[serde(rename = "openai")]
    #[strum(serialize = "openai")]
    OpenAI,
    Cohere,
    Gemini,
    Perplexity,
    #[serde(rename = "deepseek")]
    #[strum(serialize = "deepseek")]
    DeepSeek,
    #[serde(rename = "xai")]
    #[strum(serialize = "xai")]
    XAI,
    Groq,
    /// Any OpenAI-compatible API (e.g. Ollama, Azure-style gateways, local servers).
    #[serde(rename = "openai-compatible")]
    #[strum(serialize = "openai-compatible")]
    OpenAICompatible,
}

impl ProviderName {
    /// Provider-specific environment variable holding the API key.
    ///
    /// These match the env var names used by rig-core's `from_env()` implementations.
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            ProviderName::Anthropic => "ANTHROPIC_API_KEY",
            ProviderName::OpenAI | ProviderName::OpenAICompatible => "OPENAI_API_KEY",
            ProviderName::Cohere => "COHERE_API_KEY",
            ProviderName::Gemini => "GEMINI_API_KEY",
            ProviderName::Perplexity => "PERPLEXITY_API_KEY",
            ProviderName::DeepSeek => "DEEPSEEK_API_KEY",
            ProviderName::XAI => "XAI_API_KEY",
            ProviderName::Groq => "GROQ_API_KEY",
        }
    }

    /// Whether the provider cannot work without an explicit `base_url`.
    pub fn requires_base_url(self) -> bool {
        matches!(self, ProviderName::OpenAICompatible)
    }
}
