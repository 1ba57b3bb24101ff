//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables
//! 3. `.codehero.toml` in the working directory
//! 4. `~/.config/codehero/config.toml` (global defaults)
//! 5. Built-in defaults
//!
//! Layers merge field by field: a value from a higher layer wins only when
//! it differs from the built-in default, so a higher layer cannot reset a
//! field (e.g. `rules.k`) back to its default once a lower layer changed it.
//! `chat.enable_review` is the exception: it is tri-state and any layer that
//! sets it, to either value, overrides the layers below.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::budget::{DEFAULT_MAX_TOKENS, DEFAULT_MAX_TURNS};
use crate::constants;
use crate::env::Env;
use crate::models::ProviderName;

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub chat: ChatConfig,
    pub rules: RulesConfig,
}

/// LLM provider configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: ProviderName,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Extra attempts for transient failures. `0` means a single attempt.
    pub max_retries: u32,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: ProviderName::OpenAI,
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            api_key: None,
            max_retries: 0,
        }
    }
}

/// Conversation behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// History messages considered when building the context.
    pub max_turns: usize,
    /// Token ceiling for the conversational request.
    pub max_tokens: usize,
    pub temperature: f64,
    pub fix_temperature: f64,
    pub summary_temperature: f64,
    pub review_temperature: f64,
    /// Natural language for summaries and reviews.
    pub reply_language: String,
    /// Offer the `run_review` tool. Unset means enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_review: Option<bool>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.3,
            fix_temperature: 0.2,
            summary_temperature: 0.2,
            review_temperature: 0.2,
            reply_language: "English".to_string(),
            enable_review: None,
        }
    }
}

impl ChatConfig {
    pub fn review_enabled(&self) -> bool {
        self.enable_review.unwrap_or(true)
    }
}

/// Rule corpus and retrieval settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Local rule corpus, relative to the working directory.
    pub dir: PathBuf,
    /// Snippets requested per search.
    pub k: usize,
    /// Snippets scoring below this are dropped.
    pub score_threshold: f32,
    /// Snippets placed into a grounded-answer prompt.
    pub max_snippets: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(constants::DEFAULT_RULES_DIR),
            k: 6,
            score_threshold: 0.25,
            max_snippets: 4,
        }
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads from global config, working-directory config, then applies
    /// environment variable overrides.
    pub fn load(work_dir: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // Layer 4: global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        // Layer 3: working-directory config
        if let Some(dir) = work_dir {
            let local_path = dir.join(constants::CONFIG_FILENAME);
            if local_path.exists() {
                let local = Self::load_file(&local_path)?;
                config.merge(local);
            }
        }

        // Layer 2: environment variables
        config.apply_env_vars(env);

        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Load a config from a specific file.
    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the global config file path.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(constants::CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other takes precedence for non-default values).
    fn merge(&mut self, other: Config) {
        // Provider settings
        let default_provider = ProviderConfig::default();
        if other.provider.name != default_provider.name {
            self.provider.name = other.provider.name;
        }
        if other.provider.model != default_provider.model {
            self.provider.model = other.provider.model;
        }
        if other.provider.base_url.is_some() {
            self.provider.base_url = other.provider.base_url;
        }
        if other.provider.api_key.is_some() {
            self.provider.api_key = other.provider.api_key;
        }
        if other.provider.max_retries != default_provider.max_retries {
            self.provider.max_retries = other.provider.max_retries;
        }

        // Chat settings
        let default_chat = ChatConfig::default();
        if other.chat.max_turns != default_chat.max_turns {
            self.chat.max_turns = other.chat.max_turns;
        }
        if other.chat.max_tokens != default_chat.max_tokens {
            self.chat.max_tokens = other.chat.max_tokens;
        }
        if other.chat.temperature != default_chat.temperature {
            self.chat.temperature = other.chat.temperature;
        }
        if other.chat.fix_temperature != default_chat.fix_temperature {
            self.chat.fix_temperature = other.chat.fix_temperature;
        }
        if other.chat.summary_temperature != default_chat.summary_temperature {
            self.chat.summary_temperature = other.chat.summary_temperature;
        }
        if other.chat.review_temperature != default_chat.review_temperature {
            self.chat.review_temperature = other.chat.review_temperature;
        }
        if other.chat.reply_language != default_chat.reply_language {
            self.chat.reply_language = other.chat.reply_language;
        }
        if other.chat.enable_review.is_some() {
            self.chat.enable_review = other.chat.enable_review;
        }

        // Rules settings
        let default_rules = RulesConfig::default();
        if other.rules.dir != default_rules.dir {
            self.rules.dir = other.rules.dir;
        }
        if other.rules.k != default_rules.k {
            self.rules.k = other.rules.k;
        }
        if other.rules.score_threshold != default_rules.score_threshold {
            self.rules.score_threshold = other.rules.score_threshold;
        }
        if other.rules.max_snippets != default_rules.max_snippets {
            self.rules.max_snippets = other.rules.max_snippets;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Some(val) = env.get(constants::ENV_PROVIDER) {
            match val.parse::<ProviderName>() {
                Ok(name) => self.provider.name = name,
                Err(_) => eprintln!(
                    "Warning: ignoring invalid {} value: {val}",
                    constants::ENV_PROVIDER
                ),
            }
        }
        if let Some(val) = env.get(constants::ENV_MODEL) {
            self.provider.model = val;
        }
        if let Some(val) = env.get(constants::ENV_BASE_URL) {
            self.provider.base_url = Some(val);
        }

        // Provider-specific API key resolution
        let api_key = env.first_of(&[
            constants::ENV_API_KEY,
            self.provider.name.api_key_env_var(),
        ]);
        if api_key.is_some() {
            self.provider.api_key = api_key;
        }

        if let Some(val) = env.get(constants::ENV_RULES_DIR) {
            self.rules.dir = PathBuf::from(val);
        }
    }
}
