//! Per-conversation session state.
//!
//! The state is a plain value: the orchestrator takes it by value and hands
//! back the updated copy, and the host (CLI or UI) owns persistence between
//! turns. The JSON helpers below exist for the CLI host only.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::DEFAULT_LANGUAGE;
use super::message::ChatMessage;

/// Errors reading or writing a persisted session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to read session file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write session file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid session file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Mutable per-conversation aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    /// Random identifier used to correlate log lines of one conversation.
    pub id: Uuid,
    /// The user's last submitted source code.
    pub origin_code: String,
    /// Language tag of the code (`"text"` when unknown).
    pub language: String,
    /// Most recent LLM-produced fix. Empty until a fix succeeds.
    pub fixed_code: String,
    /// Most recent scoped review. Empty until a review succeeds.
    pub review_md: String,
    /// Full turn history, oldest first.
    pub chat_messages: Vec<ChatMessage>,
    /// Selected model; empty means the configured default.
    pub model: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            origin_code: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            fixed_code: String::new(),
            review_md: String::new(),
            chat_messages: Vec::new(),
            model: String::new(),
        }
    }
}

impl SessionState {
    /// Start a session bound to a model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Replace the submitted code.
    ///
    /// Fixes and reviews of the previous code no longer apply and are dropped.
    pub fn set_code(&mut self, code: impl Into<String>, language: impl Into<String>) {
        self.origin_code = code.into();
        let language = language.into();
        self.language = if language.trim().is_empty() {
            DEFAULT_LANGUAGE.to_string()
        } else {
            language.trim().to_string()
        };
        self.fixed_code.clear();
        self.review_md.clear();
    }

    /// Reset everything except the session id and model.
    pub fn clear(&mut self) {
        let id = self.id;
        let model = std::mem::take(&mut self.model);
        *self = Self {
            id,
            model,
            ..Self::default()
        };
    }

    /// The code the next fix or review applies to: the latest fix if any,
    /// otherwise the original submission.
    pub fn current_code(&self) -> &str {
        if self.fixed_code.trim().is_empty() {
            &self.origin_code
        } else {
            &self.fixed_code
        }
    }

    pub fn has_fix(&self) -> bool {
        !self.fixed_code.trim().is_empty()
    }

    pub fn has_review(&self) -> bool {
        !self.review_md.trim().is_empty()
    }

    /// Append one user/assistant exchange to the history.
    pub fn record_exchange(&mut self, question: impl Into<String>, reply: impl Into<String>) {
        self.chat_messages.push(ChatMessage::user(question));
        self.chat_messages.push(ChatMessage::assistant(reply));
    }

    /// Model to use for this session, falling back to `default_model`.
    pub fn model_or<'a>(&'a self, default_model: &'a str) -> &'a str {
        if self.model.trim().is_empty() {
            default_model
        } else {
            &self.model
        }
    }

    /// Load a session persisted by [`SessionState::save`].
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let content = std::fs::read_to_string(path).map_err(|e| SessionError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| SessionError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Persist the session as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let write_err = |e| SessionError::Write {
            path: path.to_path_buf(),
            source: e,
        };
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| write_err(std::io::Error::other(e)))?;
        std::fs::write(path, json).map_err(write_err)
    }
}
