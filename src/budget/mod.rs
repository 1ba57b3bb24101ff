//! Context window budgeting.
//!
//! [`TokenBudgeter::build`] picks the largest suffix of the conversation
//! history that fits the token ceiling together with the fixed system
//! messages and the new user message.

pub mod tokens;

use std::sync::Arc;

use crate::models::ChatMessage;

pub use tokens::{TiktokenCounter, TokenCounter};

/// Default number of history messages considered.
pub const DEFAULT_MAX_TURNS: usize = 10;
/// Default token ceiling for a request.
pub const DEFAULT_MAX_TOKENS: usize = 8000;

/// Trims conversation history to a token budget.
#[derive(Clone)]
pub struct TokenBudgeter {
    counter: Arc<dyn TokenCounter>,
}

impl TokenBudgeter {
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        Self { counter }
    }

    /// Budgeter backed by the BPE tokenizer of each model.
    pub fn tiktoken() -> Self {
        Self::new(Arc::new(TiktokenCounter::new()))
    }

    pub fn count(&self, messages: &[ChatMessage], model: &str) -> usize {
        self.counter.count_messages(messages, model)
    }

    /// Assemble `base + history[-keep..] + [user(new_user_text)]` for the
    /// largest `keep <= max_turns` that fits in `max_tokens`.
    ///
    /// When even `keep = 0` does not fit, the base messages and the new user
    /// message are returned anyway; the new input is never dropped.
    pub fn build(
        &self,
        base: &[ChatMessage],
        history: &[ChatMessage],
        new_user_text: &str,
        model: &str,
        max_turns: usize,
        max_tokens: usize,
    ) -> Vec<ChatMessage> {
        let user = ChatMessage::user(new_user_text);
        let max_keep = max_turns.min(history.len());

        for keep in (0..=max_keep).rev() {
            let candidate = assemble(base, &history[history.len() - keep..], &user);
            let tokens = self.count(&candidate, model);
            if tokens <= max_tokens {
                tracing::debug!(keep, tokens, max_tokens, "context fits budget");
                return candidate;
            }
        }

        tracing::debug!(max_tokens, "context exceeds budget even without history");
        assemble(base, &[], &user)
    }
}

fn assemble(base: &[ChatMessage], tail: &[ChatMessage], user: &ChatMessage) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(base.len() + tail.len() + 1);
    messages.extend_from_slice(base);
    messages.extend_from_slice(tail);
    messages.push(user.clone());
    messages
}
