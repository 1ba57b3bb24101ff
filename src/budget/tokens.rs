//! Model-aware token counting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tiktoken_rs::CoreBPE;

use crate::models::ChatMessage;

/// Fixed overhead per message (role framing and separators).
const TOKENS_PER_MESSAGE: usize = 4;
/// Tokens priming the assistant reply.
const REPLY_PRIMER_TOKENS: usize = 3;
/// Characters per token when no tokenizer is available.
const CHARS_PER_TOKEN: usize = 4;

/// Counts the tokens a message sequence costs for a model.
pub trait TokenCounter: Send + Sync {
    fn count_messages(&self, messages: &[ChatMessage], model: &str) -> usize;
}

/// BPE token counter using the tokenizer tables from `tiktoken-rs`.
///
/// Unknown models use `cl100k_base`. Resolved encodings are cached per
/// model name; a `None` entry means no encoding could be loaded and the
/// character heuristic applies.
#[derive(Default)]
pub struct TiktokenCounter {
    cache: Mutex<HashMap<String, Option<Arc<CoreBPE>>>>,
}

impl TiktokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn encoding(&self, model: &str) -> Option<Arc<CoreBPE>> {
        if let Some(entry) = self
            .cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(model).cloned())
        {
            return entry;
        }

        let resolved = tiktoken_rs::get_bpe_from_model(model)
            .or_else(|_| {
                tracing::debug!(model, "no tokenizer for model, using cl100k_base");
                tiktoken_rs::cl100k_base()
            })
            .map(Arc::new)
            .map_err(|e| tracing::warn!(model, error = %e, "failed to load tokenizer"))
            .ok();

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(model.to_string(), resolved.clone());
        }
        resolved
    }
}

impl TokenCounter for TiktokenCounter {
    fn count_messages(&self, messages: &[ChatMessage], model: &str) -> usize {
        let encoding = self.encoding(model);
        let count = |text: &str| match &encoding {
            Some(bpe) => bpe.encode_ordinary(text).len(),
            None => heuristic_tokens(text),
        };

        messages
            .iter()
            .map(|m| TOKENS_PER_MESSAGE + count(&m.role.to_string()) + count(&m.content))
            .sum::<usize>()
            + REPLY_PRIMER_TOKENS
    }
}

fn heuristic_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sequence_costs_only_primer() {
        let counter = TiktokenCounter::new();
        assert_eq!(counter.count_messages(&[], "gpt-4o-mini"), REPLY_PRIMER_TOKENS);
    }

    #[test]
    fn longer_content_costs_more() {
        let counter = TiktokenCounter::new();
        let short = [ChatMessage::user("hi")];
        let long = [ChatMessage::user("hi ".repeat(200))];
        assert!(counter.count_messages(&long, "gpt-4o") > counter.count_messages(&short, "gpt-4o"));
    }

    #[test]
    fn per_message_overhead_applies() {
        let counter = TiktokenCounter::new();
        let one = counter.count_messages(&[ChatMessage::user("x")], "gpt-4");
        assert!(one >= TOKENS_PER_MESSAGE + REPLY_PRIMER_TOKENS + 2);
    }

    #[test]
    fn unknown_model_falls_back_and_is_cached() {
        let counter = TiktokenCounter::new();
        let msgs = [ChatMessage::assistant("fn main() {}")];
        let first = counter.count_messages(&msgs, "definitely-not-a-model");
        let second = counter.count_messages(&msgs, "definitely-not-a-model");
        assert_eq!(first, second);
        assert!(counter.cache.lock().unwrap().contains_key("definitely-not-a-model"));
    }

    #[test]
    fn heuristic_rounds_up() {
        assert_eq!(heuristic_tokens(""), 0);
        assert_eq!(heuristic_tokens("abc"), 1);
        assert_eq!(heuristic_tokens("abcde"), 2);
    }
}
