//! Tool dispatch handlers.

use crate::markdown::extract_code_block;
use crate::models::{RuleQuery, SessionState};
use crate::prompts;
use crate::providers::CompletionRequest;

use super::{ConversationOrchestrator, TurnOutcome, messages};

/// `value` when present and non-blank, otherwise the trimmed `fallback`.
fn or_fallback(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| fallback.trim().to_string())
}

impl ConversationOrchestrator {
    /// Rewrite the current code and summarize the change.
    pub(super) async fn run_fix(
        &self,
        mut state: SessionState,
        question: &str,
        instructions: Option<String>,
        model: &str,
    ) -> TurnOutcome {
        let base_code = state.current_code().to_string();
        if base_code.trim().is_empty() {
            return TurnOutcome::reply(state, messages::NOTHING_TO_FIX);
        }
        let instructions = or_fallback(instructions, question);

        let prompt =
            prompts::fix_prompt(&state.language, &base_code, &instructions, &state.review_md);
        let request = CompletionRequest::new(model, prompt.messages())
            .temperature(self.chat.fix_temperature);
        let raw = match self.gateway.chat_completion(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(session = %state.id, error = %e, "fix request failed");
                return TurnOutcome::reply(state, messages::CONNECTIVITY);
            }
        };

        let fixed = extract_code_block(&raw);
        if fixed.trim().is_empty() {
            tracing::warn!(session = %state.id, "fix response contained no code");
            return TurnOutcome::reply(state, messages::FIX_FAILED);
        }

        let prompt = prompts::summary_prompt(
            &state.language,
            &base_code,
            &fixed,
            &self.chat.reply_language,
        );
        let request = CompletionRequest::new(model, prompt.messages())
            .temperature(self.chat.summary_temperature);
        let reply = match self.gateway.chat_completion(&request).await {
            Ok(summary) if !summary.trim().is_empty() => {
                format!("{}\n{}", messages::FIX_APPLIED_WITH_SUMMARY, summary.trim())
            }
            Ok(_) => messages::FIX_APPLIED.to_string(),
            Err(e) => {
                tracing::warn!(session = %state.id, error = %e, "summary request failed");
                messages::FIX_APPLIED.to_string()
            }
        };

        tracing::info!(
            session = %state.id,
            lines = fixed.lines().count(),
            "applied fix"
        );
        state.fixed_code = fixed;
        TurnOutcome {
            reply,
            state,
            used_tool: true,
        }
    }

    /// Answer a rules question from the rule corpus.
    pub(super) async fn search_rule(
        &self,
        state: SessionState,
        question: &str,
        query: Option<String>,
        language: Option<String>,
        model: &str,
    ) -> TurnOutcome {
        let query = query.unwrap_or_else(|| question.trim().to_string());
        let language = language.unwrap_or_else(|| state.language.trim().to_string());
        if query.is_empty() || language.is_empty() {
            return TurnOutcome::reply(state, messages::SEARCH_NEEDS_FIELDS);
        }

        let rule_query = self.rule_query(query, language);
        let result = match self.retriever.search(&rule_query).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(session = %state.id, error = %e, "rule search failed");
                return TurnOutcome::reply(state, messages::RULES_UNAVAILABLE);
            }
        };
        if result.is_empty() {
            return TurnOutcome::reply(state, messages::NO_MATCHING_RULE);
        }
        tracing::debug!(session = %state.id, hits = result.hits, "rules found");

        let prompt = prompts::rule_answer_prompt(question, &result.snippets, self.rules.max_snippets);
        let request =
            CompletionRequest::new(model, prompt.messages()).temperature(self.chat.temperature);
        match self.gateway.chat_completion(&request).await {
            Ok(answer) if !answer.trim().is_empty() => TurnOutcome::reply(state, answer.trim()),
            Ok(_) => TurnOutcome::reply(state, messages::NO_MATCHING_RULE),
            Err(e) => {
                tracing::warn!(session = %state.id, error = %e, "rule answer request failed");
                TurnOutcome::reply(state, messages::CONNECTIVITY)
            }
        }
    }

    /// Review one aspect of the current code, grounded in rules when available.
    pub(super) async fn run_review(
        &self,
        mut state: SessionState,
        question: &str,
        focus: Option<String>,
        model: &str,
    ) -> TurnOutcome {
        let base_code = state.current_code().to_string();
        if base_code.trim().is_empty() {
            return TurnOutcome::reply(state, messages::NOTHING_TO_REVIEW);
        }
        let focus = or_fallback(focus, question);

        let rule_query = self.rule_query(focus.clone(), state.language.clone());
        let snippets = match self.retriever.search(&rule_query).await {
            Ok(result) => result.snippets,
            Err(e) => {
                tracing::warn!(session = %state.id, error = %e, "review rule lookup failed");
                Vec::new()
            }
        };

        let prompt = prompts::review_prompt(
            &state.language,
            &base_code,
            question.trim(),
            &focus,
            &snippets,
            &self.chat.reply_language,
        );
        let request = CompletionRequest::new(model, prompt.messages())
            .temperature(self.chat.review_temperature);
        let review = match self.gateway.chat_completion(&request).await {
            Ok(review) => review.trim().to_string(),
            Err(e) => {
                tracing::warn!(session = %state.id, error = %e, "review request failed");
                return TurnOutcome::reply(state, messages::CONNECTIVITY);
            }
        };
        if review.is_empty() {
            return TurnOutcome::reply(state, messages::CLARIFY);
        }

        tracing::info!(session = %state.id, rules = snippets.len(), "review completed");
        state.review_md = review.clone();
        TurnOutcome::reply(state, review)
    }

    fn rule_query(&self, query: String, language: String) -> RuleQuery {
        RuleQuery {
            query,
            language,
            k: self.rules.k,
            score_threshold: self.rules.score_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_used_for_missing_or_blank() {
        assert_eq!(or_fallback(None, " question "), "question");
        assert_eq!(or_fallback(Some("  ".into()), "question"), "question");
        assert_eq!(or_fallback(Some("given".into()), "question"), "given");
    }
}
