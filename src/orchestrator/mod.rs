//! Conversation orchestrator: per-turn decision, dispatch and code state.
//!
//! A turn runs `build context → decide → {answer | fix | search rules |
//! review}`. No error escapes [`ConversationOrchestrator::reply`]: every
//! failure becomes a reply string and the session state is returned
//! unchanged.

mod handlers;
pub mod messages;

use std::sync::Arc;

use crate::budget::TokenBudgeter;
use crate::config::{ChatConfig, Config, RulesConfig};
use crate::models::{ChatMessage, SessionState};
use crate::prompts;
use crate::providers::{CompletionRequest, LlmGateway, ToolChoice};
use crate::retriever::RuleRetriever;
use crate::tools::{self, Decision, ToolInvocation};

/// Result of one conversational turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Text to show the user.
    pub reply: String,
    /// Session state after the turn.
    pub state: SessionState,
    /// `true` when the turn rewrote the code (`fixed_code` changed).
    pub used_tool: bool,
}

impl TurnOutcome {
    fn reply(state: SessionState, reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            state,
            used_tool: false,
        }
    }
}

/// Drives a conversation turn against an LLM gateway and a rule retriever.
///
/// Holds only immutable configuration and shared handles, so one
/// orchestrator can serve many sessions.
pub struct ConversationOrchestrator {
    gateway: Arc<dyn LlmGateway>,
    retriever: Arc<dyn RuleRetriever>,
    budgeter: TokenBudgeter,
    chat: ChatConfig,
    rules: RulesConfig,
    default_model: String,
}

impl ConversationOrchestrator {
    /// Create an orchestrator using BPE token counting for the context budget.
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        retriever: Arc<dyn RuleRetriever>,
        config: &Config,
    ) -> Self {
        Self {
            gateway,
            retriever,
            budgeter: TokenBudgeter::tiktoken(),
            chat: config.chat.clone(),
            rules: config.rules.clone(),
            default_model: config.provider.model.clone(),
        }
    }

    /// Replace the token budgeter.
    pub fn with_budgeter(mut self, budgeter: TokenBudgeter) -> Self {
        self.budgeter = budgeter;
        self
    }

    /// Handle one user turn.
    ///
    /// The caller is responsible for appending the exchange to the history
    /// (see [`SessionState::record_exchange`]).
    pub async fn reply(&self, state: SessionState, question: &str) -> TurnOutcome {
        let model = state.model_or(&self.default_model).to_string();

        let base = vec![
            ChatMessage::system(prompts::system_policy(
                &self.chat.reply_language,
                self.chat.review_enabled(),
            )),
            ChatMessage::system(prompts::system_context(
                &state.origin_code,
                &state.fixed_code,
                &state.language,
                &state.review_md,
            )),
        ];
        let messages = self.budgeter.build(
            &base,
            &state.chat_messages,
            question,
            &model,
            self.chat.max_turns,
            self.chat.max_tokens,
        );
        tracing::debug!(
            session = %state.id,
            model = %model,
            messages = messages.len(),
            "built conversation context"
        );

        let request = CompletionRequest::new(&model, messages)
            .temperature(self.chat.temperature)
            .tools(tools::definitions(self.chat.review_enabled()), ToolChoice::Auto);

        let response = match self.gateway.chat_completion_raw(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(session = %state.id, error = %e, "conversation request failed");
                return TurnOutcome::reply(state, messages::CONNECTIVITY);
            }
        };

        match Decision::from_response(&response) {
            Decision::Answer(text) => {
                tracing::debug!(session = %state.id, "answered directly");
                TurnOutcome::reply(state, text)
            }
            Decision::Clarify => TurnOutcome::reply(state, messages::CLARIFY),
            Decision::UnknownTool { name, content } => {
                tracing::warn!(session = %state.id, tool = %name, "model called an unknown tool");
                TurnOutcome::reply(
                    state,
                    content.unwrap_or_else(|| messages::UNKNOWN_TOOL.to_string()),
                )
            }
            Decision::Invoke(invocation) => {
                tracing::info!(session = %state.id, tool = %invocation.name(), "dispatching tool");
                self.dispatch(state, question, invocation, &model).await
            }
        }
    }

    /// Structured review of the current code, outside the conversation.
    ///
    /// Stores the review in `review_md` so later turns and fixes can use it.
    /// The caller records the exchange, as with [`reply`](Self::reply).
    pub async fn review(&self, mut state: SessionState, extra_note: &str) -> TurnOutcome {
        let code = state.current_code().to_string();
        if code.trim().is_empty() {
            return TurnOutcome::reply(state, messages::NOTHING_TO_REVIEW);
        }
        let model = state.model_or(&self.default_model).to_string();

        let prompt = prompts::full_review_prompt(
            &state.language,
            &code,
            extra_note,
            &self.chat.reply_language,
        );
        let request = CompletionRequest::new(&model, prompt.messages())
            .temperature(self.chat.review_temperature);
        let review = match self.gateway.chat_completion(&request).await {
            Ok(review) => review.trim().to_string(),
            Err(e) => {
                tracing::warn!(session = %state.id, error = %e, "full review request failed");
                return TurnOutcome::reply(state, messages::CONNECTIVITY);
            }
        };
        if review.is_empty() {
            return TurnOutcome::reply(state, messages::REVIEW_EMPTY);
        }

        tracing::info!(session = %state.id, model = %model, "full review completed");
        state.review_md = review.clone();
        TurnOutcome::reply(state, review)
    }

    async fn dispatch(
        &self,
        state: SessionState,
        question: &str,
        invocation: ToolInvocation,
        model: &str,
    ) -> TurnOutcome {
        match invocation {
            ToolInvocation::RunFix { instructions } => {
                self.run_fix(state, question, instructions, model).await
            }
            ToolInvocation::SearchRule { query, language } => {
                self.search_rule(state, question, query, language, model)
                    .await
            }
            ToolInvocation::RunReview { focus } => {
                self.run_review(state, question, focus, model).await
            }
        }
    }
}
