//! rig-core integration for chat completions with tool calling.
//!
//! Uses rig-core's provider clients and the low-level completion request
//! builder so the model's tool calls come back to us instead of being
//! executed by a rig agent. Currently supports: Anthropic, OpenAI, Cohere,
//! Gemini, Perplexity, DeepSeek, xAI, Groq, and any OpenAI-compatible API.

use std::time::Duration;

use async_trait::async_trait;
use rig::OneOrMany;
use rig::client::CompletionClient;
use rig::completion::{AssistantContent, CompletionModel, Message};
use rig::providers;

use crate::config::ProviderConfig;
use crate::models::{ChatMessage, ProviderName, Role};

use super::{
    CompletionRequest, ConnectivityError, LlmGateway, RawResponse, RawToolCall, ToolChoice,
};

/// Initial backoff delay between retries.
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(2);

/// Maximum backoff delay between retries.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Build a completion request on a rig-core client and send it.
macro_rules! complete_raw {
    ($client:expr, $request:expr, $label:expr) => {{
        let model = $client.completion_model($request.model.as_str());
        let parts = split_messages(&$request.messages);
        let mut builder = model
            .completion_request(parts.prompt)
            .messages(parts.history)
            .temperature($request.temperature);
        if let Some(preamble) = parts.preamble {
            builder = builder.preamble(preamble);
        }
        if !$request.tools.is_empty() {
            builder = builder.tools($request.tools.clone());
            if let Some(choice) = $request.tool_choice {
                builder = builder.tool_choice(rig_tool_choice(choice));
            }
        }
        builder
            .send()
            .await
            .map(|response| to_raw_response(&response.choice))
            .map_err(|e| ConnectivityError::Api(format!("{} API error: {e}", $label)))
    }};
}

/// Create a rig-core client using the `Client::new(api_key)` convention.
macro_rules! new_client {
    ($provider_mod:path, $api_key:expr, $label:expr) => {{
        <$provider_mod>::new($api_key).map_err(|e| {
            ConnectivityError::Api(format!("failed to create {} client: {e}", $label))
        })
    }};
}

/// rig-core based gateway.
///
/// The provider name in config selects which rig-core provider to use.
pub struct RigGateway {
    config: ProviderConfig,
}

impl RigGateway {
    /// Create a gateway, failing early when the provider cannot work.
    pub fn new(config: ProviderConfig) -> Result<Self, ConnectivityError> {
        if config.api_key.is_none() {
            return Err(ConnectivityError::NotConfigured(format!(
                "no API key found for provider '{}'. Set {} or {}.",
                config.name,
                crate::constants::ENV_API_KEY,
                config.name.api_key_env_var()
            )));
        }
        if config.name.requires_base_url() && config.base_url.is_none() {
            return Err(ConnectivityError::NotConfigured(format!(
                "{} provider requires base_url to be set",
                config.name
            )));
        }
        Ok(Self { config })
    }

    /// Build an OpenAI-style client, optionally with a custom base URL.
    fn build_openai_client(
        &self,
        api_key: &str,
        label: &str,
    ) -> Result<providers::openai::CompletionsClient, ConnectivityError> {
        let mut builder = providers::openai::CompletionsClient::builder().api_key(api_key);
        if let Some(ref base_url) = self.config.base_url {
            builder = builder.base_url(base_url);
        }
        let client: providers::openai::CompletionsClient = builder
            .build()
            .map_err(|e| ConnectivityError::Api(format!("failed to create {label} client: {e}")))?;
        Ok(client)
    }

    fn api_key(&self) -> Result<&str, ConnectivityError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| ConnectivityError::NotConfigured("missing API key".to_string()))
    }

    /// One completion attempt through rig-core.
    async fn call_rig(&self, request: &CompletionRequest) -> Result<RawResponse, ConnectivityError> {
        let api_key = self.api_key()?;

        match self.config.name {
            ProviderName::Anthropic => {
                let client: providers::anthropic::Client = providers::anthropic::Client::builder()
                    .api_key(api_key)
                    .build()
                    .map_err(|e| {
                        ConnectivityError::Api(format!("failed to create Anthropic client: {e}"))
                    })?;
                complete_raw!(client, request, "Anthropic")
            }
            ProviderName::OpenAI => {
                let client = self.build_openai_client(api_key, "OpenAI")?;
                complete_raw!(client, request, "OpenAI")
            }
            ProviderName::OpenAICompatible => {
                let client = self.build_openai_client(api_key, "OpenAI-compatible")?;
                complete_raw!(client, request, "OpenAI-compatible")
            }
            ProviderName::Cohere => {
                let client = new_client!(providers::cohere::Client, api_key, "Cohere")?;
                complete_raw!(client, request, "Cohere")
            }
            ProviderName::Gemini => {
                let client = new_client!(providers::gemini::Client, api_key, "Gemini")?;
                complete_raw!(client, request, "Gemini")
            }
            ProviderName::Perplexity => {
                let client = new_client!(providers::perplexity::Client, api_key, "Perplexity")?;
                complete_raw!(client, request, "Perplexity")
            }
            ProviderName::DeepSeek => {
                let client = new_client!(providers::deepseek::Client, api_key, "DeepSeek")?;
                complete_raw!(client, request, "DeepSeek")
            }
            ProviderName::XAI => {
                let client = new_client!(providers::xai::Client, api_key, "xAI")?;
                complete_raw!(client, request, "xAI")
            }
            ProviderName::Groq => {
                let client = new_client!(providers::groq::Client, api_key, "Groq")?;
                complete_raw!(client, request, "Groq")
            }
        }
    }
}

#[async_trait]
impl LlmGateway for RigGateway {
    async fn chat_completion_raw(
        &self,
        request: &CompletionRequest,
    ) -> Result<RawResponse, ConnectivityError> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;
        loop {
            tracing::debug!(
                provider = %self.config.name,
                model = %request.model,
                messages = request.messages.len(),
                tools = request.tools.len(),
                attempt,
                "sending completion request"
            );
            match self.call_rig(request).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < max_retries && is_retryable(&e) => {
                    let delay = retry_backoff(attempt);
                    tracing::warn!(
                        reason = classify_error(&e).unwrap_or("transient error"),
                        retry_in_secs = delay.as_secs(),
                        attempt = attempt + 1,
                        max_retries,
                        "retrying completion request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// A chat sequence split into rig-core's request parts.
struct RequestParts {
    preamble: Option<String>,
    history: Vec<Message>,
    prompt: Message,
}

/// Fold system messages into the preamble, keep the rest as history, and
/// use the trailing user message as the prompt.
fn split_messages(messages: &[ChatMessage]) -> RequestParts {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    let preamble = (!system.is_empty()).then(|| system.join("\n\n"));

    let mut conversation: Vec<&ChatMessage> =
        messages.iter().filter(|m| m.role != Role::System).collect();
    let prompt = match conversation.last() {
        Some(last) if last.role == Role::User => {
            let text = last.content.clone();
            conversation.pop();
            Message::user(text)
        }
        _ => Message::user(""),
    };

    let history = conversation.into_iter().map(to_rig_message).collect();
    RequestParts {
        preamble,
        history,
        prompt,
    }
}

fn to_rig_message(message: &ChatMessage) -> Message {
    match message.role {
        Role::Assistant => Message::assistant(message.content.clone()),
        Role::Tool => Message::user(format!("Tool result:\n{}", message.content)),
        Role::User | Role::System => Message::user(message.content.clone()),
    }
}

fn rig_tool_choice(choice: ToolChoice) -> rig::message::ToolChoice {
    match choice {
        ToolChoice::Auto => rig::message::ToolChoice::Auto,
        ToolChoice::None => rig::message::ToolChoice::None,
        ToolChoice::Required => rig::message::ToolChoice::Required,
    }
}

/// Normalize rig-core's assistant content into the OpenAI-style shape.
fn to_raw_response(choice: &OneOrMany<AssistantContent>) -> RawResponse {
    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for content in choice.iter() {
        match content {
            AssistantContent::Text(t) => text.push_str(&t.text),
            AssistantContent::ToolCall(call) => tool_calls.push(RawToolCall::function(
                call.id.clone(),
                call.function.name.clone(),
                call.function.arguments.to_string(),
            )),
            _ => {}
        }
    }
    let content = (!text.is_empty()).then_some(text);
    RawResponse::assistant(content, tool_calls)
}

/// Check whether a gateway error is transient and worth retrying.
///
/// Matches HTTP status codes commonly used for rate limiting and
/// temporary unavailability plus connection and timeout errors.
pub fn is_retryable(err: &ConnectivityError) -> bool {
    classify_error(err).is_some()
}

/// Classifies a gateway error into a short, user-friendly message.
///
/// Returns `Some(message)` for transient errors, `None` otherwise.
pub fn classify_error(err: &ConnectivityError) -> Option<&'static str> {
    let ConnectivityError::Api(msg) = err else {
        return None;
    };
    let msg_lower = msg.to_lowercase();
    if msg_lower.contains("429")
        || msg_lower.contains("rate limit")
        || msg_lower.contains("too many requests")
    {
        Some("Rate limited by API")
    } else if msg_lower.contains("503")
        || msg_lower.contains("service unavailable")
        || msg_lower.contains("high demand")
    {
        Some("High model load")
    } else if msg_lower.contains("529") || msg_lower.contains("overloaded") {
        Some("API overloaded")
    } else if msg_lower.contains("500") || msg_lower.contains("502") {
        Some("API server error")
    } else if msg_lower.contains("timeout") || msg_lower.contains("timed out") {
        Some("Request timed out")
    } else if msg_lower.contains("connection") {
        Some("Connection error")
    } else if msg_lower.contains("temporarily") || msg_lower.contains("try again") {
        Some("Temporary API error")
    } else {
        None
    }
}

/// Compute the backoff duration for a retry attempt using exponential backoff.
pub fn retry_backoff(attempt: u32) -> Duration {
    let backoff = INITIAL_BACKOFF.saturating_mul(2u32.saturating_pow(attempt));
    backoff.min(MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: ProviderName, api_key: Option<&str>, base_url: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            name,
            model: "test-model".to_string(),
            base_url: base_url.map(String::from),
            api_key: api_key.map(String::from),
            max_retries: 0,
        }
    }

    #[test]
    fn new_gateway_missing_api_key() {
        match RigGateway::new(config(ProviderName::Anthropic, None, None)) {
            Err(e) => {
                let msg = e.to_string();
                assert!(msg.contains("API key"), "got: {msg}");
                assert!(msg.contains("ANTHROPIC_API_KEY"), "got: {msg}");
            }
            Ok(_) => panic!("expected error for missing API key"),
        }
    }

    #[test]
    fn new_gateway_with_api_key() {
        assert!(RigGateway::new(config(ProviderName::OpenAI, Some("sk-test"), None)).is_ok());
    }

    #[test]
    fn compatible_provider_requires_base_url() {
        let result = RigGateway::new(config(ProviderName::OpenAICompatible, Some("k"), None));
        assert!(matches!(result, Err(ConnectivityError::NotConfigured(_))));
        let result = RigGateway::new(config(
            ProviderName::OpenAICompatible,
            Some("k"),
            Some("http://localhost:11434/v1"),
        ));
        assert!(result.is_ok());
    }

    #[test]
    fn split_folds_system_messages_into_preamble() {
        let messages = vec![
            ChatMessage::system("policy"),
            ChatMessage::system("context"),
            ChatMessage::user("earlier question"),
            ChatMessage::assistant("earlier answer"),
            ChatMessage::user("new question"),
        ];
        let parts = split_messages(&messages);
        assert_eq!(parts.preamble.as_deref(), Some("policy\n\ncontext"));
        assert_eq!(parts.history.len(), 2);
        assert_eq!(parts.prompt, Message::user("new question"));
    }

    #[test]
    fn split_without_trailing_user_uses_empty_prompt() {
        let messages = vec![ChatMessage::assistant("only assistant")];
        let parts = split_messages(&messages);
        assert!(parts.preamble.is_none());
        assert_eq!(parts.history.len(), 1);
        assert_eq!(parts.prompt, Message::user(""));
    }

    #[test]
    fn text_content_becomes_message_content() {
        let choice = OneOrMany::one(AssistantContent::text("hello"));
        let raw = to_raw_response(&choice);
        assert_eq!(raw.first_content(), "hello");
        assert!(raw.first_message().unwrap().tool_calls.is_none());
    }

    #[test]
    fn retryable_429_rate_limit() {
        let err = ConnectivityError::Api(
            "Gemini API error: HttpError: Invalid status code 429 Too Many Requests".into(),
        );
        assert!(is_retryable(&err));
        assert_eq!(classify_error(&err), Some("Rate limited by API"));
    }

    #[test]
    fn retryable_503_unavailable() {
        let err = ConnectivityError::Api("OpenAI API error: 503 Service Unavailable".into());
        assert!(is_retryable(&err));
    }

    #[test]
    fn retryable_connection_error() {
        let err = ConnectivityError::Api("OpenAI API error: connection refused".into());
        assert_eq!(classify_error(&err), Some("Connection error"));
    }

    #[test]
    fn not_retryable_auth_error() {
        let err = ConnectivityError::Api("Invalid API key: 401 Unauthorized".into());
        assert!(!is_retryable(&err));
    }

    #[test]
    fn not_retryable_configuration_error() {
        let err = ConnectivityError::NotConfigured("timeout".into());
        assert!(!is_retryable(&err));
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(retry_backoff(0), Duration::from_secs(2));
        assert_eq!(retry_backoff(1), Duration::from_secs(4));
        assert_eq!(retry_backoff(2), Duration::from_secs(8));
        assert_eq!(retry_backoff(10), MAX_BACKOFF);
    }
}
