//! LlmGateway trait and LLM integration.
//!
//! Provides an abstraction layer over rig-core to decouple the
//! conversation logic from the specific LLM library. Responses are
//! normalized into the OpenAI-style `choices[].message` shape so the
//! orchestrator can branch on tool calls without knowing the backend.

pub mod rig;

use async_trait::async_trait;
use ::rig::completion::ToolDefinition;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ChatMessage, Role};

/// Errors reaching the chat-completion backend.
#[derive(Error, Debug)]
pub enum ConnectivityError {
    #[error("LLM API error: {0}")]
    Api(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("malformed LLM response: {0}")]
    MalformedResponse(String),
}

/// How the backend may use the offered tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// The model decides whether to call a tool.
    #[default]
    Auto,
    None,
    Required,
}

/// A single chat-completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: Option<ToolChoice>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 0.0,
            tools: Vec::new(),
            tool_choice: None,
        }
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Offer tools to the model. An empty list means a plain completion.
    pub fn tools(mut self, tools: Vec<ToolDefinition>, choice: ToolChoice) -> Self {
        self.tool_choice = (!tools.is_empty()).then_some(choice);
        self.tools = tools;
        self
    }

    /// Text of the last user message, if any.
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// Normalized completion response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub role: Role,
    pub content: Option<String>,
    pub tool_calls: Option<Vec<RawToolCall>>,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, exactly as the model produced them.
    pub arguments: String,
}

impl RawResponse {
    /// A single-choice response with optional text and tool calls.
    pub fn assistant(content: Option<String>, tool_calls: Vec<RawToolCall>) -> Self {
        Self {
            choices: vec![Choice {
                message: ResponseMessage {
                    role: Role::Assistant,
                    content,
                    tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                },
            }],
        }
    }

    /// A plain text response.
    pub fn text(content: impl Into<String>) -> Self {
        Self::assistant(Some(content.into()), Vec::new())
    }

    /// A response calling one tool with JSON `arguments`.
    pub fn tool_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self::assistant(None, vec![RawToolCall::function("call_0", name, arguments)])
    }

    pub fn first_message(&self) -> Option<&ResponseMessage> {
        self.choices.first().map(|c| &c.message)
    }

    /// Text content of the first choice, or `""`.
    pub fn first_content(&self) -> &str {
        self.first_message()
            .and_then(|m| m.content.as_deref())
            .unwrap_or("")
    }
}

impl RawToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: "function".to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Uniform interface to a chat-completion backend.
///
/// Implementations own retries; callers see one result per request.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Run a completion and return the full normalized response,
    /// including any tool calls.
    async fn chat_completion_raw(
        &self,
        request: &CompletionRequest,
    ) -> Result<RawResponse, ConnectivityError>;

    /// Run a completion and return only the first choice's text.
    async fn chat_completion(&self, request: &CompletionRequest) -> Result<String, ConnectivityError> {
        let response = self.chat_completion_raw(request).await?;
        Ok(response.first_content().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_response_matches_openai_shape() {
        let json = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "run_fix", "arguments": "{\"fix_instructions\":\"x\"}"}
                    }]
                }
            }]
        }"#;
        let response: RawResponse = serde_json::from_str(json).unwrap();
        let message = response.first_message().unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert!(message.content.is_none());
        let call = &message.tool_calls.as_ref().unwrap()[0];
        assert_eq!(call.kind, "function");
        assert_eq!(call.function.name, "run_fix");
    }

    #[test]
    fn first_content_defaults_to_empty() {
        assert_eq!(RawResponse::default().first_content(), "");
        assert_eq!(RawResponse::tool_call("run_fix", "{}").first_content(), "");
        assert_eq!(RawResponse::text("hi").first_content(), "hi");
    }

    #[test]
    fn tools_builder_sets_choice_only_when_offered() {
        let req = CompletionRequest::new("m", vec![ChatMessage::user("q")]);
        assert!(req.clone().tools(Vec::new(), ToolChoice::Auto).tool_choice.is_none());
        let with_tools = req.tools(crate::tools::definitions(false), ToolChoice::Auto);
        assert_eq!(with_tools.tool_choice, Some(ToolChoice::Auto));
        assert_eq!(with_tools.tools.len(), 2);
    }

    #[test]
    fn last_user_text_skips_other_roles() {
        let req = CompletionRequest::new(
            "m",
            vec![
                ChatMessage::system("s"),
                ChatMessage::user("first"),
                ChatMessage::assistant("a"),
                ChatMessage::user("second"),
            ],
        );
        assert_eq!(req.last_user_text(), Some("second"));
    }
}
