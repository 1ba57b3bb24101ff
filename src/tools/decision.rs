//! Parse a model response into the action to take this turn.

use serde_json::{Map, Value};

use crate::providers::RawResponse;

use super::ToolName;

/// What the model decided on a conversational turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Reply directly with this text.
    Answer(String),
    /// The model produced neither text nor a tool call.
    Clarify,
    /// The model called a tool we do not offer.
    UnknownTool {
        name: String,
        content: Option<String>,
    },
    /// Run one of our tools.
    Invoke(ToolInvocation),
}

/// A parsed call to one of the offered tools.
///
/// `None` means the argument was missing or malformed and dispatch falls
/// back to the user's raw question. `search_rule` fields keep an explicitly
/// blank value as `Some("")` so an empty keyword is never replaced.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    RunFix { instructions: Option<String> },
    SearchRule {
        query: Option<String>,
        language: Option<String>,
    },
    RunReview { focus: Option<String> },
}

impl ToolInvocation {
    pub fn name(&self) -> ToolName {
        match self {
            ToolInvocation::RunFix { .. } => ToolName::RunFix,
            ToolInvocation::SearchRule { .. } => ToolName::SearchRule,
            ToolInvocation::RunReview { .. } => ToolName::RunReview,
        }
    }
}

impl Decision {
    /// Decide from the first choice of `response`. Only the first tool call
    /// is honored; any further calls are ignored.
    pub fn from_response(response: &RawResponse) -> Self {
        let Some(message) = response.first_message() else {
            return Decision::Clarify;
        };
        let content = message
            .content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from);

        let first_call = message.tool_calls.as_ref().and_then(|calls| {
            if calls.len() > 1 {
                tracing::debug!(calls = calls.len(), "ignoring all but the first tool call");
            }
            calls.first()
        });

        let Some(call) = first_call else {
            return match content {
                Some(text) => Decision::Answer(text),
                None => Decision::Clarify,
            };
        };

        let args = parse_arguments(&call.function.arguments);
        match call.function.name.parse::<ToolName>() {
            Ok(ToolName::RunFix) => Decision::Invoke(ToolInvocation::RunFix {
                instructions: args.get("fix_instructions").and_then(coerce_instructions),
            }),
            Ok(ToolName::SearchRule) => Decision::Invoke(ToolInvocation::SearchRule {
                query: present_string_arg(&args, "query"),
                language: present_string_arg(&args, "language"),
            }),
            Ok(ToolName::RunReview) => Decision::Invoke(ToolInvocation::RunReview {
                focus: string_arg(&args, "review_focus"),
            }),
            Err(_) => Decision::UnknownTool {
                name: call.function.name.clone(),
                content,
            },
        }
    }
}

/// Parse tool arguments; anything but a JSON object counts as no arguments.
fn parse_arguments(raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(e) => {
            tracing::warn!(error = %e, "malformed tool arguments");
            Map::new()
        }
    }
}

fn string_arg(args: &Map<String, Value>, key: &str) -> Option<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Like [`string_arg`] but keeps a present, blank value as `Some("")`.
fn present_string_arg(args: &Map<String, Value>, key: &str) -> Option<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
}

/// Instructions may be one string or a list; lists are joined by newlines
/// and other JSON values are rendered as text.
fn coerce_instructions(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
