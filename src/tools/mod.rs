//! Tools the conversation model may call.
//!
//! The model is offered a small, closed set of functions. Definitions are
//! sent with every conversational request; the model's choice comes back
//! as a raw tool call and is parsed once into a [`Decision`].

pub mod decision;

use rig::completion::ToolDefinition;
use serde_json::json;
use strum::{AsRefStr, Display, EnumString};

pub use decision::{Decision, ToolInvocation};

/// Names of the tools offered to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ToolName {
    RunFix,
    SearchRule,
    RunReview,
}

/// `run_fix(fix_instructions)`: rewrite the current code.
pub fn run_fix_definition() -> ToolDefinition {
    ToolDefinition {
        name: ToolName::RunFix.to_string(),
        description: "Apply changes to the user's current code. Call this when the user asks \
            to fix, refactor, optimize, rename, add or remove something in the code. \
            Do not call it for questions that only need an explanation."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "fix_instructions": {
                    "description": "What to change, as one instruction or a list of short instructions.",
                    "anyOf": [
                        { "type": "string" },
                        { "type": "array", "items": { "type": "string" } }
                    ]
                }
            },
            "required": ["fix_instructions"]
        }),
    }
}

/// `search_rule(query, language)`: look up coding rules and conventions.
pub fn search_rule_definition() -> ToolDefinition {
    ToolDefinition {
        name: ToolName::SearchRule.to_string(),
        description: "Search the coding rules knowledge base. Call this when the user asks \
            about a convention, guideline or best practice for a programming language."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Keywords describing the rule to look up (e.g., 'naming convention')."
                },
                "language": {
                    "type": "string",
                    "description": "Programming language the rule applies to (e.g., 'python')."
                }
            },
            "required": ["query", "language"]
        }),
    }
}

/// `run_review(review_focus)`: review one aspect of the current code.
pub fn run_review_definition() -> ToolDefinition {
    ToolDefinition {
        name: ToolName::RunReview.to_string(),
        description: "Review the user's current code for one specific aspect (for example \
            error handling, naming or security) without changing it."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "review_focus": {
                    "type": "string",
                    "description": "The aspect of the code to review."
                }
            },
            "required": ["review_focus"]
        }),
    }
}

/// Tool definitions offered on a conversational turn.
pub fn definitions(enable_review: bool) -> Vec<ToolDefinition> {
    let mut tools = vec![run_fix_definition(), search_rule_definition()];
    if enable_review {
        tools.push(run_review_definition());
    }
    tools
}
