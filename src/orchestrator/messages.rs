//! Fixed replies for turns that end without a model-written answer.

pub const CONNECTIVITY: &str =
    "⚠️ Could not reach the model. Check your provider configuration and API key, then try again.";

pub const CLARIFY: &str =
    "Which part of the code would you like me to explain, review or change?";

pub const UNKNOWN_TOOL: &str =
    "I'm not sure what you'd like me to do. Do you want me to fix the code?";

pub const NOTHING_TO_FIX: &str =
    "⚠️ There is no code to fix yet. Please paste or load your code first.";

pub const FIX_FAILED: &str =
    "❌ Could not produce a fix. Please describe more specifically what you want changed.";

pub const FIX_APPLIED: &str = "✅ Applied the requested fix. The updated code is ready.";

pub const FIX_APPLIED_WITH_SUMMARY: &str = "✅ Applied the requested fix. Summary of changes:";

pub const SEARCH_NEEDS_FIELDS: &str =
    "🔎 I need both a keyword and a programming language to search the rules.";

pub const NO_MATCHING_RULE: &str = "🔎 No matching rule found.";

pub const RULES_UNAVAILABLE: &str =
    "⚠️ The rule knowledge base is unavailable right now. Please try again later.";

pub const NOTHING_TO_REVIEW: &str =
    "⚠️ There is no code to review yet. Please paste or load your code first.";

pub const REVIEW_EMPTY: &str = "❌ The review came back empty. Please try again.";
