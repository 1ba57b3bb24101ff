//! Prompt construction for every LLM call made during a turn.
//!
//! Each builder returns a [`Prompt`] holding a system and a user part.
//! The conversational system prompt is the exception: it is combined
//! with history by the token budgeter and is built by [`system_context`].

use crate::models::{ChatMessage, RuleSnippet};

/// Placeholder shown instead of an empty code block.
pub const NO_CODE_YET: &str = "(no code yet)";

/// A two-part prompt for a single-shot completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(self.user.clone()),
        ]
    }
}

/// Role and decision policy for the conversational turn.
pub fn system_policy(reply_language: &str, enable_review: bool) -> String {
    let mut prompt = format!(
        "You are a coding assistant that explains, reviews, fixes and improves the \
         user's code. Answer briefly and clearly in {reply_language}.\n\n\
         ## Decision Policy\n\n\
         - When the user asks you to **explain** code (\"what does this line do?\"), \
         answer directly without calling a tool.\n\
         - When the user asks you to **fix, refactor, optimize or change** the code, \
         call `run_fix` with `fix_instructions` describing the changes.\n\
         - When the user asks about **rules, conventions, best practices or naming** \
         without asking for a review, call `search_rule` with a `query` and the \
         `language`.\n"
    );
    if enable_review {
        prompt.push_str(
            "- When the user asks you to **review or evaluate** the code, call \
             `run_review` with a short `review_focus`.\n",
        );
    }
    prompt.push_str(
        "- Never modify the code unless the user explicitly asks for it.\n\
         - If the question is not about programming, reply in one sentence that you \
         only help with code and invite another question.\n",
    );
    prompt
}

/// Current code artifacts for the conversational turn.
pub fn system_context(origin_code: &str, fixed_code: &str, language: &str, review_md: &str) -> String {
    let mut prompt = if origin_code.trim().is_empty() {
        format!("## Original Code\n\n{NO_CODE_YET}\n\nLanguage: {language}\n")
    } else {
        format!("## Original Code\n\n```{language}\n{origin_code}\n```\n\nLanguage: {language}\n")
    };
    if !fixed_code.trim().is_empty() {
        prompt.push_str(&format!(
            "\n## Latest Fixed Version\n\n```{language}\n{fixed_code}\n```\n"
        ));
    }
    if !review_md.trim().is_empty() {
        prompt.push_str(&format!("\n## Latest Review\n\n{review_md}\n"));
    }
    prompt
}

/// Rewrite `base_code` according to `instructions`, taking the latest
/// review into account when there is one.
pub fn fix_prompt(language: &str, base_code: &str, instructions: &str, review_md: &str) -> Prompt {
    let review = if review_md.trim().is_empty() {
        String::new()
    } else {
        format!("## Latest Review\n\n{}\n\n", review_md.trim())
    };
    Prompt {
        system: "You are a code editing assistant. Return ONLY ONE fenced code block \
                 (``` ... ```) containing the full corrected code. Do not write any text, \
                 heading, comment or explanation before or after the code block. Do not \
                 add a second code block. If the change cannot be made, return the current \
                 code unchanged in a single code block."
            .to_string(),
        user: format!(
            "Language: {language}\n\n\
             ## Requested Changes\n\n{instructions}\n\n\
             {review}\
             ## Current Code\n\n```{language}\n{base_code}\n```"
        ),
    }
}

/// Summarize the differences between `base_code` and `fixed_code`.
pub fn summary_prompt(language: &str, base_code: &str, fixed_code: &str, reply_language: &str) -> Prompt {
    Prompt {
        system: format!(
            "You are an experienced reviewer. Compare the two versions of the code and \
             list the changes briefly in {reply_language}, one bullet per change using \
             \"- \". Do not include code blocks. Keep it short."
        ),
        user: format!(
            "Language: {language}\n\n\
             ## Original\n\n```{language}\n{base_code}\n```\n\n\
             ## Fixed\n\n```{language}\n{fixed_code}\n```"
        ),
    }
}

/// Answer `question` grounded only in `snippets` (at most `max_snippets` are used).
pub fn rule_answer_prompt(question: &str, snippets: &[RuleSnippet], max_snippets: usize) -> Prompt {
    let rules = snippets
        .iter()
        .take(max_snippets)
        .map(|s| format!("- {} (source: {})", s.summary.trim(), s.source_path))
        .collect::<Vec<_>>()
        .join("\n");
    let rules = if rules.is_empty() {
        "- (none)".to_string()
    } else {
        rules
    };

    Prompt {
        system: "You answer coding questions using ONLY the rules provided. Be brief and \
                 precise. If rules conflict, say so and pick the most reasonable one. Cite \
                 the source of every important recommendation. Do not invent information \
                 that is not in the rules."
            .to_string(),
        user: format!(
            "## Question\n\n{}\n\n\
             ## Rules\n\n{rules}\n\n\
             ## Instructions\n\n\
             - Answer the question directly.\n\
             - Give the relevant principle from the rules, with its source.\n\
             - If the rules are not sufficient, say so instead of guessing.",
            question.trim()
        ),
    }
}

/// Structured review of the whole of `code`.
///
/// Sections appear only when they have findings; `extra_note` is optional
/// context from the user.
pub fn full_review_prompt(language: &str, code: &str, extra_note: &str, reply_language: &str) -> Prompt {
    let system = format!(
        "You are a senior {language} code reviewer. Return a concise Markdown review \
         listing only real issues and how to fix them. Do not quote code and do not \
         describe the parts that are correct.\n\n\
         Include a section only if it has findings:\n\n\
         1. **Critical Bugs**: crashes, data loss or incorrect behavior.\n\
         2. **Likely Bugs**: suspicious or risky logic.\n\
         3. **Security**: missing validation, exposed secrets or unsafe handling.\n\
         4. **Performance**: inefficiencies and clear optimization opportunities.\n\
         5. **Fix Plan**: the ordered list of changes to make.\n\n\
         Keep it short and objective."
    );

    let mut user = format!(
        "Review the following {language} code carefully. Reply in {reply_language} \
         with the Markdown sections described above.\n\n\
         ```{language}\n{}\n```\n",
        code.trim()
    );
    if !extra_note.trim().is_empty() {
        user.push_str(&format!(
            "\n## Additional Context\n\n{}\n\nConsider this context when reviewing the code above.\n",
            extra_note.trim()
        ));
    }

    Prompt { system, user }
}

/// Review `base_code` strictly within `focus`, optionally grounded in `snippets`.
pub fn review_prompt(
    language: &str,
    base_code: &str,
    question: &str,
    focus: &str,
    snippets: &[RuleSnippet],
    reply_language: &str,
) -> Prompt {
    let system = format!(
        "You are an experienced lead developer reviewing code for your team.\n\n\
         ## Review Rules\n\n\
         - Review ONLY within the scope listed under \"Review Focus\".\n\
         - Ignore issues outside that scope and do not mention them.\n\
         - Prefer the provided rules (if any) to support your suggestions, and cite \
         their source path when you use them.\n\
         - Answer briefly in {reply_language} as bullets, one point per bullet.\n\
         - Do not rewrite the whole code; give observations and suggestions only.\n"
    );

    let mut user = format!(
        "## User Request\n\n{question}\n\n\
         ## Review Focus\n\n{focus}\n\n"
    );
    if snippets.is_empty() {
        user.push_str(
            "No specific rules were found. Review from experience, but stay strictly \
             within the focus above.\n\n",
        );
    } else {
        user.push_str("## Relevant Rules\n\n");
        for (i, snippet) in snippets.iter().enumerate() {
            user.push_str(&format!(
                "{}. Source: {}\n{}\n\n",
                i + 1,
                snippet.source_path,
                snippet.summary.trim()
            ));
        }
    }
    user.push_str(&format!(
        "## Code\n\n```{language}\n{base_code}\n```\n\nLanguage: {language}\n"
    ));

    Prompt { system, user }
}
