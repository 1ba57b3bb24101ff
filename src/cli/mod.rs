//! CLI command definitions and terminal rendering.
//!
//! Uses clap derive macros for ergonomic argument definitions.

pub mod args;

use std::io::Write;

use colored::Colorize;

use codehero::models::{RuleSearchResult, SessionState};
use codehero::orchestrator::messages;

/// Print the interactive chat banner to stderr.
pub fn print_banner(state: &SessionState, model: &str) {
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = writeln!(handle);
    let _ = writeln!(
        handle,
        "  {} {}",
        "codehero".bold(),
        format!("· {} · {}", state.language, model).dimmed(),
    );
    let _ = writeln!(
        handle,
        "  {}",
        "Commands: /code shows the current code, /review [note] reviews it, /clear resets, /quit exits.".dimmed()
    );
    let _ = writeln!(handle);
    let _ = handle.flush();
}

/// Print an assistant reply.
pub fn print_reply(reply: &str) {
    println!("{} {reply}", "assistant>".cyan().bold());
}

/// Print code as a fenced block with a dimmed header.
pub fn print_code(title: &str, code: &str, language: &str) {
    println!("{}", format!("── {title} ──").dimmed());
    println!("{}", fenced(code, language));
}

/// Wrap `code` in a fenced block tagged with `language`.
pub fn fenced(code: &str, language: &str) -> String {
    format!("```{language}\n{}\n```", code.trim_end())
}

/// Print rule search results.
pub fn print_rule_hits(result: &RuleSearchResult) {
    print!("{}", render_rule_hits(result));
}

/// Render rule search results, one scored entry per snippet.
pub fn render_rule_hits(result: &RuleSearchResult) -> String {
    if result.is_empty() {
        return format!("{}\n", messages::NO_MATCHING_RULE);
    }
    let mut out = String::new();
    for snippet in &result.snippets {
        out.push_str(&format!(
            "{} {}\n",
            format!("[{:.4}]", snippet.score).green(),
            snippet.source_path.bold()
        ));
        for line in snippet.summary.lines() {
            out.push_str(&format!("    {line}\n"));
        }
        out.push('\n');
    }
    out
}
