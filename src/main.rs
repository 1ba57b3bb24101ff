//! codehero: conversational AI code review and fix assistant.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use codehero::config;
use codehero::constants;
use codehero::env;
use codehero::language;
use codehero::models;
use codehero::orchestrator;
use codehero::providers;
use codehero::retriever;

use std::io::Write;
use std::path::Path;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use cli::args::{
    AskArgs, ChatArgs, Cli, Command, ReviewArgs, RulesAction, RulesSearchArgs, SessionArgs,
};
use config::Config;
use env::Env;
use models::{RuleQuery, SessionState};
use orchestrator::{ConversationOrchestrator, TurnOutcome};
use providers::rig::RigGateway;
use retriever::{LocalRuleRetriever, RetrieverError};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Command::Chat(args) => run_chat(args).await,
        Command::Ask(args) => run_ask(args).await,
        Command::Review(args) => run_review(args).await,
        Command::Rules { action } => run_rules(action).await,
        Command::Version => run_version(),
    }
}

/// Install the stderr log subscriber.
///
/// `--verbose` forces debug output; otherwise `CODEHERO_LOG`, then
/// `RUST_LOG`, then `warn`.
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("codehero=debug")
    } else {
        EnvFilter::try_from_env(constants::ENV_LOG)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {e}"))
}

/// Print detailed version and build information.
fn run_version() -> Result<()> {
    use colored::Colorize;

    println!(
        "{} {}",
        constants::APP_NAME.bold(),
        constants::VERSION.green().bold()
    );
    println!("{}     {}", "target:".dimmed(), constants::TARGET);
    Ok(())
}

/// Load layered config from the working directory and environment.
fn load_config() -> Result<Config> {
    let cwd = std::env::current_dir().context("failed to determine working directory")?;
    Config::load(Some(&cwd), &Env::real()).context("failed to load configuration")
}

/// Apply session CLI flags on top of the loaded config.
fn apply_session_flags(config: &mut Config, args: &SessionArgs) {
    if let Some(ref model) = args.model {
        config.provider.model = model.clone();
    }
    if let Some(ref dir) = args.rules_dir {
        config.rules.dir = dir.clone();
    }
}

/// Load the rule corpus, falling back to an empty one.
///
/// The assistant works without rules; `search_rule` then reports no match.
async fn load_rules_or_empty(dir: &Path) -> LocalRuleRetriever {
    match LocalRuleRetriever::load(dir).await {
        Ok(retriever) => retriever,
        Err(RetrieverError::MissingCorpus(path)) => {
            tracing::debug!(dir = %path.display(), "no rule corpus, rule search disabled");
            LocalRuleRetriever::empty()
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to load rule corpus, rule search disabled");
            LocalRuleRetriever::empty()
        }
    }
}

async fn build_orchestrator(config: &Config) -> Result<ConversationOrchestrator> {
    let gateway =
        RigGateway::new(config.provider.clone()).context("failed to configure LLM provider")?;
    let rules = load_rules_or_empty(&config.rules.dir).await;
    Ok(ConversationOrchestrator::new(
        Arc::new(gateway),
        Arc::new(rules),
        config,
    ))
}

/// Load `file` (if any) into `state`, detecting its language.
async fn load_code(state: &mut SessionState, args: &SessionArgs) -> Result<()> {
    if let Some(ref path) = args.file {
        let code = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let language = args
            .language
            .clone()
            .unwrap_or_else(|| language::guess_language(path).to_string());
        state.set_code(code, language);
    } else if let Some(ref language) = args.language {
        state.language = language.clone();
    }
    Ok(())
}

/// Interactive conversation loop on stdin/stdout.
async fn run_chat(args: ChatArgs) -> Result<()> {
    let mut config = load_config()?;
    apply_session_flags(&mut config, &args.session);
    let orchestrator = build_orchestrator(&config).await?;

    let mut state = SessionState::new(config.provider.model.clone());
    load_code(&mut state, &args.session).await?;
    cli::print_banner(&state, &config.provider.model);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush().context("failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };
        let question = line.trim();
        match question {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                state.clear();
                println!("Session cleared.");
                continue;
            }
            "/code" => {
                if state.current_code().trim().is_empty() {
                    println!("No code loaded.");
                } else {
                    cli::print_code("Current code", state.current_code(), &state.language);
                }
                continue;
            }
            _ => {}
        }

        if let Some(note) = review_command(question) {
            let outcome = orchestrator.review(state, note).await;
            state = finish_turn(outcome, question);
            continue;
        }

        let outcome = orchestrator.reply(state, question).await;
        state = finish_turn(outcome, question);
    }
    Ok(())
}

/// The note of a `/review [note]` chat command.
fn review_command(input: &str) -> Option<&str> {
    let rest = input.strip_prefix("/review")?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Print the outcome of a turn and record it in the history.
fn finish_turn(outcome: TurnOutcome, question: &str) -> SessionState {
    let TurnOutcome {
        reply,
        mut state,
        used_tool,
    } = outcome;
    cli::print_reply(&reply);
    if used_tool {
        cli::print_code("Fixed code", &state.fixed_code, &state.language);
    }
    state.record_exchange(question, reply);
    state
}

/// One-shot question, optionally resuming and persisting a session file.
async fn run_ask(args: AskArgs) -> Result<()> {
    let mut config = load_config()?;
    apply_session_flags(&mut config, &args.session);

    let state = prepare_session(&config, &args.session, args.session_file.as_deref()).await?;

    let orchestrator = build_orchestrator(&config).await?;
    let outcome = orchestrator.reply(state, &args.question).await;
    let used_tool = outcome.used_tool;
    let state = finish_turn(outcome, &args.question);

    if used_tool {
        if let Some(ref out) = args.out {
            let target = if out.is_dir() {
                out.join(format!("fixed{}", language::extension_for(&state.language)))
            } else {
                out.clone()
            };
            tokio::fs::write(&target, format!("{}\n", state.fixed_code.trim_end()))
                .await
                .with_context(|| format!("failed to write {}", target.display()))?;
            eprintln!("Fixed code written to {}", target.display());
        }
    }
    if let Some(ref path) = args.session_file {
        state.save(path)?;
    }
    Ok(())
}

/// Load a session (or start one), apply flags and code, for one-shot commands.
async fn prepare_session(
    config: &Config,
    args: &SessionArgs,
    session_file: Option<&Path>,
) -> Result<SessionState> {
    let mut state = match session_file {
        Some(path) if path.exists() => SessionState::load(path)?,
        _ => SessionState::new(config.provider.model.clone()),
    };
    if let Some(ref model) = args.model {
        state.model = model.clone();
    }
    load_code(&mut state, args).await?;
    Ok(state)
}

/// One-shot structured review, optionally resuming and persisting a session file.
async fn run_review(args: ReviewArgs) -> Result<()> {
    let mut config = load_config()?;
    apply_session_flags(&mut config, &args.session);
    let state = prepare_session(&config, &args.session, args.session_file.as_deref()).await?;

    let orchestrator = build_orchestrator(&config).await?;
    let note = args.note.as_deref().unwrap_or_default();
    let outcome = orchestrator.review(state, note).await;
    let state = finish_turn(outcome, "/review");

    if let Some(ref path) = args.session_file {
        state.save(path)?;
    }
    Ok(())
}

async fn run_rules(action: RulesAction) -> Result<()> {
    let config = load_config()?;
    match action {
        RulesAction::Search(args) => run_rules_search(args, &config).await,
        RulesAction::Stats { dir } => {
            let dir = dir.unwrap_or_else(|| config.rules.dir.clone());
            let retriever = LocalRuleRetriever::load(&dir)
                .await
                .context("failed to load rule corpus")?;
            let stats = retriever.stats();
            if stats.is_empty() {
                println!("No rules indexed in {}.", dir.display());
            }
            for (language, chunks) in &stats {
                println!("{language:<16} {chunks} chunks");
            }
            Ok(())
        }
    }
}

async fn run_rules_search(args: RulesSearchArgs, config: &Config) -> Result<()> {
    let dir = args.dir.unwrap_or_else(|| config.rules.dir.clone());
    let retriever = LocalRuleRetriever::load(&dir)
        .await
        .context("failed to load rule corpus")?;
    let query = RuleQuery {
        query: args.query,
        language: args.language,
        k: args.k.unwrap_or(config.rules.k),
        score_threshold: args.threshold.unwrap_or(config.rules.score_threshold),
    };
    cli::print_rule_hits(&retriever.search_sync(&query));
    Ok(())
}
