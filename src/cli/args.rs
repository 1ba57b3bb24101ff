//! Clap argument types.

use clap::Parser;
use std::path::PathBuf;

/// Conversational AI code review and fix assistant.
#[derive(Parser, Debug)]
#[command(name = "codehero", version = codehero::constants::VERSION, about)]
pub struct Cli {
    /// Enable debug logging (overrides CODEHERO_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Start an interactive conversation about a source file.
    Chat(ChatArgs),

    /// Ask a single question and exit.
    Ask(AskArgs),

    /// Produce a structured review of a source file.
    Review(ReviewArgs),

    /// Inspect the local rule corpus.
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// Print version and build information.
    Version,
}

/// Options shared by `chat`, `ask` and `review`.
#[derive(clap::Args, Debug, Clone)]
pub struct SessionArgs {
    /// Source file to discuss.
    #[arg(long, short)]
    pub file: Option<PathBuf>,

    /// Language tag of the code (default: detected from the file extension).
    #[arg(long, short)]
    pub language: Option<String>,

    /// Model to use (default: from config).
    #[arg(long, short)]
    pub model: Option<String>,

    /// Rule corpus directory (default: from config).
    #[arg(long)]
    pub rules_dir: Option<PathBuf>,
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    #[command(flatten)]
    pub session: SessionArgs,
}

/// Arguments for the `ask` subcommand.
#[derive(Parser, Debug)]
pub struct AskArgs {
    /// The question or request.
    pub question: String,

    #[command(flatten)]
    pub session: SessionArgs,

    /// Session file to resume from and save to (JSON).
    #[arg(long = "session", value_name = "PATH")]
    pub session_file: Option<PathBuf>,

    /// Write the fixed code to this file (or into this directory) when a fix is applied.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the `review` subcommand.
#[derive(Parser, Debug)]
pub struct ReviewArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Extra context for the reviewer (e.g. how the code is used).
    #[arg(long)]
    pub note: Option<String>,

    /// Session file to resume from and save to (JSON).
    #[arg(long = "session", value_name = "PATH")]
    pub session_file: Option<PathBuf>,
}

/// Rule corpus subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum RulesAction {
    /// Search the rule corpus.
    Search(RulesSearchArgs),
    /// Show chunk counts per language.
    Stats {
        /// Rule corpus directory (default: from config).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

/// Arguments for `rules search`.
#[derive(Parser, Debug)]
pub struct RulesSearchArgs {
    /// Keywords to search for.
    #[arg(long, short)]
    pub query: String,

    /// Language the rules apply to.
    #[arg(long, short)]
    pub language: String,

    /// Rule corpus directory (default: from config).
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Maximum number of results (default: from config).
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Minimum score (default: from config).
    #[arg(long)]
    pub threshold: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ask_with_session_options() {
        let cli = Cli::try_parse_from([
            "codehero",
            "ask",
            "add type hints",
            "--file",
            "app.py",
            "--session",
            "s.json",
            "--out",
            "fixed.py",
        ])
        .unwrap();
        match cli.command {
            Command::Ask(args) => {
                assert_eq!(args.question, "add type hints");
                assert_eq!(args.session.file, Some(PathBuf::from("app.py")));
                assert_eq!(args.session_file, Some(PathBuf::from("s.json")));
                assert_eq!(args.out, Some(PathBuf::from("fixed.py")));
                assert!(args.session.language.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_chat_with_global_verbose() {
        let cli = Cli::try_parse_from([
            "codehero", "chat", "-f", "main.rs", "-l", "rust", "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Chat(args) => {
                assert_eq!(args.session.language.as_deref(), Some("rust"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_rules_search() {
        let cli = Cli::try_parse_from([
            "codehero",
            "rules",
            "search",
            "--query",
            "naming",
            "--language",
            "python",
            "-k",
            "3",
            "--threshold",
            "0.5",
        ])
        .unwrap();
        match cli.command {
            Command::Rules {
                action: RulesAction::Search(args),
            } => {
                assert_eq!(args.query, "naming");
                assert_eq!(args.k, Some(3));
                assert_eq!(args.threshold, Some(0.5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_review_with_note() {
        let cli = Cli::try_parse_from([
            "codehero", "review", "-f", "app.py", "--note", "runs per request",
        ])
        .unwrap();
        match cli.command {
            Command::Review(args) => {
                assert_eq!(args.session.file, Some(PathBuf::from("app.py")));
                assert_eq!(args.note.as_deref(), Some("runs per request"));
                assert!(args.session_file.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rules_search_requires_language() {
        let result = Cli::try_parse_from(["codehero", "rules", "search", "--query", "naming"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
