//! App-wide constants.
//!
//! Centralises the tool name, config paths and environment variable names
//! so a rename only requires changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "codehero";

/// Crate version reported by `codehero version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compilation target triple (set by `build.rs`).
pub const TARGET: &str = env!("TARGET");

/// Local config filename (e.g. `.codehero.toml` in the working directory).
pub const CONFIG_FILENAME: &str = ".codehero.toml";

/// Directory name under `~/.config/` for global config.
pub const CONFIG_DIR: &str = "codehero";

/// Default rule corpus directory, relative to the working directory.
pub const DEFAULT_RULES_DIR: &str = "rules";

// ── Environment variable names ──────────────────────────────────────

pub const ENV_PROVIDER: &str = "CODEHERO_PROVIDER";
pub const ENV_MODEL: &str = "CODEHERO_MODEL";
pub const ENV_API_KEY: &str = "CODEHERO_API_KEY";
pub const ENV_BASE_URL: &str = "CODEHERO_BASE_URL";
pub const ENV_RULES_DIR: &str = "CODEHERO_RULES_DIR";
pub const ENV_LOG: &str = "CODEHERO_LOG";
