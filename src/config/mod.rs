//! Configuration loading and layering.
//!
//! Handles `.codehero.toml` loading, environment variable resolution,
//! and CLI flag merging with proper priority ordering.

pub mod loader;

pub use loader::{ChatConfig, Config, ConfigError, ProviderConfig, RulesConfig};
