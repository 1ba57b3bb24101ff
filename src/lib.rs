//! codehero: conversational AI code review and fix assistant (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod budget;
pub mod config;
pub mod constants;
pub mod env;
pub mod language;
pub mod markdown;
pub mod models;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod retriever;
pub mod tools;
