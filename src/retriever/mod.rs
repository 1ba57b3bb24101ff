//! Rule retrieval.
//!
//! The orchestrator depends only on the [`RuleRetriever`] trait. A
//! file-backed implementation over a directory of Markdown/text rule
//! documents is provided by [`LocalRuleRetriever`].

pub mod document;
pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{RuleQuery, RuleSearchResult};

pub use local::LocalRuleRetriever;

/// Errors from a rule retriever.
#[derive(Error, Debug)]
pub enum RetrieverError {
    #[error("rule corpus not found: {0}")]
    MissingCorpus(PathBuf),

    #[error("failed to read rule file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("rule retriever unavailable: {0}")]
    Unavailable(String),
}

/// Ranked lookup of rule snippets.
///
/// Implementations apply the score threshold and return snippets in
/// descending score order; callers never re-sort.
#[async_trait]
pub trait RuleRetriever: Send + Sync {
    async fn search(&self, query: &RuleQuery) -> Result<RuleSearchResult, RetrieverError>;
}
