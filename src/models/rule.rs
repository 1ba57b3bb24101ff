//! Rule retrieval types.

use serde::{Deserialize, Serialize};

/// A query against the rule corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleQuery {
    pub query: String,
    pub language: String,
    /// Maximum number of snippets to return.
    pub k: usize,
    /// Snippets scoring below this are dropped by the retriever.
    pub score_threshold: f32,
}

/// A retrieved rule or best-practice fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSnippet {
    pub summary: String,
    pub source_path: String,
    pub score: f32,
}

/// Result of a rule search. Snippets are ordered by descending score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSearchResult {
    pub hits: usize,
    pub snippets: Vec<RuleSnippet>,
}

impl RuleSearchResult {
    pub fn new(snippets: Vec<RuleSnippet>) -> Self {
        Self {
            hits: snippets.len(),
            snippets,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits == 0 || self.snippets.is_empty()
    }
}
