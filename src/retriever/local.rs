//! File-backed rule retriever.
//!
//! Loads every `.md`/`.txt` file under a corpus directory, chunks it and
//! scores chunks against a query by cosine similarity of term-frequency
//! vectors. Small corpora of hand-written rules do not need embeddings.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ignore::WalkBuilder;
use indexmap::IndexMap;

use crate::models::{RuleQuery, RuleSearchResult, RuleSnippet};

use super::document::RuleDocument;
use super::{RetrieverError, RuleRetriever};

/// Maximum size of a rule file to index (256KB).
const MAX_RULE_FILE_SIZE: u64 = 256 * 1024;

/// Extensions of files treated as rule documents.
const RULE_EXTENSIONS: &[&str] = &["md", "txt"];

/// An indexed chunk of a rule document.
#[derive(Debug, Clone)]
struct RuleChunk {
    text: String,
    source_path: String,
    terms: HashMap<String, f32>,
    norm: f32,
}

impl RuleChunk {
    fn new(text: String, source_path: String) -> Self {
        let terms = term_frequencies(&text);
        let norm = vector_norm(&terms);
        Self {
            text,
            source_path,
            terms,
            norm,
        }
    }
}

/// In-memory rule index grouped by lowercase language tag.
#[derive(Debug, Default)]
pub struct LocalRuleRetriever {
    chunks: IndexMap<String, Vec<RuleChunk>>,
}

impl LocalRuleRetriever {
    /// A retriever with no rules; every search yields zero hits.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the index from already-parsed documents.
    pub fn from_documents(documents: impl IntoIterator<Item = RuleDocument>) -> Self {
        let mut chunks: IndexMap<String, Vec<RuleChunk>> = IndexMap::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for doc in documents {
            for text in doc.chunks() {
                if !seen.insert((doc.language.clone(), text.clone())) {
                    continue;
                }
                chunks
                    .entry(doc.language.clone())
                    .or_default()
                    .push(RuleChunk::new(text, doc.source_path.clone()));
            }
        }

        Self { chunks }
    }

    /// Walk `dir` and index every rule file in it.
    ///
    /// Files without a resolvable language or with invalid frontmatter are
    /// skipped with a warning.
    pub async fn load(dir: &Path) -> Result<Self, RetrieverError> {
        if !dir.is_dir() {
            return Err(RetrieverError::MissingCorpus(dir.to_path_buf()));
        }

        let root = dir.to_path_buf();
        let files = tokio::task::spawn_blocking(move || collect_rule_files(&root))
            .await
            .map_err(|e| RetrieverError::Unavailable(format!("rule loading task failed: {e}")))?;

        let mut documents = Vec::new();
        for rel_path in files {
            let path = dir.join(&rel_path);
            let content =
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| RetrieverError::ReadFile {
                        path: path.clone(),
                        source: e,
                    })?;
            match RuleDocument::parse(&rel_path, &content) {
                Ok(Some(doc)) => documents.push(doc),
                Ok(None) => {
                    tracing::warn!(path = %rel_path.display(), "skipping rule file without language")
                }
                Err(e) => tracing::warn!(path = %rel_path.display(), error = %e, "skipping rule file"),
            }
        }

        let retriever = Self::from_documents(documents);
        tracing::info!(
            dir = %dir.display(),
            languages = retriever.chunks.len(),
            chunks = retriever.len(),
            "rule corpus loaded"
        );
        Ok(retriever)
    }

    /// Number of indexed chunks per language.
    pub fn stats(&self) -> IndexMap<String, usize> {
        self.chunks
            .iter()
            .map(|(language, chunks)| (language.clone(), chunks.len()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.chunks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Synchronous search used by the trait implementation.
    pub fn search_sync(&self, query: &RuleQuery) -> RuleSearchResult {
        let language = query.language.trim().to_lowercase();
        let Some(chunks) = self.chunks.get(&language) else {
            return RuleSearchResult::default();
        };

        let query_terms = term_frequencies(&query.query);
        let query_norm = vector_norm(&query_terms);
        if query_norm == 0.0 {
            return RuleSearchResult::default();
        }

        let mut scored: Vec<(f32, &RuleChunk)> = chunks
            .iter()
            .map(|chunk| (cosine(&query_terms, query_norm, chunk), chunk))
            .filter(|(score, _)| *score > 0.0 && *score >= query.score_threshold)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(query.k);

        RuleSearchResult::new(
            scored
                .into_iter()
                .map(|(score, chunk)| RuleSnippet {
                    summary: chunk.text.clone(),
                    source_path: chunk.source_path.clone(),
                    score: round4(score),
                })
                .collect(),
        )
    }
}

#[async_trait]
impl RuleRetriever for LocalRuleRetriever {
    async fn search(&self, query: &RuleQuery) -> Result<RuleSearchResult, RetrieverError> {
        let result = self.search_sync(query);
        tracing::debug!(
            query = %query.query,
            language = %query.language,
            hits = result.hits,
            "local rule search"
        );
        Ok(result)
    }
}

/// Corpus-relative paths of rule files, sorted for a stable index order.
fn collect_rule_files(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for entry in walker.flatten() {
        if entry.file_type().is_none_or(|ft| !ft.is_file()) {
            continue;
        }
        let path = entry.path();
        let is_rule_file = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| RULE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if !is_rule_file {
            continue;
        }
        if let Ok(metadata) = entry.metadata() {
            if metadata.len() > MAX_RULE_FILE_SIZE {
                tracing::warn!(path = %path.display(), "skipping oversized rule file");
                continue;
            }
        }
        if let Ok(rel) = path.strip_prefix(root) {
            files.push(rel.to_path_buf());
        }
    }
    files
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn term_frequencies(text: &str) -> HashMap<String, f32> {
    let mut terms = HashMap::new();
    for token in tokenize(text) {
        *terms.entry(token).or_insert(0.0) += 1.0;
    }
    terms
}

fn vector_norm(terms: &HashMap<String, f32>) -> f32 {
    terms.values().map(|v| v * v).sum::<f32>().sqrt()
}

fn cosine(query: &HashMap<String, f32>, query_norm: f32, chunk: &RuleChunk) -> f32 {
    if chunk.norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = query
        .iter()
        .filter_map(|(term, q)| chunk.terms.get(term).map(|c| q * c))
        .sum();
    dot / (query_norm * chunk.norm)
}

fn round4(score: f32) -> f32 {
    (score * 10_000.0).round() / 10_000.0
}
