//! Rule document parsing and chunking.
//!
//! A rule file is Markdown or plain text with optional YAML frontmatter:
//!
//! ```markdown
//! ---
//! language: python
//! source: PEP 8
//! ---
//!
//! Function names should be lowercase, with words separated by underscores.
//! ```

use std::path::{Component, Path};

use serde::Deserialize;

/// Target chunk length in characters.
pub const CHUNK_SIZE: usize = 200;
/// Characters of trailing words repeated at the start of the next chunk.
pub const CHUNK_OVERLAP: usize = 20;

/// Optional frontmatter of a rule file.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuleFrontmatter {
    pub language: Option<String>,
    pub source: Option<String>,
}

/// A loaded rule file, ready for chunking.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDocument {
    /// Lowercase language tag.
    pub language: String,
    pub source_path: String,
    pub body: String,
}

impl RuleDocument {
    pub fn new(
        language: impl Into<String>,
        source_path: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            language: language.into().trim().to_lowercase(),
            source_path: source_path.into(),
            body: body.into(),
        }
    }

    /// Parse a rule file found at `rel_path` under the corpus root.
    ///
    /// Returns `Ok(None)` when no language can be determined.
    pub fn parse(rel_path: &Path, content: &str) -> Result<Option<Self>, String> {
        let (frontmatter, body) = match split_frontmatter(content) {
            Some((yaml, body)) => {
                let fm: RuleFrontmatter = serde_yaml_ng::from_str(yaml)
                    .map_err(|e| format!("invalid frontmatter: {e}"))?;
                (fm, body)
            }
            None => (RuleFrontmatter::default(), content),
        };

        let language = frontmatter
            .language
            .filter(|l| !l.trim().is_empty())
            .or_else(|| language_from_path(rel_path));
        let Some(language) = language else {
            return Ok(None);
        };
        let source_path = frontmatter
            .source
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| rel_path.to_string_lossy().replace('\\', "/"));

        Ok(Some(Self::new(language, source_path, body.trim())))
    }

    pub fn chunks(&self) -> Vec<String> {
        chunk_text(&self.body, CHUNK_SIZE, CHUNK_OVERLAP)
    }
}

/// Split leading `---` YAML frontmatter from the body, if present and closed.
fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let content = content.trim_start();
    let after_first = content.strip_prefix("---")?;
    let end = after_first.find("\n---")?;
    let yaml = after_first[..end].trim();
    let rest = &after_first[end + 4..];
    // Drop the remainder of the closing delimiter line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    Some((yaml, body))
}

/// First directory component of a corpus-relative path (`python/naming.md` → `python`).
fn language_from_path(rel_path: &Path) -> Option<String> {
    let mut components = rel_path.components();
    let first = components.next()?;
    // A bare file name at the corpus root carries no language
    components.next()?;
    match first {
        Component::Normal(name) => name.to_str().map(str::to_string),
        _ => None,
    }
}

/// Split text into chunks of about `size` characters.
///
/// Paragraphs are packed together while they fit. Longer paragraphs are
/// split on word boundaries, repeating about `overlap` characters of
/// trailing words at the start of the next chunk.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let size = size.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let paragraph_len = paragraph.chars().count();
        if paragraph_len > size {
            flush(&mut current, &mut chunks);
            chunks.extend(split_words(paragraph, size, overlap));
            continue;
        }
        let current_len = current.chars().count();
        if !current.is_empty() && current_len + 2 + paragraph_len > size {
            flush(&mut current, &mut chunks);
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }
    flush(&mut current, &mut chunks);
    chunks
}

fn flush(current: &mut String, chunks: &mut Vec<String>) {
    let chunk = current.trim();
    if !chunk.is_empty() {
        chunks.push(chunk.to_string());
    }
    current.clear();
}

fn split_words(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let mut end = start;
        let mut len = 0;
        while end < words.len() {
            let add = words[end].chars().count() + usize::from(end > start);
            if end > start && len + add > size {
                break;
            }
            len += add;
            end += 1;
        }
        chunks.push(words[start..end].join(" "));
        if end >= words.len() {
            break;
        }

        // Step back over trailing words for the overlap, always advancing
        let mut next = end;
        let mut overlap_len = 0;
        while next > start + 1 {
            let add = words[next - 1].chars().count() + 1;
            if overlap_len + add > overlap {
                break;
            }
            overlap_len += add;
            next -= 1;
        }
        start = next;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_frontmatter() {
        let content = "---\nlanguage: Python\nsource: PEP 8\n---\n\nUse snake_case for functions.\n";
        let doc = RuleDocument::parse(Path::new("misc/naming.md"), content)
            .unwrap()
            .unwrap();
        assert_eq!(doc.language, "python");
        assert_eq!(doc.source_path, "PEP 8");
        assert_eq!(doc.body, "Use snake_case for functions.");
    }

    #[test]
    fn parse_language_from_directory() {
        let doc = RuleDocument::parse(Path::new("go/errors.md"), "Wrap errors with context.")
            .unwrap()
            .unwrap();
        assert_eq!(doc.language, "go");
        assert_eq!(doc.source_path, "go/errors.md");
    }

    #[test]
    fn parse_root_file_without_language_is_skipped() {
        let doc = RuleDocument::parse(Path::new("README.md"), "General notes.").unwrap();
        assert!(doc.is_none());
    }

    #[test]
    fn parse_invalid_frontmatter_errors() {
        let content = "---\nlanguage: [unclosed\n---\nbody";
        let err = RuleDocument::parse(Path::new("x/y.md"), content).unwrap_err();
        assert!(err.contains("invalid frontmatter"));
    }

    #[test]
    fn unterminated_frontmatter_is_treated_as_body() {
        let doc = RuleDocument::parse(Path::new("rust/a.md"), "--- not yaml\nbody")
            .unwrap()
            .unwrap();
        assert_eq!(doc.body, "--- not yaml\nbody");
    }

    #[test]
    fn short_paragraphs_are_packed() {
        let chunks = chunk_text("First rule.\n\nSecond rule.\n\n\n\nThird rule.", 200, 20);
        assert_eq!(chunks, vec!["First rule.\n\nSecond rule.\n\nThird rule."]);
    }

    #[test]
    fn paragraphs_split_when_over_size() {
        let chunks = chunk_text("aaaa aaaa\n\nbbbb bbbb", 12, 0);
        assert_eq!(chunks, vec!["aaaa aaaa", "bbbb bbbb"]);
    }

    #[test]
    fn long_paragraph_split_with_overlap() {
        let text = "one two three four five six seven eight nine ten";
        let chunks = chunk_text(text, 20, 10);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20, "chunk too long: {chunk}");
        }
        // The last word of a chunk reappears at the start of the next one
        let first_last_word = chunks[0].split_whitespace().last().unwrap();
        assert!(chunks[1].starts_with(first_last_word));
        assert!(chunks.last().unwrap().ends_with("ten"));
    }

    #[test]
    fn oversized_word_still_progresses() {
        let chunks = chunk_text("supercalifragilistic tiny", 5, 3);
        assert_eq!(chunks, vec!["supercalifragilistic", "tiny"]);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_text("  \n\n  ", 200, 20).is_empty());
    }
}
