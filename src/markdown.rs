//! Fenced code block extraction from model replies.

use std::sync::LazyLock;

use regex::Regex;

const FENCE: &str = "```";

/// A bare language tag on the opening fence line (`python`, `c++`, `objective-c`, `c#`).
static LANG_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_+#.\-]*$").unwrap());

/// Extract the payload of the outermost fenced block in `text`.
///
/// The payload is everything strictly between the first and the last fence
/// marker, so fences nested inside the code survive. A bare language tag on
/// the first inner line is dropped. With fewer than two markers the whole
/// text is returned trimmed.
pub fn extract_code_block(text: &str) -> String {
    let Some(start) = text.find(FENCE) else {
        return text.trim().to_string();
    };
    let end = text.rfind(FENCE).unwrap_or(start);
    // Overlapping markers (e.g. a lone ```` fence) do not delimit a block
    if end < start + FENCE.len() {
        return text.trim().to_string();
    }

    let inner = &text[start + FENCE.len()..end];
    let body = match inner.split_once('\n') {
        Some((first, rest)) if is_language_tag(first) => rest,
        _ => inner,
    };
    trim_blank_lines(body).to_string()
}

fn is_language_tag(line: &str) -> bool {
    LANG_TAG_RE.is_match(line.trim())
}

/// Trim surrounding whitespace but keep the indentation of the first code line.
fn trim_blank_lines(s: &str) -> &str {
    let s = s.trim_end();
    let leading_blank = s
        .char_indices()
        .take_while(|(_, c)| c.is_whitespace())
        .filter(|(_, c)| *c == '\n')
        .last()
        .map(|(i, _)| i + 1)
        .unwrap_or(0);
    &s[leading_blank..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_fences_return_whole_text() {
        assert_eq!(extract_code_block("````"), "````");
        assert_eq!(extract_code_block("`````"), "`````");
        assert_eq!(
            extract_code_block("````markdown\n# Title\nbody"),
            "````markdown\n# Title\nbody"
        );
    }

    #[test]
    fn six_backticks_give_empty_payload() {
        assert_eq!(extract_code_block("``````"), "");
    }

    #[test]
    fn strips_language_tag() {
        let md = "Here you go:\n```python\ndef f(x: int) -> int:\n    return x + 1\n```\nDone.";
        assert_eq!(
            extract_code_block(md),
            "def f(x: int) -> int:\n    return x + 1"
        );
    }

    #[test]
    fn keeps_first_line_when_not_a_tag() {
        let md = "```\nlet x = 1;\nlet y = 2;\n```";
        assert_eq!(extract_code_block(md), "let x = 1;\nlet y = 2;");
    }

    #[test]
    fn first_code_line_is_not_mistaken_for_tag() {
        let md = "```\nprint(1)\n```";
        assert_eq!(extract_code_block(md), "print(1)");
    }

    #[test]
    fn tags_with_symbols_are_stripped() {
        for tag in ["c++", "c#", "objective-c", "python3", "tsx"] {
            let md = format!("```{tag}\nbody\n```");
            assert_eq!(extract_code_block(&md), "body", "tag {tag}");
        }
    }

    #[test]
    fn nested_fences_are_preserved() {
        let md = "```markdown\n# Title\n```rust\nfn main() {}\n```\n```";
        assert_eq!(
            extract_code_block(md),
            "# Title\n```rust\nfn main() {}\n```"
        );
    }

    #[test]
    fn missing_fences_return_trimmed_text() {
        assert_eq!(extract_code_block("  plain text \n"), "plain text");
        assert_eq!(extract_code_block(""), "");
    }

    #[test]
    fn single_fence_returns_trimmed_text() {
        assert_eq!(
            extract_code_block("```python\nprint(1)\n"),
            "```python\nprint(1)"
        );
    }

    #[test]
    fn empty_block_yields_empty() {
        assert_eq!(extract_code_block("```python\n```"), "");
        assert_eq!(extract_code_block("``````"), "");
    }

    #[test]
    fn inline_block_without_newline() {
        assert_eq!(extract_code_block("```x = 1```"), "x = 1");
    }

    #[test]
    fn preserves_first_line_indentation() {
        let md = "```python\n\n    return x\n```";
        assert_eq!(extract_code_block(md), "    return x");
    }

    #[test]
    fn handles_multibyte_text() {
        let md = "Voilà ✅\n```rust\nlet s = \"héllo\";\n```";
        assert_eq!(extract_code_block(md), "let s = \"héllo\";");
    }
}
