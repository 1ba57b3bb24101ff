//! File extension to language tag mapping.

use std::path::Path;

use crate::models::DEFAULT_LANGUAGE;

/// Known extensions and their language tags. Order matters for
/// [`extension_for`]: the first extension listed for a language wins.
const EXTENSIONS: &[(&str, &str)] = &[
    ("py", "python"),
    ("js", "javascript"),
    ("ts", "typescript"),
    ("tsx", "tsx"),
    ("jsx", "jsx"),
    ("java", "java"),
    ("cs", "csharp"),
    ("cpp", "cpp"),
    ("cxx", "cpp"),
    ("cc", "cpp"),
    ("c", "c"),
    ("go", "go"),
    ("rs", "rust"),
    ("rb", "ruby"),
    ("php", "php"),
    ("swift", "swift"),
    ("kt", "kotlin"),
    ("m", "objectivec"),
    ("mm", "objectivec"),
    ("sh", "bash"),
    ("sql", "sql"),
    ("html", "html"),
    ("css", "css"),
    ("json", "json"),
    ("yml", "yaml"),
    ("yaml", "yaml"),
    ("toml", "toml"),
    ("md", "markdown"),
    ("txt", "text"),
];

/// Guess the language tag of a file from its extension. Unknown → `"text"`.
pub fn guess_language(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .and_then(|ext| {
            EXTENSIONS
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, lang)| *lang)
        })
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// File extension (with leading dot) for a language tag. Unknown → `".txt"`.
pub fn extension_for(language: &str) -> String {
    let language = language.trim().to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(_, lang)| *lang == language)
        .map(|(ext, _)| format!(".{ext}"))
        .unwrap_or_else(|| ".txt".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_common_languages() {
        assert_eq!(guess_language(Path::new("src/main.rs")), "rust");
        assert_eq!(guess_language(Path::new("app.py")), "python");
        assert_eq!(guess_language(Path::new("lib/Widget.TSX")), "tsx");
        assert_eq!(guess_language(Path::new("k8s/deploy.yml")), "yaml");
    }

    #[test]
    fn unknown_or_missing_extension_is_text() {
        assert_eq!(guess_language(Path::new("Makefile")), "text");
        assert_eq!(guess_language(Path::new("data.xyz")), "text");
    }

    #[test]
    fn extension_for_maps_back() {
        assert_eq!(extension_for("python"), ".py");
        assert_eq!(extension_for("cpp"), ".cpp");
        assert_eq!(extension_for("YAML"), ".yml");
        assert_eq!(extension_for("brainfuck"), ".txt");
        assert_eq!(extension_for("text"), ".txt");
    }
}
