//! Language classification and HTML highlighting.
//!
//! The collector only talks to the [`Highlighter`] trait. The shipped
//! implementation is backed by syntect's bundled grammars and themes.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use thiserror::Error;

pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Extensions shared by several languages. Files carrying one are classified
/// a second time with their content.
const AMBIGUOUS_EXTENSIONS: &[&str] = &["h"];

const CLASS_STYLE: ClassStyle = ClassStyle::Spaced;

static OBJC_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:@(?:interface|implementation|protocol|class|property|end)\b|#import\b)")
        .expect("objective-c marker regex is valid")
});

static CPP_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?:namespace\s+\w+|template\s*<|class\s+\w+\s*[:{]|using\s+namespace\b)|\bstd::|^\s*(?:public|private|protected)\s*:",
    )
    .expect("c++ marker regex is valid")
});

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("could not classify {}", .0.display())]
    Unclassified(PathBuf),

    #[error("unknown language `{0}`")]
    UnknownLanguage(String),

    #[error("unknown theme `{name}` (available: {available})")]
    UnknownTheme { name: String, available: String },

    #[error(transparent)]
    Syntect(#[from] syntect::Error),
}

/// The grammar a file was classified as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    name: String,
}

impl Language {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Classifies files and renders their content as HTML markup.
pub trait Highlighter {
    /// Picks a grammar from the file name, and from `content` when given.
    fn classify(&self, path: &Path, content: Option<&str>) -> Result<Language, HighlightError>;

    /// Whether the name alone is ambiguous and `classify` should be asked
    /// again with the file content.
    fn needs_content(&self, path: &Path) -> bool;

    fn highlight(&self, language: &Language, content: &str) -> Result<String, HighlightError>;

    /// Presentation rules embedded in the document head.
    fn stylesheet(&self) -> Result<String, HighlightError>;
}

pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl SyntectHighlighter {
    pub fn new(theme_name: &str) -> Result<Self, HighlightError> {
        let mut themes = ThemeSet::load_defaults();
        let theme = match themes.themes.remove(theme_name) {
            Some(theme) => theme,
            None => {
                return Err(HighlightError::UnknownTheme {
                    name: theme_name.to_string(),
                    available: available_themes().join(", "),
                });
            }
        };

        Ok(Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme,
        })
    }

    fn syntax_for_name(&self, path: &Path) -> Option<&SyntaxReference> {
        let file_name = path.file_name().and_then(|n| n.to_str())?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        self.syntax_for_token(file_name)
            .or_else(|| self.syntax_for_token(extension))
    }

    /// Exact match on a grammar's file extensions (which also hold full names
    /// like `Makefile`), falling back to a case-insensitive match. Exact
    /// first, so `c` is C even though C++ claims `C`.
    fn syntax_for_token(&self, token: &str) -> Option<&SyntaxReference> {
        if token.is_empty() {
            return None;
        }
        let syntaxes = self.syntaxes.syntaxes();
        syntaxes
            .iter()
            .find(|s| s.file_extensions.iter().any(|e| e == token))
            .or_else(|| {
                syntaxes
                    .iter()
                    .find(|s| s.file_extensions.iter().any(|e| e.eq_ignore_ascii_case(token)))
            })
    }
}

impl Highlighter for SyntectHighlighter {
    fn classify(&self, path: &Path, content: Option<&str>) -> Result<Language, HighlightError> {
        let by_name = self
            .syntax_for_name(path)
            .ok_or_else(|| HighlightError::Unclassified(path.to_path_buf()))?;

        if let Some(content) = content.filter(|_| self.needs_content(path)) {
            let sniffed = sniff_c_family(content);
            if let Some(syntax) = self.syntaxes.find_syntax_by_name(sniffed) {
                return Ok(Language::new(&syntax.name));
            }
        }

        Ok(Language::new(&by_name.name))
    }

    fn needs_content(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| AMBIGUOUS_EXTENSIONS.contains(&ext))
    }

    fn highlight(&self, language: &Language, content: &str) -> Result<String, HighlightError> {
        let syntax = self
            .syntaxes
            .find_syntax_by_name(language.name())
            .ok_or_else(|| HighlightError::UnknownLanguage(language.name().to_string()))?;

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntaxes, CLASS_STYLE);
        for line in LinesWithEndings::from(content) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }

        Ok(format!("<pre class=\"code\">{}</pre>\n", generator.finalize()))
    }

    fn stylesheet(&self) -> Result<String, HighlightError> {
        Ok(css_for_theme_with_class_style(&self.theme, CLASS_STYLE)?)
    }
}

/// Names of the bundled themes, sorted.
pub fn available_themes() -> Vec<String> {
    ThemeSet::load_defaults().themes.into_keys().collect()
}

/// Guesses which C-family language a header belongs to.
fn sniff_c_family(content: &str) -> &'static str {
    if OBJC_MARKERS.is_match(content) {
        "Objective-C"
    } else if CPP_MARKERS.is_match(content) {
        "C++"
    } else {
        "C"
    }
}
