//! Shell-style glob matching against base names.
//!
//! Two consumers share the same matcher: ignore rules (an empty set ignores
//! nothing) and the extension allowlist (an empty set accepts everything).

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use log::{debug, warn};
use std::collections::BTreeSet;
use std::path::Path;

/// An immutable set of glob patterns matched against file or directory names.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<String>,
    set: GlobSet,
}

impl PatternSet {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();

        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            if let Some(glob) = compile(pattern) {
                builder.add(glob);
            }
        }

        let set = builder.build().unwrap_or_else(|err| {
            warn!("Could not build pattern set, matching nothing: {err}");
            GlobSet::empty()
        });

        Self { patterns, set }
    }

    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if `name` matches any pattern. `name` is expected to be a
    /// base name; callers holding a full path should use [`matches_path`].
    ///
    /// [`matches_path`]: PatternSet::matches_path
    pub fn matches(&self, name: impl AsRef<Path>) -> bool {
        !self.set.is_empty() && self.set.is_match(name)
    }

    /// Matches the final component of `path`. Paths without one (`/`, `..`)
    /// never match.
    pub fn matches_path(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|name| self.matches(name))
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Allowlist of file names built from a comma separated extension list.
#[derive(Debug, Clone, Default)]
pub struct ExtensionFilter {
    patterns: PatternSet,
}

impl ExtensionFilter {
    /// Accepts every file.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parses `c,cpp,h` into `*.c`, `*.cpp`, `*.h`. A lone `*` (or a list
    /// with no usable entries) accepts every file.
    pub fn parse(spec: &str) -> Self {
        if spec.trim() == "*" {
            return Self::all();
        }

        let globs: BTreeSet<String> = spec
            .split(',')
            .map(|ext| ext.trim().trim_start_matches('.'))
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!("*.{ext}"))
            .collect();

        Self {
            patterns: PatternSet::new(globs),
        }
    }

    pub fn accepts_all(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn accepts(&self, name: impl AsRef<Path>) -> bool {
        self.accepts_all() || self.patterns.matches(name)
    }

    pub fn accepts_path(&self, path: &Path) -> bool {
        self.accepts_all() || self.patterns.matches_path(path)
    }

    pub fn patterns(&self) -> &[String] {
        self.patterns.patterns()
    }
}

/// Loads ignore patterns, one per line. Loading is best effort: a missing or
/// unreadable file yields an empty set and a single warning.
pub fn load_ignore_file(path: &Path) -> PatternSet {
    if !path.exists() {
        warn!(
            "No ignore file at {}, all files will be collected",
            path.display()
        );
        return PatternSet::empty();
    }

    match std::fs::read_to_string(path) {
        Ok(text) => {
            let patterns = parse_ignore_lines(&text);
            debug!(
                "Loaded {} ignore patterns from {}",
                patterns.len(),
                path.display()
            );
            patterns
        }
        Err(err) => {
            warn!(
                "Could not read ignore file {} ({err}), nothing will be ignored",
                path.display()
            );
            PatternSet::empty()
        }
    }
}

/// Every non-empty line is a pattern. There is no comment syntax.
pub fn parse_ignore_lines(text: &str) -> PatternSet {
    PatternSet::new(text.lines().filter(|line| !line.is_empty()))
}

fn compile(pattern: &str) -> Option<Glob> {
    build_glob(&to_globset_syntax(pattern))
        .map_err(|err| debug!("Dropping pattern {pattern:?}: {err}"))
        .ok()
}

/// Rewrites a shell pattern so globset reads it the same way. Only `*`, `?`,
/// `[seq]` and `[!seq]` are special: braces are plain characters, a `[`
/// without a closing `]` is a plain `[`, and a leading `^` in a class is a
/// member rather than a negation.
fn to_globset_syntax(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '[' => {
                // A `]` right after `[` or `[!` is a member, not the end.
                let mut end = i;
                if chars.get(end) == Some(&'!') {
                    end += 1;
                }
                if chars.get(end) == Some(&']') {
                    end += 1;
                }
                while end < chars.len() && chars[end] != ']' {
                    end += 1;
                }

                if end >= chars.len() {
                    out.push_str("[[]");
                } else {
                    let members: String = chars[i..end].iter().collect();
                    push_class(&mut out, &members);
                    i = end + 1;
                }
            }
            '{' => out.push_str("[{]"),
            '}' => out.push_str("[}]"),
            _ => out.push(c),
        }
    }

    out
}

fn push_class(out: &mut String, members: &str) {
    match members.strip_prefix('^') {
        Some("") => out.push('^'),
        Some(rest) => {
            out.push('[');
            out.push_str(rest);
            out.push_str("^]");
        }
        None => {
            out.push('[');
            out.push_str(members);
            out.push(']');
        }
    }
}

fn build_glob(pattern: &str) -> Result<Glob, globset::Error> {
    GlobBuilder::new(pattern)
        .case_insensitive(cfg!(windows))
        .backslash_escape(false)
        .literal_separator(false)
        .build()
}
