use crate::patterns::{ExtensionFilter, PatternSet};
use anyhow::Result;
use ignore::{DirEntry, WalkBuilder};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Receives every file the walk selects and reports how many lines it
/// contributed to the document.
#[allow(async_fn_in_trait)]
pub trait Visitor {
    async fn visit(&mut self, path: &Path) -> Result<usize>;
}

/// Advisory cap on the total number of rendered lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineBudget {
    limit: Option<usize>,
    written: usize,
}

impl LineBudget {
    pub fn new(limit: Option<usize>) -> Self {
        Self { limit, written: 0 }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// `0` and negative values mean unlimited.
    pub fn from_cli(lines: i64) -> Self {
        Self::new(usize::try_from(lines).ok().filter(|&n| n > 0))
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.written >= limit)
    }

    pub fn record(&mut self, lines: usize) {
        self.written = self.written.saturating_add(lines);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalReport {
    pub visited: usize,
    pub ignored: usize,
    pub lines: usize,
    pub budget_reached: bool,
}

/// Depth-first, name-sorted walk over the source roots.
///
/// Hidden entries are skipped silently. Entries matching an ignore pattern
/// are reported and skipped, directories included. The extension filter
/// only applies to files. The line budget is checked before each entry, so
/// the file that exhausts it is always completed.
#[derive(Debug)]
pub struct Traverser {
    ignore: Arc<PatternSet>,
    extensions: ExtensionFilter,
    budget: LineBudget,
    excluded: Vec<PathBuf>,
}

impl Traverser {
    pub fn new(ignore: PatternSet, extensions: ExtensionFilter, budget: LineBudget) -> Self {
        Self {
            ignore: Arc::new(ignore),
            extensions,
            budget,
            excluded: Vec::new(),
        }
    }

    /// Never hand `path` to the visitor, e.g. the document being written.
    /// Has no effect if `path` does not exist yet.
    pub fn exclude(&mut self, path: &Path) {
        if let Ok(canonical) = path.canonicalize() {
            self.excluded.push(canonical);
        }
    }

    pub fn budget(&self) -> LineBudget {
        self.budget
    }

    pub async fn traverse<V: Visitor>(
        &mut self,
        roots: &[PathBuf],
        visitor: &mut V,
    ) -> Result<TraversalReport> {
        let mut report = TraversalReport::default();
        let Some((first, rest)) = roots.split_first() else {
            return Ok(report);
        };

        let ignored = Arc::new(AtomicUsize::new(0));

        let mut builder = WalkBuilder::new(first);
        for root in rest {
            builder.add(root);
        }
        builder
            .standard_filters(false)
            .hidden(true)
            .follow_links(true)
            .sort_by_file_name(|a, b| a.cmp(b));

        // Roots are never passed through this filter.
        let patterns = Arc::clone(&self.ignore);
        let ignored_in_filter = Arc::clone(&ignored);
        builder.filter_entry(move |entry| {
            if report_ignored(&patterns, entry.path()) {
                ignored_in_filter.fetch_add(1, Ordering::Relaxed);
                false
            } else {
                true
            }
        });

        let mut walker = builder.build();
        loop {
            if self.budget.exhausted() {
                debug!(
                    "Line budget reached ({} lines), stopping",
                    self.budget.written()
                );
                report.budget_reached = true;
                break;
            }

            let Some(result) = walker.next() else {
                break;
            };

            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Error walking path: {err}");
                    continue;
                }
            };

            if !is_file(&entry) {
                continue;
            }

            let path = entry.path();
            if entry.depth() == 0 && report_ignored(&self.ignore, path) {
                ignored.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            if !self.extensions.accepts_path(path) {
                debug!("Extension not selected: {}", path.display());
                continue;
            }

            if self.is_excluded(path) {
                debug!("Skipping output document: {}", path.display());
                continue;
            }

            let lines = visitor.visit(path).await?;
            self.budget.record(lines);
            report.visited += 1;
        }

        report.ignored = ignored.load(Ordering::Relaxed);
        report.lines = self.budget.written();
        Ok(report)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        !self.excluded.is_empty()
            && path
                .canonicalize()
                .is_ok_and(|canonical| self.excluded.contains(&canonical))
    }
}

fn is_file(entry: &DirEntry) -> bool {
    entry.file_type().is_some_and(|ft| ft.is_file())
}

fn report_ignored(patterns: &PatternSet, path: &Path) -> bool {
    let ignored = patterns.matches_path(path);
    if ignored {
        info!("ignored: {}", path.display());
    }
    ignored
}
