//! # codes2html Library
//!
//! Collects source files from directories and files into a single
//! self-contained HTML document with syntax highlighting.
//!
//! Files are walked depth first in name order, filtered by ignore patterns
//! and an extension allowlist, highlighted, and appended to the document
//! until an optional line budget is used up.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use codes2html::{Config, run_codes2html};
//! use std::path::PathBuf;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::new(vec![PathBuf::from("src")], PathBuf::from("output.html"));
//!     let summary = run_codes2html(&config).await?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod collector;
pub mod filewalker;
pub mod highlight;
pub mod patterns;
pub mod utils;
pub mod writer;

pub use cli::{Config, ConfigError};
pub use collector::FileCollector;
pub use filewalker::{LineBudget, Traverser, Visitor};
pub use highlight::{Highlighter, Language, SyntectHighlighter};
pub use patterns::{ExtensionFilter, PatternSet};
pub use writer::HtmlWriter;

use anyhow::Result;
use log::debug;
use std::fmt;

/// What a run produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub rendered: usize,
    pub skipped: usize,
    pub ignored: usize,
    pub lines: usize,
    pub budget_reached: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files highlighted ({} lines), {} ignored, {} skipped",
            self.rendered, self.lines, self.ignored, self.skipped
        )?;
        if self.budget_reached {
            f.write_str(", line limit reached")?;
        }
        Ok(())
    }
}

/// Generate the HTML document with the bundled syntect grammars.
pub async fn run_codes2html(config: &Config) -> Result<RunSummary> {
    let highlighter = SyntectHighlighter::new(&config.theme)?;
    run_with_highlighter(config, &highlighter).await
}

/// Generate the HTML document with any [`Highlighter`].
///
/// Missing sources fail the run before the output file is created. Once the
/// header is written the footer is always attempted, even if the walk failed.
pub async fn run_with_highlighter<H: Highlighter>(
    config: &Config,
    highlighter: &H,
) -> Result<RunSummary> {
    config.validate_sources()?;
    let stylesheet = highlighter.stylesheet()?;

    let mut writer = HtmlWriter::create(&config.output_path).await?;
    writer.write_header(&config.title, &stylesheet).await?;

    let mut traverser = Traverser::new(
        config.ignore_patterns.clone(),
        config.extensions.clone(),
        config.line_budget,
    );
    traverser.exclude(&config.output_path);

    let mut collector = FileCollector::new(highlighter, &mut writer, &config.file_footer);
    let walked = traverser.traverse(&config.sources, &mut collector).await;
    let stats = collector.stats();

    let finished = writer.finish().await;
    let report = walked?;
    finished?;

    debug!("Wrote {}", config.output_path.display());

    Ok(RunSummary {
        rendered: stats.rendered,
        skipped: stats.skipped,
        ignored: report.ignored,
        lines: report.lines,
        budget_reached: report.budget_reached,
    })
}
