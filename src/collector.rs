//! Turns each selected file into a document fragment.

use crate::filewalker::Visitor;
use crate::highlight::{HighlightError, Highlighter, Language};
use crate::utils::{ReadError, count_lines, read_source};
use crate::writer::HtmlWriter;
use anyhow::Result;
use log::{info, warn};
use std::path::Path;
use thiserror::Error;
use tokio::io::AsyncWrite;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub language: Language,
    pub markup: String,
    pub lines: usize,
}

/// Why a selected file produced no fragment. None of these stop the run.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("not source code")]
    Unclassified(#[source] HighlightError),

    #[error("{0}")]
    Read(#[from] ReadError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub rendered: usize,
    pub skipped: usize,
}

pub struct FileCollector<'a, H: Highlighter, W: AsyncWrite + Unpin> {
    highlighter: &'a H,
    writer: &'a mut HtmlWriter<W>,
    file_footer: &'a str,
    stats: CollectStats,
}

impl<'a, H: Highlighter, W: AsyncWrite + Unpin> FileCollector<'a, H, W> {
    pub fn new(highlighter: &'a H, writer: &'a mut HtmlWriter<W>, file_footer: &'a str) -> Self {
        Self {
            highlighter,
            writer,
            file_footer,
            stats: CollectStats::default(),
        }
    }

    pub fn stats(&self) -> CollectStats {
        self.stats
    }
}

impl<H: Highlighter, W: AsyncWrite + Unpin> Visitor for FileCollector<'_, H, W> {
    async fn visit(&mut self, path: &Path) -> Result<usize> {
        match render_file(self.highlighter, path) {
            Ok(rendered) => {
                self.writer
                    .write_fragment(&rendered.markup, self.file_footer)
                    .await?;
                info!("highlighted with {}: {}", rendered.language, path.display());
                self.stats.rendered += 1;
                Ok(rendered.lines)
            }
            Err(reason) => {
                warn!("{reason}: {}", path.display());
                self.stats.skipped += 1;
                Ok(0)
            }
        }
    }
}

/// Classifies by name first so unclassifiable files are never read.
pub fn render_file<H: Highlighter>(highlighter: &H, path: &Path) -> Result<RenderedFile, SkipReason> {
    let mut language = highlighter
        .classify(path, None)
        .map_err(SkipReason::Unclassified)?;

    let content = read_source(path)?;

    if highlighter.needs_content(path) {
        language = highlighter
            .classify(path, Some(&content))
            .map_err(SkipReason::Unclassified)?;
    }

    let markup = highlighter
        .highlight(&language, &content)
        .map_err(SkipReason::Unclassified)?;

    Ok(RenderedFile {
        language,
        markup,
        lines: count_lines(&content),
    })
}
