use anyhow::{Context, Result, ensure};
use log::debug;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

pub const DOCUMENT_FOOTER: &str = "</body>\n</html>\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Empty,
    Body,
    Closed,
}

/// Assembles the output document: header, fragments in order, footer.
pub struct HtmlWriter<W: AsyncWrite + Unpin> {
    writer: BufWriter<W>,
    stage: Stage,
    fragments: usize,
}

impl HtmlWriter<File> {
    /// Creates or truncates the output file.
    pub async fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .await
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Self::new(file))
    }
}

impl<W: AsyncWrite + Unpin> HtmlWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: BufWriter::new(inner),
            stage: Stage::Empty,
            fragments: 0,
        }
    }

    pub fn fragments(&self) -> usize {
        self.fragments
    }

    pub async fn write_header(&mut self, title: &str, stylesheet: &str) -> Result<()> {
        ensure!(self.stage == Stage::Empty, "document header already written");

        self.writer
            .write_all(document_header(title, stylesheet).as_bytes())
            .await
            .context("Failed to write document header")?;
        self.stage = Stage::Body;
        Ok(())
    }

    /// Writes one rendered file followed by the literal `file_footer`.
    pub async fn write_fragment(&mut self, markup: &str, file_footer: &str) -> Result<()> {
        ensure!(
            self.stage == Stage::Body,
            "fragments go between the document header and footer"
        );

        self.writer
            .write_all(markup.as_bytes())
            .await
            .context("Failed to write rendered file")?;
        self.writer
            .write_all(file_footer.as_bytes())
            .await
            .context("Failed to write file footer")?;
        self.fragments += 1;
        Ok(())
    }

    pub async fn write_footer(&mut self) -> Result<()> {
        ensure!(self.stage == Stage::Body, "document footer needs a header first");

        self.writer
            .write_all(DOCUMENT_FOOTER.as_bytes())
            .await
            .context("Failed to write document footer")?;
        self.stage = Stage::Closed;
        Ok(())
    }

    /// Writes the footer unless already written, flushes and hands back the sink.
    pub async fn finish(mut self) -> Result<W> {
        if self.stage == Stage::Body {
            self.write_footer().await?;
        }
        self.writer.flush().await.context("Failed to flush output")?;
        debug!("Document closed after {} fragments", self.fragments);
        Ok(self.writer.into_inner())
    }
}

/// Document prologue with the highlighting stylesheet embedded.
pub fn document_header(title: &str, stylesheet: &str) -> String {
    let title = escape_html(title);
    let mut header = format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n  \
         <meta charset=\"utf-8\">\n  \
         <title>{title}</title>\n  \
         <style type=\"text/css\">\n\
         {stylesheet}\n  \
         </style>\n\
         </head>\n\
         <body>\n"
    );
    if !title.is_empty() {
        header.push_str(&format!("<h2>{title}</h2>\n"));
    }
    header.push('\n');
    header
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
