//! The progressive document assembler.
//!
//! A [`ProgressiveDocument`] is built step by step (header, sections,
//! tables, image grids) and finished by exactly one terminal call that
//! stamps footers and serializes the PDF. Tables and image grids yield to
//! the runtime between chunks so a long document does not monopolise the
//! executor, and every step is reported to the progress callback.
//!
//! ```no_run
//! use estimate_pdf::{GeneratorOptions, ProgressiveDocument, TableOptions};
//!
//! # async fn run() -> estimate_pdf::Result<()> {
//! let options = GeneratorOptions::default()
//!     .with_progress(|update| println!("{}% {}", update.percentage, update.message));
//! let mut doc = ProgressiveDocument::new(options)?;
//! doc.add_header("Estimate #1042", Some("Green Acres Landscaping")).await?;
//! doc.add_section("Client", "Jane Doe, 12 Elm Street").await?;
//! let headers = vec!["Item".to_string(), "Qty".to_string(), "Total".to_string()];
//! let rows = vec![vec!["Mulch".to_string(), "4".to_string(), "$120.00".to_string()]];
//! doc.add_progressive_table(&headers, &rows, &TableOptions::default()).await?;
//! doc.save("estimate.pdf")?;
//! # Ok(())
//! # }
//! ```

mod content;
mod options;
mod sections;

pub use content::{Block, DocumentSpec, HeaderSpec, ImageSetSpec, SectionBody, SectionSpec};
pub use options::{DocumentInfo, GeneratorOptions};

use crate::cancel::CancellationToken;
use crate::context::RenderContext;
use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::footer::{Footer, FooterOptions};
use crate::images::{self, ImageGridOptions, ImageGridReport, ImageRef};
use crate::layout::{Canvas, PageGeometry};
use crate::memory::{default_sampler, MemoryMonitor, MemoryStats};
use crate::progress::ProgressReporter;
use crate::table::{self, TableOptions, TableReport};
use crate::text::CacheStats;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Local;
use std::path::Path;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Created,
    HeaderAdded,
    SectionAdded,
    TableAdded,
    ImagesAdded,
    Finalized,
    Failed,
}

impl DocumentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentState::Finalized | DocumentState::Failed)
    }
}

/// What [`ProgressiveDocument::build`] rendered, in block order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub sections: usize,
    pub tables: Vec<TableReport>,
    pub image_grids: Vec<ImageGridReport>,
    pub page_breaks: usize,
}

pub struct ProgressiveDocument {
    ctx: RenderContext,
    footer: Footer,
    state: DocumentState,
    options: GeneratorOptions,
    title: Option<String>,
}

impl ProgressiveDocument {
    pub fn new(options: GeneratorOptions) -> Result<Self> {
        options.validate()?;
        let geometry = options.geometry();

        let mut document = Document::new();
        document.set_compress(options.compress);
        apply_metadata(&mut document, &options.metadata);

        let sampler = options
            .memory_sampler
            .clone()
            .unwrap_or_else(default_sampler);
        let monitor = MemoryMonitor::new(options.memory_threshold_mb, options.memory_pause, sampler);
        let footer = Footer::new(FooterOptions {
            label: options.footer_label.clone(),
            date_format: options.date_format.clone(),
            date: options
                .generation_date
                .unwrap_or_else(|| Local::now().date_naive()),
            ..FooterOptions::default()
        });

        info!(
            width = geometry.width,
            height = geometry.height,
            chunk_size = options.chunk_size,
            memory_threshold_mb = options.memory_threshold_mb,
            sampler = monitor.sampler_name(),
            "starting document generation"
        );

        let ctx = RenderContext {
            canvas: Canvas::new(geometry, document),
            monitor,
            progress: ProgressReporter::new(options.on_progress.clone()),
            cancellation: options.cancellation.clone().unwrap_or_default(),
            chunk_pause: options.chunk_pause,
        };
        Ok(Self {
            ctx,
            footer,
            state: DocumentState::Created,
            options,
            title: None,
        })
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub fn geometry(&self) -> PageGeometry {
        self.ctx.canvas.geometry()
    }

    pub fn page_count(&self) -> usize {
        self.ctx.canvas.document().page_count()
    }

    pub fn current_page(&self) -> usize {
        self.ctx.canvas.tracker().current_page()
    }

    pub fn steps_completed(&self) -> usize {
        self.ctx.progress.completed()
    }

    pub fn steps_total(&self) -> usize {
        self.ctx.progress.total()
    }

    pub fn memory_stats(&self) -> MemoryStats {
        self.ctx.monitor.stats()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.ctx.canvas.cache.stats()
    }

    /// Drops cached text measurements and line wraps.
    pub fn clear_layout_cache(&mut self) {
        self.ctx.canvas.cache.clear();
    }

    /// A handle that stops this run at its next yield point.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.ctx.cancellation.clone()
    }

    /// Fixes the progress total to the steps `spec` will report, on top of
    /// any already completed.
    pub fn plan(&mut self, spec: &DocumentSpec) {
        let total = self.ctx.progress.completed() + spec.planned_steps(self.options.chunk_size);
        self.ctx.progress.plan(total);
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            DocumentState::Finalized => Err(PdfError::DocumentFinalized),
            DocumentState::Failed => Err(PdfError::DocumentFailed),
            _ => Ok(()),
        }
    }

    /// Moves to `next` on success and to `Failed` on any error.
    fn settle<T>(&mut self, result: Result<T>, next: DocumentState) -> Result<T> {
        match result {
            Ok(value) => {
                self.state = next;
                Ok(value)
            }
            Err(err) => {
                error!(error = %err, state = ?self.state, "document generation failed");
                self.state = DocumentState::Failed;
                Err(err)
            }
        }
    }

    pub async fn add_header(&mut self, title: &str, subtitle: Option<&str>) -> Result<()> {
        self.ensure_open()?;
        let result = self.render_header(title, subtitle).await;
        self.settle(result, DocumentState::HeaderAdded)
    }

    async fn render_header(&mut self, title: &str, subtitle: Option<&str>) -> Result<()> {
        if self.state != DocumentState::Created {
            return Err(PdfError::InvalidStructure(
                "the header must be added before any other content".to_string(),
            ));
        }
        self.ctx.cancellation.check()?;
        self.ctx.progress.reserve(1);
        sections::draw_header(&mut self.ctx.canvas, title, subtitle)?;
        self.title = Some(title.to_string());
        self.ctx.progress.report_step("header", title);
        self.ctx.yield_point().await?;
        Ok(())
    }

    /// A titled block of free text. Newlines start new paragraphs.
    pub async fn add_section(&mut self, title: &str, content: &str) -> Result<()> {
        self.ensure_open()?;
        let result = self.render_section(title, &[content.to_string()]).await;
        self.settle(result, DocumentState::SectionAdded)
    }

    /// A titled block where each entry of `lines` wraps on its own.
    pub async fn add_section_lines(&mut self, title: &str, lines: &[String]) -> Result<()> {
        self.ensure_open()?;
        let result = self.render_section(title, lines).await;
        self.settle(result, DocumentState::SectionAdded)
    }

    async fn render_section(&mut self, title: &str, paragraphs: &[String]) -> Result<()> {
        self.ctx.cancellation.check()?;
        self.ctx.progress.reserve(1);
        let lines = sections::draw_section(&mut self.ctx.canvas, title, paragraphs)?;
        debug!(title, lines, page = self.current_page(), "section rendered");
        self.ctx.progress.report_step("section", title);
        self.ctx.yield_point().await?;
        Ok(())
    }

    /// Draws a table in chunks of `options.chunk_size` rows (falling back
    /// to the generator's chunk size). The header is drawn with the first
    /// chunk only.
    pub async fn add_progressive_table(
        &mut self,
        headers: &[String],
        rows: &[Vec<String>],
        options: &TableOptions,
    ) -> Result<TableReport> {
        self.ensure_open()?;
        let result = table::render_table(
            &mut self.ctx,
            headers,
            rows,
            options,
            self.options.chunk_size,
            self.options.adaptive_chunking,
        )
        .await;
        self.settle(result, DocumentState::TableAdded)
    }

    /// Lays images out in a grid. Images that fail to decode leave an empty
    /// slot and are listed in the report; they do not fail the call.
    pub async fn add_progressive_images(
        &mut self,
        images: &[ImageRef],
        options: &ImageGridOptions,
    ) -> Result<ImageGridReport> {
        self.ensure_open()?;
        let result = images::render_images(&mut self.ctx, images, options).await;
        self.settle(result, DocumentState::ImagesAdded)
    }

    /// Starts a new page unless the cursor already sits at the top of an
    /// empty one. Returns whether a page was added.
    pub async fn add_page_break(&mut self) -> Result<bool> {
        self.ensure_open()?;
        if let Err(err) = self.ctx.cancellation.check() {
            let state = self.state;
            return self.settle(Err(err), state);
        }
        if self.ctx.canvas.tracker().at_page_top() {
            return Ok(false);
        }
        self.ctx.canvas.new_page();
        Ok(true)
    }

    /// Plans the progress total from `spec`, then renders its header and
    /// blocks in order. Finalization is left to the caller.
    pub async fn build(&mut self, spec: &DocumentSpec) -> Result<BuildReport> {
        self.ensure_open()?;
        if let Err(err) = spec.validate() {
            let state = self.state;
            return self.settle(Err(err), state);
        }
        self.plan(spec);
        info!(
            blocks = spec.blocks.len(),
            steps = self.steps_total(),
            "building document"
        );

        let info = self.options.metadata.merged_with(&spec.metadata);
        apply_metadata(&mut self.ctx.canvas.document, &info);

        if let Some(header) = &spec.header {
            self.add_header(&header.title, header.subtitle.as_deref())
                .await?;
        }

        let mut report = BuildReport::default();
        for block in &spec.blocks {
            match block {
                Block::Section(section) => {
                    match &section.body {
                        SectionBody::Text(text) => self.add_section(&section.title, text).await?,
                        SectionBody::Lines(lines) => {
                            self.add_section_lines(&section.title, lines).await?
                        }
                    }
                    report.sections += 1;
                }
                Block::Table(table) => {
                    let table_report = self
                        .add_progressive_table(&table.headers, &table.rows, &table.options)
                        .await?;
                    report.tables.push(table_report);
                }
                Block::Images(set) => {
                    let grid = self
                        .add_progressive_images(&set.images, &set.options)
                        .await?;
                    report.image_grids.push(grid);
                }
                Block::PageBreak => {
                    if self.add_page_break().await? {
                        report.page_breaks += 1;
                    }
                }
            }
        }
        Ok(report)
    }

    /// Stamps footers and serializes. Leaves the state untouched so the
    /// caller decides between `Finalized` and `Failed`.
    fn render_output(&mut self) -> Result<Vec<u8>> {
        self.ctx.cancellation.check()?;
        self.ctx.progress.reserve(1);

        let geometry = self.ctx.canvas.geometry();
        let document = &mut self.ctx.canvas.document;
        if document.metadata().title.is_none() {
            if let Some(title) = &self.title {
                document.set_title(title.clone());
            }
        }
        let pages = self.footer.stamp(document, &geometry)?;

        let mut buffer = Vec::new();
        document.write(&mut buffer)?;
        debug!(pages, bytes = buffer.len(), "document serialized");
        Ok(buffer)
    }

    fn finish(&mut self, bytes: usize) {
        self.state = DocumentState::Finalized;
        let pages = self.page_count();
        self.ctx
            .progress
            .report_step("finalize", format!("Finalized {pages} page(s)"));
        let memory = self.ctx.monitor.stats();
        info!(
            pages,
            bytes,
            memory_checks = memory.checks,
            memory_pauses = memory.pauses,
            "document finalized"
        );
    }

    /// Writes the PDF to `path`.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.ensure_open()?;
        let path = path.as_ref();
        let result = self.render_output().and_then(|bytes| {
            std::fs::write(path, &bytes)?;
            Ok(bytes.len())
        });
        let written = self.settle(result, DocumentState::Finalized)?;
        self.finish(written);
        info!(path = %path.display(), "document saved");
        Ok(())
    }

    /// The PDF as raw bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.ensure_open()?;
        let result = self.render_output();
        let bytes = self.settle(result, DocumentState::Finalized)?;
        self.finish(bytes.len());
        Ok(bytes)
    }

    /// The PDF as a standard base64 string.
    pub fn to_base64(&mut self) -> Result<String> {
        self.to_bytes().map(|bytes| STANDARD.encode(bytes))
    }
}

fn apply_metadata(document: &mut Document, info: &DocumentInfo) {
    if let Some(title) = &info.title {
        document.set_title(title.clone());
    }
    if let Some(author) = &info.author {
        document.set_author(author.clone());
    }
    if let Some(subject) = &info.subject {
        document.set_subject(subject.clone());
    }
    if let Some(keywords) = &info.keywords {
        document.set_keywords(keywords.clone());
    }
}

/// Builds `spec` with `options` and returns the finished PDF bytes.
pub async fn render_document(spec: &DocumentSpec, options: GeneratorOptions) -> Result<Vec<u8>> {
    let mut document = ProgressiveDocument::new(options)?;
    document.build(spec).await?;
    document.to_bytes()
}
