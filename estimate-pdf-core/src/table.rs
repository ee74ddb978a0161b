//! Chunked table rendering.
//!
//! Rows are drawn in fixed-size chunks. The header is drawn once, with the
//! first chunk; the cursor, memory monitor and progress reporter are
//! updated after every chunk, and the renderer pauses between chunks so a
//! long line-item list never monopolises the runtime.

use crate::context::RenderContext;
use crate::error::{PdfError, Result};
use crate::graphics::Color;
use crate::layout::Canvas;
use crate::text::{Font, TextAlign};
use std::ops::Range;
use tracing::debug;

/// Chunks never shrink below this many rows under adaptive chunking.
pub const MIN_ADAPTIVE_CHUNK: usize = 10;

#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Rows per chunk. `None` uses the generator's default.
    pub chunk_size: Option<usize>,
    /// Halve the chunk size after a chunk that hit memory pressure. `None`
    /// uses the generator's setting.
    pub adaptive_chunking: Option<bool>,
    pub font: Font,
    pub font_size: f64,
    pub header_font: Font,
    pub text_color: Color,
    pub header_text_color: Color,
    pub header_fill: Option<Color>,
    /// Background for every other body row.
    pub stripe_fill: Option<Color>,
    pub border_color: Color,
    /// Zero disables cell borders.
    pub border_width: f64,
    pub cell_padding: f64,
    /// Wrapped cells are cut to this many lines, the last ending in `...`.
    pub max_wrap_lines: usize,
    /// Relative column weights. `None` sizes columns from their content.
    pub column_widths: Option<Vec<f64>>,
    /// Explicit per-column alignment. `None` infers it from the data.
    pub column_aligns: Option<Vec<TextAlign>>,
    /// Space left below the finished table.
    pub spacing_after: f64,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            chunk_size: None,
            adaptive_chunking: None,
            font: Font::Helvetica,
            font_size: 9.0,
            header_font: Font::HelveticaBold,
            text_color: Color::black(),
            header_text_color: Color::white(),
            header_fill: Some(Color::rgb8(46, 125, 50)),
            stripe_fill: Some(Color::gray(0.95)),
            border_color: Color::gray(0.75),
            border_width: 0.5,
            cell_padding: 4.0,
            max_wrap_lines: 2,
            column_widths: None,
            column_aligns: None,
            spacing_after: 12.0,
        }
    }
}

impl TableOptions {
    pub fn with_chunk_size(mut self, rows: usize) -> Self {
        self.chunk_size = Some(rows);
        self
    }

    pub fn with_adaptive_chunking(mut self, enabled: bool) -> Self {
        self.adaptive_chunking = Some(enabled);
        self
    }

    pub fn with_font(mut self, font: Font, size: f64) -> Self {
        self.font = font;
        self.header_font = font.bold();
        self.font_size = size;
        self
    }

    pub fn with_header_fill(mut self, fill: Option<Color>) -> Self {
        self.header_fill = fill;
        if fill.is_none() {
            self.header_text_color = self.text_color;
        }
        self
    }

    pub fn with_column_widths(mut self, weights: Vec<f64>) -> Self {
        self.column_widths = Some(weights);
        self
    }

    pub fn with_column_aligns(mut self, aligns: Vec<TextAlign>) -> Self {
        self.column_aligns = Some(aligns);
        self
    }

    pub fn with_max_wrap_lines(mut self, lines: usize) -> Self {
        self.max_wrap_lines = lines;
        self
    }
}

/// A table as data: header cells, rows and how to draw them.
#[derive(Debug, Clone, Default)]
pub struct TableSpec {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub options: TableOptions,
}

impl TableSpec {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows,
            options: TableOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    /// Number of columns; see [`validate_table`].
    pub fn validate(&self) -> Result<usize> {
        validate_table(&self.headers, &self.rows)
    }

    /// Chunks this table will be drawn in, before any adaptive shrinking.
    pub fn planned_chunks(&self, default_chunk_size: usize) -> usize {
        let size = self.options.chunk_size.unwrap_or(default_chunk_size);
        plan_chunks(self.rows.len(), size).len()
    }
}

/// Checks that every row has as many cells as the header, or as the first
/// row when there is no header. Returns the column count.
pub fn validate_table(headers: &[String], rows: &[Vec<String>]) -> Result<usize> {
    let expected = if headers.is_empty() {
        rows.first().map(Vec::len).unwrap_or(0)
    } else {
        headers.len()
    };

    for (row, cells) in rows.iter().enumerate() {
        if cells.len() != expected {
            return Err(PdfError::InvalidTable {
                row,
                expected,
                found: cells.len(),
            });
        }
    }
    if expected == 0 && !rows.is_empty() {
        return Err(PdfError::InvalidStructure(
            "table rows have no cells".to_string(),
        ));
    }
    Ok(expected)
}

/// Splits `row_count` rows into consecutive ranges of at most `chunk_size`.
/// An empty table still yields one (empty) chunk for its header.
pub fn plan_chunks(row_count: usize, chunk_size: usize) -> Vec<Range<usize>> {
    let size = chunk_size.max(1);
    if row_count == 0 {
        return vec![0..0];
    }
    (0..row_count)
        .step_by(size)
        .map(|start| start..(start + size).min(row_count))
        .collect()
}

/// Loose numeric check for money, quantities and percentages:
/// `$1,250.00`, `-3`, `(45.10)`, `12 %`, `€ 9,99`.
pub fn is_numeric_cell(cell: &str) -> bool {
    let trimmed = cell.trim();
    let unwrapped = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(trimmed);
    let stripped: String = unwrapped
        .trim_matches(|c: char| matches!(c, '$' | '€' | '£' | '%') || c.is_whitespace())
        .chars()
        .filter(|c| *c != ',' && *c != ' ' && *c != '\u{a0}')
        .collect();
    !stripped.is_empty()
        && stripped.chars().any(|c| c.is_ascii_digit())
        && stripped.parse::<f64>().is_ok()
}

/// Per-column alignment from the data: the first column is left-aligned,
/// numeric columns right-aligned, columns of single words centred and the
/// rest left-aligned.
pub fn infer_alignments(columns: usize, rows: &[Vec<String>]) -> Vec<TextAlign> {
    (0..columns)
        .map(|col| {
            if col == 0 {
                return TextAlign::Left;
            }
            let mut values = rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.trim())
                .filter(|cell| !cell.is_empty())
                .peekable();
            if values.peek().is_none() {
                return TextAlign::Left;
            }
            let values: Vec<&str> = values.collect();
            if values.iter().all(|v| is_numeric_cell(v)) {
                TextAlign::Right
            } else if values.iter().all(|v| !v.contains(char::is_whitespace)) {
                TextAlign::Center
            } else {
                TextAlign::Left
            }
        })
        .collect()
}

/// One rendered chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkReport {
    pub index: usize,
    /// Header cells drawn with this chunk; non-zero only for the first.
    pub header_cells: usize,
    pub rows: Range<usize>,
    pub first_page: usize,
    pub last_page: usize,
    pub memory_pressure: bool,
}

/// What [`render_table`] drew.
#[derive(Debug, Clone, PartialEq)]
pub struct TableReport {
    pub columns: usize,
    pub alignments: Vec<TextAlign>,
    pub chunks: Vec<ChunkReport>,
}

impl TableReport {
    pub fn rows_rendered(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.rows.len()).sum()
    }

    pub fn header_renders(&self) -> usize {
        self.chunks.iter().filter(|chunk| chunk.header_cells > 0).count()
    }

    pub fn first_page(&self) -> Option<usize> {
        self.chunks.first().map(|chunk| chunk.first_page)
    }

    pub fn last_page(&self) -> Option<usize> {
        self.chunks.last().map(|chunk| chunk.last_page)
    }
}

/// Resolved column geometry and styling for one table.
pub(crate) struct TableLayout {
    x: f64,
    widths: Vec<f64>,
    aligns: Vec<TextAlign>,
    options: TableOptions,
    line_height: f64,
}

impl TableLayout {
    pub(crate) fn new(
        canvas: &mut Canvas,
        headers: &[String],
        sample: &[Vec<String>],
        columns: usize,
        aligns: Vec<TextAlign>,
        options: &TableOptions,
    ) -> Self {
        let geometry = canvas.geometry();
        let available = geometry.content_width();
        let weights = match &options.column_widths {
            Some(weights) if weights.len() == columns && weights.iter().all(|w| *w > 0.0) => {
                weights.clone()
            }
            _ => natural_widths(canvas, headers, sample, columns, options, available),
        };
        let total: f64 = weights.iter().sum();
        let widths = if total > 0.0 {
            weights.iter().map(|w| w / total * available).collect()
        } else {
            vec![available / columns.max(1) as f64; columns]
        };

        Self {
            x: geometry.margins.left,
            widths,
            aligns,
            options: options.clone(),
            line_height: options.font_size * 1.2,
        }
    }

    fn wrap_row(&self, canvas: &mut Canvas, cells: &[String], font: Font) -> Vec<Vec<String>> {
        let padding = self.options.cell_padding;
        cells
            .iter()
            .zip(&self.widths)
            .map(|(cell, width)| {
                canvas.cache().wrap(
                    cell,
                    font,
                    self.options.font_size,
                    (width - 2.0 * padding).max(1.0),
                    self.options.max_wrap_lines,
                )
            })
            .collect()
    }

    fn row_height(&self, wrapped: &[Vec<String>]) -> f64 {
        let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
        lines as f64 * self.line_height + 2.0 * self.options.cell_padding
    }

    /// Draws the header (when given) and `rows`, breaking pages as needed.
    /// Returns the first and last page touched.
    pub(crate) fn render_chunk(
        &self,
        canvas: &mut Canvas,
        header: &[String],
        rows: &[Vec<String>],
        row_offset: usize,
    ) -> Result<(usize, usize)> {
        let mut first_page = None;

        if !header.is_empty() {
            let font = self.options.header_font;
            let wrapped = self.wrap_row(canvas, header, font);
            let height = self.row_height(&wrapped);
            // keep the header with the first body row
            let follow = match rows.first() {
                Some(row) => {
                    let body = self.wrap_row(canvas, row, self.options.font);
                    self.row_height(&body)
                }
                None => 0.0,
            };
            canvas.ensure_space(height + follow);
            first_page.get_or_insert(canvas.tracker().current_page());
            let style = RowStyle {
                font,
                color: self.options.header_text_color,
                fill: self.options.header_fill,
                aligns: None,
            };
            self.draw_row(canvas, &wrapped, height, &style)?;
        }

        for (i, row) in rows.iter().enumerate() {
            let wrapped = self.wrap_row(canvas, row, self.options.font);
            let height = self.row_height(&wrapped);
            canvas.ensure_space(height);
            first_page.get_or_insert(canvas.tracker().current_page());

            let striped = (row_offset + i) % 2 == 1;
            let style = RowStyle {
                font: self.options.font,
                color: self.options.text_color,
                fill: if striped { self.options.stripe_fill } else { None },
                aligns: Some(self.aligns.as_slice()),
            };
            self.draw_row(canvas, &wrapped, height, &style)?;
        }

        let last_page = canvas.tracker().current_page();
        Ok((first_page.unwrap_or(last_page), last_page))
    }

    fn draw_row(
        &self,
        canvas: &mut Canvas,
        cells: &[Vec<String>],
        height: f64,
        style: &RowStyle<'_>,
    ) -> Result<()> {
        let top = canvas.tracker().current_y();
        let bottom_pdf = canvas.tracker().to_pdf_y(top + height);
        let total_width: f64 = self.widths.iter().sum();
        let padding = self.options.cell_padding;
        let size = self.options.font_size;

        if let Some(fill) = style.fill {
            canvas
                .page()?
                .graphics()
                .set_fill_color(fill)
                .rect(self.x, bottom_pdf, total_width, height)
                .fill();
        }

        let mut x = self.x;
        for (col, (lines, width)) in cells.iter().zip(&self.widths).enumerate() {
            if self.options.border_width > 0.0 {
                canvas
                    .page()?
                    .graphics()
                    .set_line_width(self.options.border_width)
                    .set_stroke_color(self.options.border_color)
                    .rect(x, bottom_pdf, *width, height)
                    .stroke();
            }

            let align = match style.aligns {
                Some(aligns) => aligns.get(col).copied().unwrap_or_default(),
                None => TextAlign::Center,
            };
            for (n, line) in lines.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let text_width = canvas.cache().measure(line, style.font, size);
                let text_x = align.place(x + padding, width - 2.0 * padding, text_width);
                let baseline = top + padding + size * 0.85 + n as f64 * self.line_height;
                canvas.text_at(text_x, baseline, style.font, size, style.color, line)?;
            }
            x += width;
        }

        canvas.tracker.advance(height);
        Ok(())
    }
}

struct RowStyle<'a> {
    font: Font,
    color: Color,
    fill: Option<Color>,
    aligns: Option<&'a [TextAlign]>,
}

fn natural_widths(
    canvas: &mut Canvas,
    headers: &[String],
    sample: &[Vec<String>],
    columns: usize,
    options: &TableOptions,
    available: f64,
) -> Vec<f64> {
    let cap = available * 0.6;
    let floor = 30.0_f64.min(available / columns.max(1) as f64);
    (0..columns)
        .map(|col| {
            let header = headers
                .get(col)
                .map(|h| canvas.cache().measure(h, options.header_font, options.font_size))
                .unwrap_or(0.0);
            let body = sample
                .iter()
                .filter_map(|row| row.get(col))
                .map(|cell| canvas.cache().measure(cell, options.font, options.font_size))
                .fold(0.0, f64::max);
            (header.max(body) + 2.0 * options.cell_padding).clamp(floor, cap.max(floor))
        })
        .collect()
}

/// Draws `rows` under `headers` in chunks, yielding between them.
///
/// Emits one progress step per chunk. Returns a report of what went where.
pub(crate) async fn render_table(
    ctx: &mut RenderContext,
    headers: &[String],
    rows: &[Vec<String>],
    options: &TableOptions,
    default_chunk_size: usize,
    default_adaptive: bool,
) -> Result<TableReport> {
    let columns = validate_table(headers, rows)?;
    let mut chunk_size = options.chunk_size.unwrap_or(default_chunk_size);
    if chunk_size == 0 {
        return Err(PdfError::InvalidConfiguration(
            "chunk size must be at least 1".to_string(),
        ));
    }
    let adaptive = options.adaptive_chunking.unwrap_or(default_adaptive);

    let alignments = match &options.column_aligns {
        Some(aligns) if aligns.len() == columns => aligns.clone(),
        Some(aligns) => {
            return Err(PdfError::InvalidConfiguration(format!(
                "{} column alignments given for {columns} columns",
                aligns.len()
            )))
        }
        None => infer_alignments(columns, rows),
    };

    let mut expected_chunks = plan_chunks(rows.len(), chunk_size).len();
    ctx.progress.reserve(expected_chunks);

    let sample = &rows[..rows.len().min(chunk_size)];
    let layout = TableLayout::new(
        &mut ctx.canvas,
        headers,
        sample,
        columns,
        alignments.clone(),
        options,
    );

    let mut chunks = Vec::with_capacity(expected_chunks);
    let mut start = 0;
    loop {
        ctx.cancellation.check()?;
        let index = chunks.len();
        let end = (start + chunk_size).min(rows.len());
        let header: &[String] = if index == 0 { headers } else { &[] };

        let (first_page, last_page) =
            layout.render_chunk(&mut ctx.canvas, header, &rows[start..end], start)?;
        let pressure = ctx.yield_point().await?;

        let message = if rows.is_empty() {
            "Table header".to_string()
        } else {
            format!("Rows {}-{} of {}", start + 1, end, rows.len())
        };
        debug!(
            chunk = index,
            rows = end - start,
            first_page,
            last_page,
            memory_pressure = pressure,
            "table chunk rendered"
        );
        ctx.progress.report_step("table", message);
        chunks.push(ChunkReport {
            index,
            header_cells: header.len(),
            rows: start..end,
            first_page,
            last_page,
            memory_pressure: pressure,
        });

        start = end;
        if start >= rows.len() {
            break;
        }

        if adaptive && pressure && chunk_size > MIN_ADAPTIVE_CHUNK {
            chunk_size = (chunk_size / 2).max(MIN_ADAPTIVE_CHUNK);
            let remaining = plan_chunks(rows.len() - start, chunk_size).len();
            let reserved_left = expected_chunks.saturating_sub(chunks.len());
            if remaining > reserved_left {
                ctx.progress.reserve(remaining - reserved_left);
                expected_chunks += remaining - reserved_left;
            }
            debug!(chunk_size, "memory pressure, shrinking table chunks");
        }
        ctx.pause().await?;
    }

    ctx.canvas.tracker.advance(options.spacing_after);

    Ok(TableReport {
        columns,
        alignments,
        chunks,
    })
}
