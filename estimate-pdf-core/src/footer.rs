//! Per-page footers stamped once the page count is final.

use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::graphics::Color;
use crate::layout::PageGeometry;
use crate::text::{measure_text, Font};
use chrono::format::{Item, StrftimeItems};
use chrono::{Local, NaiveDate};
use std::fmt::Write;

#[derive(Debug, Clone)]
pub struct FooterOptions {
    pub font: Font,
    pub font_size: f64,
    pub color: Color,
    /// Word before the page counter, as in `Page 2 / 5`.
    pub label: String,
    /// strftime pattern for the generation date.
    pub date_format: String,
    pub date: NaiveDate,
}

impl Default for FooterOptions {
    fn default() -> Self {
        Self {
            font: Font::Helvetica,
            font_size: 8.0,
            color: Color::gray(0.4),
            label: "Page".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            date: Local::now().date_naive(),
        }
    }
}

/// Rejects strftime patterns chrono cannot render.
pub fn validate_date_format(format: &str) -> Result<()> {
    if format.is_empty() || StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(PdfError::InvalidConfiguration(format!(
            "invalid date format '{format}'"
        )));
    }
    Ok(())
}

/// Draws the generation date on the left and `<label> N / total` on the
/// right of every page, centred vertically in the bottom margin.
#[derive(Debug, Clone)]
pub struct Footer {
    options: FooterOptions,
}

impl Footer {
    pub fn new(options: FooterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FooterOptions {
        &self.options
    }

    pub fn page_label(&self, page: usize, total: usize) -> String {
        format!("{} {page} / {total}", self.options.label)
    }

    pub fn date_text(&self) -> Result<String> {
        let mut text = String::new();
        write!(text, "{}", self.options.date.format(&self.options.date_format)).map_err(|_| {
            PdfError::InvalidConfiguration(format!(
                "invalid date format '{}'",
                self.options.date_format
            ))
        })?;
        Ok(text)
    }

    /// Footer baseline above the bottom edge: the middle of the bottom
    /// margin, but never so low that the text leaves the page.
    pub fn baseline(&self, geometry: &PageGeometry) -> f64 {
        (geometry.margins.bottom / 2.0).max(self.options.font_size)
    }

    /// Stamps every page of `document`. Returns the number of pages stamped.
    pub fn stamp(&self, document: &mut Document, geometry: &PageGeometry) -> Result<usize> {
        let total = document.page_count();
        let date = self.date_text()?;
        let FooterOptions {
            font,
            font_size,
            color,
            ..
        } = self.options;
        let y = self.baseline(geometry);
        let right_edge = geometry.width - geometry.margins.right;

        for (index, page) in document.pages_mut().enumerate() {
            let label = self.page_label(index + 1, total);
            let label_x = right_edge - measure_text(&label, font, font_size);

            page.text()
                .set_font(font, font_size)
                .set_fill_color(color)
                .at(geometry.margins.left, y)
                .write(&date);
            page.text().at(label_x, y).write(&label);
        }
        Ok(total)
    }
}
