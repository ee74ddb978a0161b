//! Page geometry, the vertical cursor and page-break decisions.
//!
//! Layout works top-down: the cursor's `y` is the distance from the top
//! edge of the page, in points. Conversion to PDF's bottom-up coordinates
//! happens only when something is drawn.

use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::graphics::Color;
use crate::page::{Margins, Page};
use crate::text::{Font, LayoutCache};
use std::str::FromStr;
use tracing::debug;

/// User unit for sizes and margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    Pt,
    #[default]
    Mm,
    Cm,
    In,
}

impl Unit {
    pub fn to_points(&self, value: f64) -> f64 {
        match self {
            Unit::Pt => value,
            Unit::Mm => value * 72.0 / 25.4,
            Unit::Cm => value * 72.0 / 2.54,
            Unit::In => value * 72.0,
        }
    }
}

impl FromStr for Unit {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pt" => Ok(Unit::Pt),
            "mm" => Ok(Unit::Mm),
            "cm" => Ok(Unit::Cm),
            "in" => Ok(Unit::In),
            other => Err(PdfError::InvalidConfiguration(format!(
                "unknown unit '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl FromStr for Orientation {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "portrait" | "p" => Ok(Orientation::Portrait),
            "landscape" | "l" => Ok(Orientation::Landscape),
            other => Err(PdfError::InvalidConfiguration(format!(
                "unknown orientation '{other}'"
            ))),
        }
    }
}

/// Paper size. `Custom` is width and height in points, portrait.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageFormat {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Custom(f64, f64),
}

impl PageFormat {
    /// Portrait width and height in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageFormat::A3 => (841.89, 1190.55),
            PageFormat::A4 => (595.28, 841.89),
            PageFormat::A5 => (419.53, 595.28),
            PageFormat::Letter => (612.0, 792.0),
            PageFormat::Legal => (612.0, 1008.0),
            PageFormat::Custom(width, height) => (*width, *height),
        }
    }
}

impl FromStr for PageFormat {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "a3" => Ok(PageFormat::A3),
            "a4" => Ok(PageFormat::A4),
            "a5" => Ok(PageFormat::A5),
            "letter" => Ok(PageFormat::Letter),
            "legal" => Ok(PageFormat::Legal),
            other => Err(PdfError::InvalidConfiguration(format!(
                "unknown page format '{other}'"
            ))),
        }
    }
}

/// Resolved page size and margins, all in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
}

impl PageGeometry {
    pub fn new(format: PageFormat, orientation: Orientation, margins: Margins) -> Self {
        let (w, h) = format.dimensions();
        let (width, height) = match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        };
        Self {
            width,
            height,
            margins,
        }
    }

    pub fn content_width(&self) -> f64 {
        self.width - self.margins.left - self.margins.right
    }

    pub fn content_height(&self) -> f64 {
        self.height - self.margins.top - self.margins.bottom
    }

    /// Lowest `y` content may reach.
    pub fn bottom_limit(&self) -> f64 {
        self.height - self.margins.bottom
    }

    pub fn validate(&self) -> Result<()> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(PdfError::InvalidConfiguration(
                "page size must be positive".to_string(),
            ));
        }
        let m = self.margins;
        if [m.left, m.right, m.top, m.bottom].iter().any(|v| *v < 0.0) {
            return Err(PdfError::InvalidConfiguration(
                "margins must not be negative".to_string(),
            ));
        }
        if self.content_width() <= 0.0 || self.content_height() <= 0.0 {
            return Err(PdfError::InvalidConfiguration(
                "margins leave no room for content".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::new(PageFormat::A4, Orientation::Portrait, Margins::uniform(40.0))
    }
}

/// Current page (1-based) and distance from the top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub page: usize,
    pub y: f64,
}

/// Tracks the cursor and decides when content must move to a new page.
#[derive(Debug, Clone)]
pub struct LayoutTracker {
    geometry: PageGeometry,
    cursor: Cursor,
}

impl LayoutTracker {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            cursor: Cursor {
                page: 1,
                y: geometry.margins.top,
            },
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn current_page(&self) -> usize {
        self.cursor.page
    }

    pub fn current_y(&self) -> f64 {
        self.cursor.y
    }

    /// True when nothing has been placed on the current page yet.
    pub fn at_page_top(&self) -> bool {
        (self.cursor.y - self.geometry.margins.top).abs() < 1e-6
    }

    /// Whether a block of `required_height` would cross the bottom margin.
    ///
    /// A block taller than the whole content area still returns `false` at
    /// the top of a fresh page, so it is placed there and overflows instead
    /// of producing an endless run of empty pages.
    pub fn needs_new_page(&self, required_height: f64) -> bool {
        if self.at_page_top() {
            return false;
        }
        self.cursor.y + required_height > self.geometry.bottom_limit()
    }

    pub fn advance_page(&mut self) {
        self.cursor.page += 1;
        self.cursor.y = self.geometry.margins.top;
    }

    pub fn advance(&mut self, dy: f64) {
        self.cursor.y += dy;
    }

    pub fn remaining_height(&self) -> f64 {
        (self.geometry.bottom_limit() - self.cursor.y).max(0.0)
    }

    /// Converts a top-down offset into a PDF y coordinate.
    pub fn to_pdf_y(&self, y_from_top: f64) -> f64 {
        self.geometry.height - y_from_top
    }
}

/// The drawing surface the renderers share: the document being built, the
/// layout cursor over it and the text layout cache.
///
/// The document always holds exactly `tracker.current_page()` pages.
pub struct Canvas {
    pub(crate) document: Document,
    pub(crate) tracker: LayoutTracker,
    pub(crate) cache: LayoutCache,
}

impl Canvas {
    pub fn new(geometry: PageGeometry, mut document: Document) -> Self {
        document.add_page(Page::new(geometry.width, geometry.height));
        Self {
            document,
            tracker: LayoutTracker::new(geometry),
            cache: LayoutCache::default(),
        }
    }

    pub fn geometry(&self) -> PageGeometry {
        *self.tracker.geometry()
    }

    pub fn tracker(&self) -> &LayoutTracker {
        &self.tracker
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn cache(&mut self) -> &mut LayoutCache {
        &mut self.cache
    }

    /// The page under the cursor.
    pub fn page(&mut self) -> Result<&mut Page> {
        let index = self.tracker.current_page() - 1;
        self.document.page_mut(index).ok_or_else(|| {
            PdfError::InvalidStructure(format!("page {} was never started", index + 1))
        })
    }

    /// Starts a new page and moves the cursor to its top margin.
    pub fn new_page(&mut self) {
        self.tracker.advance_page();
        let geometry = self.geometry();
        self.document
            .add_page(Page::new(geometry.width, geometry.height));
        debug!(page = self.tracker.current_page(), "started new page");
    }

    /// Breaks to a new page if `required_height` does not fit. Returns
    /// whether a break happened.
    pub fn ensure_space(&mut self, required_height: f64) -> bool {
        if self.tracker.needs_new_page(required_height) {
            self.new_page();
            true
        } else {
            false
        }
    }

    /// Writes one line of text with its baseline `baseline` points below the
    /// top edge.
    pub fn text_at(
        &mut self,
        x: f64,
        baseline: f64,
        font: Font,
        size: f64,
        color: Color,
        text: &str,
    ) -> Result<()> {
        let y = self.tracker.to_pdf_y(baseline);
        self.page()?
            .text()
            .set_font(font, size)
            .set_fill_color(color)
            .at(x, y)
            .write(text);
        Ok(())
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}
