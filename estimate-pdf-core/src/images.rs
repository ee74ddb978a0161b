//! Image grids with per-image fault isolation.

use crate::context::RenderContext;
use crate::error::{PdfError, Result};
use crate::graphics::{Color, Image};
use crate::text::Font;
use tracing::{debug, warn};

/// An encoded image to place in a grid.
#[derive(Debug, Clone, Default)]
pub struct ImageRef {
    pub data: Vec<u8>,
    /// Display width in points; defaults to the grid slot width.
    pub width: Option<f64>,
    /// Display height in points; defaults to the grid row height.
    pub height: Option<f64>,
    pub caption: Option<String>,
}

impl ImageRef {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Grid layout, all lengths in points.
#[derive(Debug, Clone)]
pub struct ImageGridOptions {
    pub images_per_row: usize,
    /// Slot width. `None` splits the content width evenly.
    pub image_width: Option<f64>,
    pub image_height: f64,
    /// Gap between slots, horizontally and vertically.
    pub spacing: f64,
    /// Pause after every this many images; 0 never pauses.
    pub pause_every: usize,
    pub caption_font: Font,
    pub caption_font_size: f64,
    pub caption_color: Color,
}

impl Default for ImageGridOptions {
    fn default() -> Self {
        Self {
            images_per_row: 2,
            image_width: None,
            image_height: 150.0,
            spacing: 10.0,
            pause_every: 5,
            caption_font: Font::HelveticaOblique,
            caption_font_size: 8.0,
            caption_color: Color::gray(0.3),
        }
    }
}

impl ImageGridOptions {
    pub fn with_images_per_row(mut self, per_row: usize) -> Self {
        self.images_per_row = per_row;
        self
    }

    pub fn with_image_size(mut self, width: Option<f64>, height: f64) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_pause_every(mut self, images: usize) -> Self {
        self.pause_every = images;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.images_per_row == 0 {
            return Err(PdfError::InvalidConfiguration(
                "images per row must be at least 1".to_string(),
            ));
        }
        if self.image_height <= 0.0 || self.image_width.is_some_and(|w| w <= 0.0) {
            return Err(PdfError::InvalidConfiguration(
                "image size must be positive".to_string(),
            ));
        }
        if self.spacing < 0.0 {
            return Err(PdfError::InvalidConfiguration(
                "image spacing must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Validates the options against the available content width and
    /// returns the slot width. Every slot of a full row must lie inside the
    /// margins.
    pub fn slot_width(&self, content_width: f64) -> Result<f64> {
        self.validate()?;
        let per_row = self.images_per_row as f64;
        let gaps = self.spacing * (per_row - 1.0);
        let slot_width = self
            .image_width
            .unwrap_or((content_width - gaps) / per_row);
        if slot_width <= 0.0 {
            return Err(PdfError::InvalidConfiguration(format!(
                "{} images per row with {} pt spacing leave no room in {content_width:.2} pt",
                self.images_per_row, self.spacing
            )));
        }
        let row_width = slot_width * per_row + gaps;
        if row_width > content_width + 1e-6 {
            return Err(PdfError::InvalidConfiguration(format!(
                "image row is {row_width:.2} pt wide but only {content_width:.2} pt fit"
            )));
        }
        Ok(slot_width)
    }
}

/// Row-major `(row, column)` of the `index`th image.
pub fn grid_slot(index: usize, per_row: usize) -> (usize, usize) {
    let per_row = per_row.max(1);
    (index / per_row, index % per_row)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageSlot {
    pub index: usize,
    pub page: usize,
    pub row: usize,
    pub column: usize,
    pub placed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedImage {
    pub index: usize,
    pub reason: String,
}

/// What [`render_images`] did with each image.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageGridReport {
    pub placed: Vec<usize>,
    pub skipped: Vec<SkippedImage>,
    pub slots: Vec<ImageSlot>,
    pub rows: usize,
}

/// Draws `images` in a grid. An image that cannot be decoded is logged,
/// recorded in the report and left as an empty slot; it never fails the
/// call. One progress step per image.
pub(crate) async fn render_images(
    ctx: &mut RenderContext,
    images: &[ImageRef],
    options: &ImageGridOptions,
) -> Result<ImageGridReport> {
    let geometry = ctx.canvas.geometry();
    let slot_width = options.slot_width(geometry.content_width())?;
    let per_row = options.images_per_row;
    ctx.progress.reserve(images.len());

    let caption_band = if images.iter().any(|image| image.caption.is_some()) {
        options.caption_font_size * 1.8
    } else {
        0.0
    };
    let row_height = options.image_height + caption_band;

    let mut report = ImageGridReport::default();
    for (index, image_ref) in images.iter().enumerate() {
        ctx.cancellation.check()?;
        let (row, column) = grid_slot(index, per_row);
        if column == 0 {
            if index > 0 {
                ctx.canvas.tracker.advance(row_height + options.spacing);
            }
            ctx.canvas.ensure_space(row_height);
            report.rows += 1;
        }

        let top = ctx.canvas.tracker().current_y();
        let slot_x = geometry.margins.left + column as f64 * (slot_width + options.spacing);
        let placed = match Image::from_bytes(&image_ref.data) {
            Ok(image) => {
                let box_width = image_ref.width.unwrap_or(slot_width).min(slot_width);
                let box_height = image_ref
                    .height
                    .unwrap_or(options.image_height)
                    .min(options.image_height);
                let (width, height) = fit(image.aspect_ratio(), box_width, box_height);
                let x = slot_x + (slot_width - width) / 2.0;
                let y = ctx.canvas.tracker().to_pdf_y(top + height);

                let page = ctx.canvas.page()?;
                let name = page.add_image(image);
                page.draw_image(&name, x, y, width, height)?;

                if let Some(caption) = &image_ref.caption {
                    let size = options.caption_font_size;
                    let caption_width = ctx.canvas.cache().measure(caption, options.caption_font, size);
                    let caption_x = slot_x + (slot_width - caption_width) / 2.0;
                    ctx.canvas.text_at(
                        caption_x,
                        top + options.image_height + size * 1.2,
                        options.caption_font,
                        size,
                        options.caption_color,
                        caption,
                    )?;
                }
                report.placed.push(index);
                true
            }
            Err(error) => {
                warn!(index, error = %error, "skipping image that could not be decoded");
                report.skipped.push(SkippedImage {
                    index,
                    reason: error.to_string(),
                });
                false
            }
        };
        report.slots.push(ImageSlot {
            index,
            page: ctx.canvas.tracker().current_page(),
            row,
            column,
            placed,
        });

        ctx.progress
            .report_step("image", format!("Image {} of {}", index + 1, images.len()));

        let done = index + 1;
        if options.pause_every > 0 && done % options.pause_every == 0 && done < images.len() {
            debug!(done, "pausing after image batch");
            ctx.yield_point().await?;
            ctx.pause().await?;
        }
    }

    if !images.is_empty() {
        ctx.canvas.tracker.advance(row_height + options.spacing);
    }
    Ok(report)
}

/// Largest box with the image's aspect ratio (height / width) that fits in
/// `max_width` × `max_height`.
fn fit(aspect: f64, max_width: f64, max_height: f64) -> (f64, f64) {
    if !aspect.is_finite() || aspect <= 0.0 {
        return (max_width, max_height);
    }
    let height = max_width * aspect;
    if height <= max_height {
        (max_width, height)
    } else {
        (max_height / aspect, max_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_slot() {
        assert_eq!(grid_slot(0, 2), (0, 0));
        assert_eq!(grid_slot(1, 2), (0, 1));
        assert_eq!(grid_slot(2, 2), (1, 0));
        assert_eq!(grid_slot(7, 3), (2, 1));
        assert_eq!(grid_slot(3, 0), (3, 0));
    }

    #[test]
    fn test_fit_preserves_aspect() {
        // wide image limited by width
        assert_eq!(fit(0.5, 200.0, 150.0), (200.0, 100.0));
        // tall image limited by height
        assert_eq!(fit(2.0, 200.0, 150.0), (75.0, 150.0));
        assert_eq!(fit(f64::NAN, 10.0, 20.0), (10.0, 20.0));
    }

    #[test]
    fn test_options_validation() {
        assert!(ImageGridOptions::default().validate().is_ok());
        assert!(ImageGridOptions::default()
            .with_images_per_row(0)
            .validate()
            .is_err());
        assert!(ImageGridOptions::default()
            .with_image_size(Some(-1.0), 100.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_slot_width_fills_content_width() {
        let options = ImageGridOptions::default().with_images_per_row(3);
        let slot = options.slot_width(500.0).unwrap();
        assert!((slot * 3.0 + options.spacing * 2.0 - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_slot_width_rejects_spacing_wider_than_page() {
        let options = ImageGridOptions::default().with_images_per_row(60);
        assert!(matches!(
            options.slot_width(510.0),
            Err(PdfError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_slot_width_rejects_row_past_right_margin() {
        let options = ImageGridOptions::default()
            .with_images_per_row(3)
            .with_image_size(Some(300.0), 100.0);
        assert!(matches!(
            options.slot_width(510.0),
            Err(PdfError::InvalidConfiguration(_))
        ));
        let options = options.with_images_per_row(1);
        assert_eq!(options.slot_width(510.0).unwrap(), 300.0);
    }

    #[test]
    fn test_image_ref_builders() {
        let image = ImageRef::new(vec![1, 2])
            .with_caption("Front garden")
            .with_size(100.0, 80.0);
        assert_eq!(image.caption.as_deref(), Some("Front garden"));
        assert_eq!((image.width, image.height), (Some(100.0), Some(80.0)));
    }
}
