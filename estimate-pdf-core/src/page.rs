use crate::error::{PdfError, Result};
use crate::graphics::{GraphicsContext, Image};
use crate::text::{Font, TextContext};
use std::collections::{BTreeMap, BTreeSet};

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(72.0)
    }
}

impl Margins {
    pub fn uniform(value: f64) -> Self {
        Self {
            left: value,
            right: value,
            top: value,
            bottom: value,
        }
    }
}

/// A single page: a size, two operator buffers and the images it paints.
///
/// Graphics are emitted before text so fills such as table header shading
/// sit underneath the labels drawn on them.
#[derive(Debug, Clone)]
pub struct Page {
    width: f64,
    height: f64,
    graphics: GraphicsContext,
    text: TextContext,
    images: BTreeMap<String, Image>,
}

impl Page {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            graphics: GraphicsContext::new(),
            text: TextContext::new(),
            images: BTreeMap::new(),
        }
    }

    pub fn a4() -> Self {
        Self::new(595.0, 842.0)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn graphics(&mut self) -> &mut GraphicsContext {
        &mut self.graphics
    }

    pub fn text(&mut self) -> &mut TextContext {
        &mut self.text
    }

    /// Registers `image` under a fresh resource name and returns the name.
    pub fn add_image(&mut self, image: Image) -> String {
        let name = format!("Im{}", self.images.len() + 1);
        self.images.insert(name.clone(), image);
        name
    }

    pub fn draw_image(&mut self, name: &str, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        if !self.images.contains_key(name) {
            return Err(PdfError::InvalidStructure(format!(
                "image '{name}' is not registered on this page"
            )));
        }
        self.graphics.draw_image(name, x, y, width, height);
        Ok(())
    }

    pub(crate) fn images(&self) -> &BTreeMap<String, Image> {
        &self.images
    }

    pub fn fonts_in_use(&self) -> &BTreeSet<Font> {
        self.text.used_fonts()
    }

    pub(crate) fn generate_content(&self) -> Vec<u8> {
        let mut content = self.graphics.generate_operations();
        content.extend_from_slice(&self.text.generate_operations());
        content
    }
}
