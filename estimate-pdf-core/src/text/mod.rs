pub mod cache;
mod encoding;
mod font;
mod metrics;

pub use cache::{CacheStats, LayoutCache};
pub use encoding::{encode_win_ansi, literal_string};
pub use font::Font;
pub use metrics::{measure_char, measure_text, split_into_words, truncate_lines, wrap_text};

use crate::graphics::Color;
use std::collections::BTreeSet;

/// Horizontal alignment of a text run relative to its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// X position of a run of `text_width` inside `[x, x + box_width]`.
    pub fn place(&self, x: f64, box_width: f64, text_width: f64) -> f64 {
        match self {
            TextAlign::Left => x,
            TextAlign::Center => x + (box_width - text_width) / 2.0,
            TextAlign::Right => x + box_width - text_width,
        }
    }
}

/// Accumulates text-showing operators for one page.
#[derive(Debug, Clone)]
pub struct TextContext {
    operations: String,
    current_font: Font,
    font_size: f64,
    fill_color: Color,
    position: (f64, f64),
    used_fonts: BTreeSet<Font>,
}

impl Default for TextContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TextContext {
    pub fn new() -> Self {
        Self {
            operations: String::new(),
            current_font: Font::Helvetica,
            font_size: 12.0,
            fill_color: Color::black(),
            position: (0.0, 0.0),
            used_fonts: BTreeSet::new(),
        }
    }

    pub fn set_font(&mut self, font: Font, size: f64) -> &mut Self {
        self.current_font = font;
        self.font_size = size;
        self
    }

    pub fn set_fill_color(&mut self, color: Color) -> &mut Self {
        self.fill_color = color;
        self
    }

    pub fn at(&mut self, x: f64, y: f64) -> &mut Self {
        self.position = (x, y);
        self
    }

    pub fn font(&self) -> Font {
        self.current_font
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    /// Shows `text` at the current position as a self-contained `BT`/`ET`
    /// block.
    pub fn write(&mut self, text: &str) -> &mut Self {
        self.used_fonts.insert(self.current_font);

        self.operations.push_str("BT\n");
        self.operations.push_str(&self.fill_color.fill_operator());
        self.operations.push_str(&format!(
            "/{} {:.2} Tf\n",
            self.current_font.pdf_name(),
            self.font_size
        ));
        self.operations
            .push_str(&format!("{:.2} {:.2} Td\n", self.position.0, self.position.1));
        self.operations.push_str(&literal_string(text));
        self.operations.push_str(" Tj\nET\n");
        self
    }

    /// Writes `text` and moves the position one line down (1.2 × size).
    pub fn write_line(&mut self, text: &str) -> &mut Self {
        self.write(text);
        self.position.1 -= self.font_size * 1.2;
        self
    }

    pub fn used_fonts(&self) -> &BTreeSet<Font> {
        &self.used_fonts
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub(crate) fn generate_operations(&self) -> Vec<u8> {
        self.operations.as_bytes().to_vec()
    }
}
