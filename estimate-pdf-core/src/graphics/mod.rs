mod color;
mod image;

pub use color::Color;
pub use image::{ColorSpace as ImageColorSpace, Image, ImageFormat};

/// Accumulates path and image painting operators for one page.
#[derive(Debug, Clone)]
pub struct GraphicsContext {
    operations: String,
    fill_color: Color,
    stroke_color: Color,
    line_width: f64,
}

impl Default for GraphicsContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsContext {
    pub fn new() -> Self {
        Self {
            operations: String::new(),
            fill_color: Color::black(),
            stroke_color: Color::black(),
            line_width: 1.0,
        }
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.operations.push_str(&format!("{x:.2} {y:.2} m\n"));
        self
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.operations.push_str(&format!("{x:.2} {y:.2} l\n"));
        self
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.operations
            .push_str(&format!("{x:.2} {y:.2} {width:.2} {height:.2} re\n"));
        self
    }

    pub fn stroke(&mut self) -> &mut Self {
        self.operations.push_str(&self.stroke_color.stroke_operator());
        self.operations.push_str("S\n");
        self
    }

    pub fn fill(&mut self) -> &mut Self {
        self.operations.push_str(&self.fill_color.fill_operator());
        self.operations.push_str("f\n");
        self
    }

    pub fn fill_stroke(&mut self) -> &mut Self {
        self.operations.push_str(&self.fill_color.fill_operator());
        self.operations.push_str(&self.stroke_color.stroke_operator());
        self.operations.push_str("B\n");
        self
    }

    pub fn set_fill_color(&mut self, color: Color) -> &mut Self {
        self.fill_color = color;
        self
    }

    pub fn set_stroke_color(&mut self, color: Color) -> &mut Self {
        self.stroke_color = color;
        self
    }

    pub fn set_line_width(&mut self, width: f64) -> &mut Self {
        if (width - self.line_width).abs() > f64::EPSILON || self.operations.is_empty() {
            self.operations.push_str(&format!("{width:.2} w\n"));
        }
        self.line_width = width;
        self
    }

    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    pub fn save_state(&mut self) -> &mut Self {
        self.operations.push_str("q\n");
        self
    }

    pub fn restore_state(&mut self) -> &mut Self {
        self.operations.push_str("Q\n");
        self
    }

    /// Paints the named image XObject into the given box.
    pub fn draw_image(
        &mut self,
        image_name: &str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> &mut Self {
        self.save_state();
        self.operations.push_str(&format!(
            "{width:.2} 0 0 {height:.2} {x:.2} {y:.2} cm\n/{image_name} Do\n"
        ));
        self.restore_state()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub(crate) fn generate_operations(&self) -> Vec<u8> {
        self.operations.as_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(ctx: &GraphicsContext) -> String {
        String::from_utf8(ctx.generate_operations()).unwrap()
    }

    #[test]
    fn test_path_operators() {
        let mut ctx = GraphicsContext::new();
        ctx.move_to(10.0, 20.0).line_to(110.0, 20.0).stroke();
        assert_eq!(ops(&ctx), "10.00 20.00 m\n110.00 20.00 l\n0.000 G\nS\n");
    }

    #[test]
    fn test_filled_rect() {
        let mut ctx = GraphicsContext::new();
        ctx.set_fill_color(Color::gray(0.9))
            .rect(0.0, 0.0, 50.0, 10.0)
            .fill();
        let out = ops(&ctx);
        assert!(out.contains("0.00 0.00 50.00 10.00 re\n"));
        assert!(out.contains("0.900 g\nf\n"));
    }

    #[test]
    fn test_line_width_only_emitted_on_change() {
        let mut ctx = GraphicsContext::new();
        ctx.set_line_width(0.5);
        ctx.set_line_width(0.5);
        assert_eq!(ops(&ctx).matches(" w\n").count(), 1);
        assert_eq!(ctx.line_width(), 0.5);
    }

    #[test]
    fn test_draw_image() {
        let mut ctx = GraphicsContext::new();
        ctx.draw_image("Im1", 72.0, 100.0, 200.0, 150.0);
        assert_eq!(
            ops(&ctx),
            "q\n200.00 0 0 150.00 72.00 100.00 cm\n/Im1 Do\nQ\n"
        );
    }
}
