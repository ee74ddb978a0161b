/// Device colour used for fills, strokes and text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    Rgb(f64, f64, f64),
    Gray(f64),
    Cmyk(f64, f64, f64, f64),
}

impl Color {
    /// RGB components clamped to `0.0..=1.0`.
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Color::Rgb(r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0))
    }

    /// RGB from 8-bit channels, e.g. a brand colour `#2E7D32`.
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }

    pub fn gray(value: f64) -> Self {
        Color::Gray(value.clamp(0.0, 1.0))
    }

    pub fn cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        Color::Cmyk(
            c.clamp(0.0, 1.0),
            m.clamp(0.0, 1.0),
            y.clamp(0.0, 1.0),
            k.clamp(0.0, 1.0),
        )
    }

    pub fn black() -> Self {
        Color::Gray(0.0)
    }

    pub fn white() -> Self {
        Color::Gray(1.0)
    }

    /// Non-stroking colour operator line (`rg`, `g` or `k`).
    pub fn fill_operator(&self) -> String {
        match self {
            Color::Rgb(r, g, b) => format!("{r:.3} {g:.3} {b:.3} rg\n"),
            Color::Gray(g) => format!("{g:.3} g\n"),
            Color::Cmyk(c, m, y, k) => format!("{c:.3} {m:.3} {y:.3} {k:.3} k\n"),
        }
    }

    /// Stroking colour operator line (`RG`, `G` or `K`).
    pub fn stroke_operator(&self) -> String {
        match self {
            Color::Rgb(r, g, b) => format!("{r:.3} {g:.3} {b:.3} RG\n"),
            Color::Gray(g) => format!("{g:.3} G\n"),
            Color::Cmyk(c, m, y, k) => format!("{c:.3} {m:.3} {y:.3} {k:.3} K\n"),
        }
    }
}
