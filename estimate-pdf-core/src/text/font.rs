/// The standard 14 PDF fonts.
///
/// These never need embedding; every conforming reader ships them. The
/// writer registers them with `WinAnsiEncoding`, except the two symbolic
/// faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Font {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
    Symbol,
    ZapfDingbats,
}

impl Font {
    /// PostScript base font name, also used as the resource name on pages.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
            Font::HelveticaOblique => "Helvetica-Oblique",
            Font::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Font::TimesRoman => "Times-Roman",
            Font::TimesBold => "Times-Bold",
            Font::TimesItalic => "Times-Italic",
            Font::TimesBoldItalic => "Times-BoldItalic",
            Font::Courier => "Courier",
            Font::CourierBold => "Courier-Bold",
            Font::CourierOblique => "Courier-Oblique",
            Font::CourierBoldOblique => "Courier-BoldOblique",
            Font::Symbol => "Symbol",
            Font::ZapfDingbats => "ZapfDingbats",
        }
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self, Font::Symbol | Font::ZapfDingbats)
    }

    /// The bold face of the same family. Symbolic fonts map to themselves.
    pub fn bold(&self) -> Font {
        match self {
            Font::Helvetica | Font::HelveticaBold => Font::HelveticaBold,
            Font::HelveticaOblique | Font::HelveticaBoldOblique => Font::HelveticaBoldOblique,
            Font::TimesRoman | Font::TimesBold => Font::TimesBold,
            Font::TimesItalic | Font::TimesBoldItalic => Font::TimesBoldItalic,
            Font::Courier | Font::CourierBold => Font::CourierBold,
            Font::CourierOblique | Font::CourierBoldOblique => Font::CourierBoldOblique,
            Font::Symbol => Font::Symbol,
            Font::ZapfDingbats => Font::ZapfDingbats,
        }
    }
}
