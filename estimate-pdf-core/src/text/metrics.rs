use crate::text::Font;
use std::collections::HashMap;

/// Advance widths for printable ASCII (`' '..='~'`), in 1/1000 em.
struct FontMetrics {
    ascii: [u16; 95],
    default_width: u16,
}

impl FontMetrics {
    fn char_width(&self, ch: char) -> u16 {
        match ch as u32 {
            code @ 0x20..=0x7E => self.ascii[(code - 0x20) as usize],
            _ => self.default_width,
        }
    }
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

lazy_static::lazy_static! {
    static ref FONT_METRICS: HashMap<Font, FontMetrics> = {
        let mut metrics = HashMap::new();
        let helvetica = || FontMetrics { ascii: HELVETICA, default_width: 556 };
        let helvetica_bold = || FontMetrics { ascii: HELVETICA_BOLD, default_width: 611 };
        let times = || FontMetrics { ascii: TIMES_ROMAN, default_width: 500 };
        let courier = || FontMetrics { ascii: [600; 95], default_width: 600 };

        metrics.insert(Font::Helvetica, helvetica());
        metrics.insert(Font::HelveticaOblique, helvetica());
        metrics.insert(Font::HelveticaBold, helvetica_bold());
        metrics.insert(Font::HelveticaBoldOblique, helvetica_bold());
        // Times variants share the roman widths
        metrics.insert(Font::TimesRoman, times());
        metrics.insert(Font::TimesBold, times());
        metrics.insert(Font::TimesItalic, times());
        metrics.insert(Font::TimesBoldItalic, times());
        metrics.insert(Font::Courier, courier());
        metrics.insert(Font::CourierBold, courier());
        metrics.insert(Font::CourierOblique, courier());
        metrics.insert(Font::CourierBoldOblique, courier());
        metrics
    };
}

/// Width of `text` in points when set in `font` at `font_size`.
pub fn measure_text(text: &str, font: Font, font_size: f64) -> f64 {
    match FONT_METRICS.get(&font) {
        Some(metrics) => {
            let units: u32 = text.chars().map(|ch| metrics.char_width(ch) as u32).sum();
            units as f64 / 1000.0 * font_size
        }
        // Symbol and ZapfDingbats
        None => text.chars().count() as f64 * font_size * 0.6,
    }
}

/// Width of a single character in points.
pub fn measure_char(ch: char, font: Font, font_size: f64) -> f64 {
    match FONT_METRICS.get(&font) {
        Some(metrics) => metrics.char_width(ch) as f64 / 1000.0 * font_size,
        None => font_size * 0.6,
    }
}

/// Split text into words, keeping whitespace runs as their own entries.
pub fn split_into_words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    let mut in_space = None;

    for (i, ch) in text.char_indices() {
        let is_space = ch.is_whitespace();
        match in_space {
            Some(previous) if previous != is_space => {
                words.push(&text[start..i]);
                start = i;
            }
            _ => {}
        }
        in_space = Some(is_space);
    }

    if start < text.len() {
        words.push(&text[start..]);
    }
    words
}

/// Greedy word wrap to `max_width` points.
///
/// Explicit newlines start a new line. Words wider than the whole line are
/// broken between characters. Always returns at least one line.
pub fn wrap_text(text: &str, font: Font, font_size: f64, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };

            if measure_text(&candidate, font, font_size) <= max_width {
                line = candidate;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }

            if measure_text(word, font, font_size) <= max_width {
                line = word.to_string();
            } else {
                let mut pieces = break_word(word, font, font_size, max_width);
                line = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }
        lines.push(line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn break_word(word: &str, font: Font, font_size: f64, max_width: f64) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut width = 0.0;

    for ch in word.chars() {
        let ch_width = measure_char(ch, font, font_size);
        if width + ch_width > max_width && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            width = 0.0;
        }
        current.push(ch);
        width += ch_width;
    }
    pieces.push(current);
    pieces
}

/// Caps wrapped lines at `max_lines`, ending the last kept line with `...`
/// trimmed so it still fits in `max_width`.
pub fn truncate_lines(
    mut lines: Vec<String>,
    max_lines: usize,
    font: Font,
    font_size: f64,
    max_width: f64,
) -> Vec<String> {
    if max_lines == 0 || lines.len() <= max_lines {
        return lines;
    }

    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        let mut kept: String = last.trim_end().to_string();
        while !kept.is_empty() && measure_text(&format!("{kept}..."), font, font_size) > max_width
        {
            kept.pop();
        }
        *last = format!("{}...", kept.trim_end());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_known_widths() {
        // 'A' is 667 units in Helvetica
        assert!((measure_text("A", Font::Helvetica, 1000.0) - 667.0).abs() < 1e-9);
        assert!((measure_text("A", Font::HelveticaBold, 1000.0) - 722.0).abs() < 1e-9);
        assert!((measure_text("A", Font::TimesRoman, 1000.0) - 722.0).abs() < 1e-9);
        assert!((measure_text("iiii", Font::Courier, 10.0) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_measure_scales_with_size() {
        let small = measure_text("Hedge trimming", Font::Helvetica, 10.0);
        let large = measure_text("Hedge trimming", Font::Helvetica, 20.0);
        assert!((large - 2.0 * small).abs() < 1e-9);
    }

    #[test]
    fn test_measure_non_ascii_uses_default() {
        assert!((measure_char('é', Font::Helvetica, 1000.0) - 556.0).abs() < 1e-9);
        assert!((measure_char('x', Font::Symbol, 10.0) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_split_into_words() {
        assert_eq!(
            split_into_words("lay  turf now"),
            vec!["lay", "  ", "turf", " ", "now"]
        );
        assert!(split_into_words("").is_empty());
    }

    #[test]
    fn test_wrap_text_respects_width() {
        let text = "Supply and install drip irrigation along the north boundary hedge";
        let lines = wrap_text(text, Font::Helvetica, 10.0, 120.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(measure_text(line, Font::Helvetica, 10.0) <= 120.0);
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_text_newlines_and_empty() {
        assert_eq!(wrap_text("", Font::Helvetica, 10.0, 100.0), vec![""]);
        assert_eq!(
            wrap_text("one\ntwo", Font::Helvetica, 10.0, 100.0),
            vec!["one", "two"]
        );
    }

    #[test]
    fn test_wrap_breaks_long_word() {
        let lines = wrap_text("Aaaaaaaaaaaaaaaaaaaaaaaa", Font::Courier, 10.0, 30.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(measure_text(line, Font::Courier, 10.0) <= 30.0);
        }
    }

    #[test]
    fn test_truncate_lines_adds_ellipsis() {
        let lines = vec![
            "first line".to_string(),
            "second line".to_string(),
            "third line".to_string(),
        ];
        let truncated = truncate_lines(lines, 2, Font::Helvetica, 10.0, 200.0);
        assert_eq!(truncated.len(), 2);
        assert_eq!(truncated[0], "first line");
        assert_eq!(truncated[1], "second line...");
    }

    #[test]
    fn test_truncate_lines_noop_when_short() {
        let lines = vec!["only".to_string()];
        assert_eq!(
            truncate_lines(lines.clone(), 2, Font::Helvetica, 10.0, 100.0),
            lines
        );
    }
}
