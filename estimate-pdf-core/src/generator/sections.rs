//! Header and text sections. Both are drawn in one go; only tables and
//! image grids are chunked.

use crate::error::Result;
use crate::graphics::Color;
use crate::layout::Canvas;
use crate::text::Font;

const TITLE_SIZE: f64 = 20.0;
const SUBTITLE_SIZE: f64 = 12.0;
const SECTION_TITLE_SIZE: f64 = 13.0;
const BODY_SIZE: f64 = 10.0;
const BODY_LEADING: f64 = 1.4;
const BLOCK_GAP: f64 = 12.0;

/// Title, optional subtitle and a rule across the content width.
pub(crate) fn draw_header(canvas: &mut Canvas, title: &str, subtitle: Option<&str>) -> Result<()> {
    let geometry = canvas.geometry();
    let left = geometry.margins.left;

    let title_lines = canvas.cache().wrap(
        title,
        Font::HelveticaBold,
        TITLE_SIZE,
        geometry.content_width(),
        2,
    );

    let mut height = title_lines.len().max(1) as f64 * TITLE_SIZE * 1.4 + BLOCK_GAP;
    if subtitle.is_some() {
        height += SUBTITLE_SIZE * 1.5;
    }
    canvas.ensure_space(height);
    for line in &title_lines {
        let baseline = canvas.tracker().current_y() + TITLE_SIZE;
        canvas.text_at(left, baseline, Font::HelveticaBold, TITLE_SIZE, Color::black(), line)?;
        canvas.tracker.advance(TITLE_SIZE * 1.4);
    }

    if let Some(subtitle) = subtitle {
        let baseline = canvas.tracker().current_y() + SUBTITLE_SIZE;
        canvas.text_at(
            left,
            baseline,
            Font::Helvetica,
            SUBTITLE_SIZE,
            Color::gray(0.35),
            subtitle,
        )?;
        canvas.tracker.advance(SUBTITLE_SIZE * 1.5);
    }

    let rule_y = canvas.tracker().to_pdf_y(canvas.tracker().current_y() + 4.0);
    canvas
        .page()?
        .graphics()
        .set_stroke_color(Color::gray(0.7))
        .set_line_width(1.0)
        .move_to(left, rule_y)
        .line_to(geometry.width - geometry.margins.right, rule_y)
        .stroke();
    canvas.tracker.advance(BLOCK_GAP);
    Ok(())
}

/// A bold title followed by wrapped body lines. The title is kept on the
/// same page as the first body line; the body breaks across pages.
pub(crate) fn draw_section(canvas: &mut Canvas, title: &str, paragraphs: &[String]) -> Result<usize> {
    let geometry = canvas.geometry();
    let left = geometry.margins.left;
    let width = geometry.content_width();
    let title_height = SECTION_TITLE_SIZE * BODY_LEADING;
    let line_height = BODY_SIZE * BODY_LEADING;

    let mut lines = Vec::new();
    for paragraph in paragraphs {
        lines.extend(canvas.cache().wrap(paragraph, Font::Helvetica, BODY_SIZE, width, 0));
    }
    let first_line = if lines.is_empty() { 0.0 } else { line_height };
    canvas.ensure_space(title_height + first_line);

    let baseline = canvas.tracker().current_y() + SECTION_TITLE_SIZE;
    canvas.text_at(
        left,
        baseline,
        Font::HelveticaBold,
        SECTION_TITLE_SIZE,
        Color::black(),
        title,
    )?;
    canvas.tracker.advance(title_height);

    for line in &lines {
        canvas.ensure_space(line_height);
        if !line.trim().is_empty() {
            let baseline = canvas.tracker().current_y() + BODY_SIZE;
            canvas.text_at(left, baseline, Font::Helvetica, BODY_SIZE, Color::gray(0.15), line)?;
        }
        canvas.tracker.advance(line_height);
    }
    canvas.tracker.advance(BLOCK_GAP);
    Ok(lines.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::layout::PageGeometry;

    fn canvas() -> Canvas {
        let mut document = Document::new();
        document.set_compress(false);
        Canvas::new(PageGeometry::default(), document)
    }

    fn content(canvas: &mut Canvas, page: usize) -> String {
        let page = canvas.document.page_mut(page).unwrap();
        String::from_utf8_lossy(&page.generate_content()).into_owned()
    }

    #[test]
    fn test_header_with_subtitle() {
        let mut canvas = canvas();
        draw_header(&mut canvas, "Estimate #1042", Some("Green Acres Landscaping")).unwrap();

        let text = content(&mut canvas, 0);
        assert!(text.contains("(Estimate #1042) Tj"));
        assert!(text.contains("(Green Acres Landscaping) Tj"));
        assert!(text.contains(" l\n0.700 G\nS\n"));
        assert!(canvas.tracker().current_y() > 40.0 + TITLE_SIZE);
    }

    #[test]
    fn test_section_wraps_long_body() {
        let mut canvas = canvas();
        let body = "Remove existing turf and regrade the rear yard. ".repeat(12);
        let lines = draw_section(&mut canvas, "Scope of work", &[body]).unwrap();

        assert!(lines > 1);
        let text = content(&mut canvas, 0);
        assert!(text.contains("(Scope of work) Tj"));
    }

    #[test]
    fn test_section_breaks_across_pages() {
        let mut canvas = canvas();
        let paragraphs: Vec<String> = (0..120).map(|i| format!("Line {i}")).collect();
        let lines = draw_section(&mut canvas, "Notes", &paragraphs).unwrap();

        assert_eq!(lines, 120);
        assert!(canvas.tracker().current_page() >= 2);
        assert_eq!(
            canvas.document().page_count(),
            canvas.tracker().current_page()
        );
    }

    #[test]
    fn test_title_kept_with_first_line() {
        let mut canvas = canvas();
        let geometry = canvas.geometry();
        // leave room for the title but not the first body line
        let gap = geometry.bottom_limit() - geometry.margins.top - SECTION_TITLE_SIZE * BODY_LEADING - 2.0;
        canvas.tracker.advance(gap);
        draw_section(&mut canvas, "Terms", &["Payment due in 30 days".to_string()]).unwrap();

        assert_eq!(canvas.tracker().current_page(), 2);
        assert!(!content(&mut canvas, 0).contains("(Terms) Tj"));
        assert!(content(&mut canvas, 1).contains("(Terms) Tj"));
    }

    #[test]
    fn test_two_line_title_moves_to_next_page() {
        let mut canvas = canvas();
        let geometry = canvas.geometry();
        // one title line fits, two do not
        let gap = geometry.bottom_limit() - geometry.margins.top - TITLE_SIZE * 1.4 - BLOCK_GAP - 2.0;
        canvas.tracker.advance(gap);
        let title = "Full backyard renovation with irrigation, sod, edging and planting beds";
        draw_header(&mut canvas, title, None).unwrap();

        assert_eq!(canvas.tracker().current_page(), 2);
        assert!(canvas.tracker().current_y() <= geometry.bottom_limit());
        assert!(!content(&mut canvas, 0).contains(" Tj"));
    }
}
