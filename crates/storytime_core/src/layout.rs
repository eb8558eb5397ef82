//! crates/storytime_core/src/layout.rs
//!
//! The document composer: deterministic text/image layout and pagination
//! for a single `StoryRecord`. Given the same record, geometry, and captured
//! image, `compose` always produces the identical page sequence; rendering
//! happens separately in the `pdf` module.

use crate::domain::{CapturedImage, StoryRecord};
use crate::error::LayoutError;

//=========================================================================================
// Page Geometry
//=========================================================================================

/// The injected layout constants, in PDF points (1/72 inch).
#[derive(Debug, Clone, PartialEq)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    /// Uniform margin on all four sides.
    pub margin: f32,
    /// Vertical advance per body text line.
    pub line_advance: f32,
    /// Vertical advance per title line.
    pub title_advance: f32,
    pub body_size: f32,
    pub title_size: f32,
    /// Vertical gap after the title block and after the image block.
    pub block_spacing: f32,
}

impl Default for PageGeometry {
    /// A4 portrait with a 2 cm margin.
    fn default() -> Self {
        Self {
            page_width: 595.28,
            page_height: 841.89,
            margin: 56.7,
            line_advance: 16.0,
            title_advance: 22.0,
            body_size: 12.0,
            title_size: 18.0,
            block_spacing: 12.0,
        }
    }
}

impl PageGeometry {
    pub fn usable_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    pub fn usable_height(&self) -> f32 {
        self.page_height - 2.0 * self.margin
    }

    /// The composer's only hard precondition: the margins must leave a
    /// usable area of positive size.
    fn validate(&self) -> Result<(), LayoutError> {
        if self.usable_width() <= 0.0 || self.usable_height() <= 0.0 {
            return Err(LayoutError::UnusableArea {
                width: self.usable_width(),
                height: self.usable_height(),
            });
        }
        Ok(())
    }
}

//=========================================================================================
// Composed Output
//=========================================================================================

/// Which of the two document fonts a text line uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Heading,
    Body,
}

/// One placed block on a page. Coordinates are top-down page points:
/// `baseline` is the text baseline, `y` an image's top edge.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    TextLine {
        text: String,
        x: f32,
        baseline: f32,
        size: f32,
        style: FontStyle,
    },
    Image {
        image: CapturedImage,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub blocks: Vec<Block>,
}

/// The ordered page sequence produced by one `compose` call. Immutable
/// after creation; consumed by the PDF writer and then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedDocument {
    pub pages: Vec<Page>,
}

//=========================================================================================
// Font Metrics
//=========================================================================================

/// Advance widths for the standard-14 fonts the PDF writer embeds, so the
/// wrap pass and the renderer agree on line widths. Values are AFM units
/// per 1000 em for the ASCII range; anything outside falls back to a fixed
/// width.
#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    widths: &'static [u16; 95],
    fallback: u16,
}

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278,
    584, 584, 584, 556, 1015, 667, 667, 722, 722, 667, 611, 778, 722, 278,
    500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556,
    278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333,
    584, 584, 584, 611, 975, 722, 722, 722, 722, 667, 611, 778, 722, 278,
    556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556,
    333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556,
    333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

impl FontMetrics {
    pub fn helvetica() -> Self {
        Self {
            widths: &HELVETICA_WIDTHS,
            fallback: 556,
        }
    }

    pub fn helvetica_bold() -> Self {
        Self {
            widths: &HELVETICA_BOLD_WIDTHS,
            fallback: 611,
        }
    }

    /// The horizontal advance of one glyph at `size` points.
    pub fn advance(&self, ch: char, size: f32) -> f32 {
        let units = if (' '..='~').contains(&ch) {
            self.widths[ch as usize - 32]
        } else {
            self.fallback
        };
        f32::from(units) * size / 1000.0
    }

    pub fn line_width(&self, text: &str, size: f32) -> f32 {
        text.chars().map(|ch| self.advance(ch, size)).sum()
    }
}

//=========================================================================================
// Word Wrapping
//=========================================================================================

/// Greedily wraps `text` into lines no wider than `max_width` points.
///
/// Source line breaks are respected, a blank source line becomes one empty
/// output line (a paragraph gap), and a single word wider than the line is
/// broken at glyph boundaries so no output line ever exceeds `max_width`.
pub fn wrap_text(text: &str, metrics: &FontMetrics, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let space = metrics.advance(' ', size);

    for paragraph in text.lines() {
        if paragraph.trim().is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            continue;
        }

        let mut current = String::new();
        let mut current_width = 0.0f32;
        for word in paragraph.split_whitespace() {
            for piece in split_oversized(word, metrics, size, max_width) {
                let piece_width = metrics.line_width(&piece, size);
                if current.is_empty() {
                    current = piece;
                    current_width = piece_width;
                } else if current_width + space + piece_width <= max_width {
                    current.push(' ');
                    current.push_str(&piece);
                    current_width += space + piece_width;
                } else {
                    lines.push(std::mem::take(&mut current));
                    current = piece;
                    current_width = piece_width;
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Breaks a word wider than the line into line-sized pieces.
fn split_oversized(word: &str, metrics: &FontMetrics, size: f32, max_width: f32) -> Vec<String> {
    if metrics.line_width(word, size) <= max_width {
        return vec![word.to_string()];
    }

    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0f32;
    for ch in word.chars() {
        let advance = metrics.advance(ch, size);
        if !piece.is_empty() && width + advance > max_width {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(ch);
        width += advance;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

//=========================================================================================
// Composition
//=========================================================================================

fn title_text(record: &StoryRecord) -> String {
    let name = record.name.trim();
    let topic = record.topic.trim();
    match (name.is_empty(), topic.is_empty()) {
        (true, true) => "A Story".to_string(),
        (true, false) => format!("A {topic} Story"),
        (false, true) => format!("{name}'s Story"),
        (false, false) => format!("{name}'s {topic} Story"),
    }
}

/// Lays out `record` (with its already-captured illustration, if any) into
/// a page sequence.
///
/// The walk is strictly top-down with a single vertical cursor: title lines
/// first, then the image scaled to the usable width with its aspect ratio
/// preserved, then the wrapped body lines, opening a new page whenever the
/// next line advance would pass the bottom margin. A single block taller
/// than one page is placed anyway; blocks are never split across pages.
pub fn compose(
    record: &StoryRecord,
    geometry: &PageGeometry,
    image: Option<&CapturedImage>,
) -> Result<PaginatedDocument, LayoutError> {
    geometry.validate()?;

    let usable_width = geometry.usable_width();
    let bottom = geometry.page_height - geometry.margin;
    let heading_font = FontMetrics::helvetica_bold();
    let body_font = FontMetrics::helvetica();

    let mut pages = vec![Page::default()];
    let mut cursor = geometry.margin;

    // Title block at the top margin of page 1.
    let title = title_text(record);
    for line in wrap_text(&title, &heading_font, geometry.title_size, usable_width) {
        cursor += geometry.title_advance;
        pages[0].blocks.push(Block::TextLine {
            text: line,
            x: geometry.margin,
            baseline: cursor,
            size: geometry.title_size,
            style: FontStyle::Heading,
        });
    }
    cursor += geometry.block_spacing;

    // Illustration directly below the title, full usable width.
    if let Some(image) = image {
        if image.width > 0 && image.height > 0 {
            let rendered_height = usable_width * image.height as f32 / image.width as f32;
            pages[0].blocks.push(Block::Image {
                image: image.clone(),
                x: geometry.margin,
                y: cursor,
                width: usable_width,
                height: rendered_height,
            });
            cursor += rendered_height + geometry.block_spacing;
        }
    }

    // Body lines, paginating on the bottom margin. Empty lines (paragraph
    // gaps) consume vertical space but place no block.
    for line in wrap_text(&record.body, &body_font, geometry.body_size, usable_width) {
        if cursor + geometry.line_advance > bottom {
            pages.push(Page::default());
            cursor = geometry.margin;
        }
        cursor += geometry.line_advance;
        if !line.is_empty() {
            let last = pages.len() - 1;
            pages[last].blocks.push(Block::TextLine {
                text: line,
                x: geometry.margin,
                baseline: cursor,
                size: geometry.body_size,
                style: FontStyle::Body,
            });
        }
    }

    Ok(PaginatedDocument { pages })
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Small page so capacities stay easy to reason about: usable width
    /// 160pt, first text line lands at margin + title_advance +
    /// block_spacing = 50pt, bottom margin at 180pt. That leaves 13 body
    /// lines on the title page and 16 on every following page.
    fn geometry() -> PageGeometry {
        PageGeometry {
            page_width: 200.0,
            page_height: 200.0,
            margin: 20.0,
            line_advance: 10.0,
            title_advance: 20.0,
            body_size: 10.0,
            title_size: 15.0,
            block_spacing: 10.0,
        }
    }

    fn record(body: &str) -> StoryRecord {
        StoryRecord {
            id: None,
            name: "Mia".to_string(),
            character: "astronaut".to_string(),
            topic: String::new(),
            body: body.to_string(),
            image_url: None,
        }
    }

    fn body_of_lines(count: usize) -> String {
        (0..count)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn text_lines(page: &Page) -> Vec<&str> {
        page.blocks
            .iter()
            .filter_map(|block| match block {
                Block::TextLine {
                    text,
                    style: FontStyle::Body,
                    ..
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn image() -> CapturedImage {
        CapturedImage {
            width: 4,
            height: 2,
            pixels: vec![0u8; 4 * 2 * 3],
        }
    }

    #[test]
    fn short_body_yields_one_page() {
        let doc = compose(&record("Once upon a time."), &geometry(), None).unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(text_lines(&doc.pages[0]).len(), 1);
    }

    #[test]
    fn empty_body_yields_title_only_page() {
        let doc = compose(&record(""), &geometry(), Some(&image())).unwrap();
        assert_eq!(doc.pages.len(), 1);
        // One title line plus the image block, nothing else.
        assert_eq!(doc.pages[0].blocks.len(), 2);
    }

    #[test]
    fn page_count_matches_capacity_formula() {
        // 33 lines, first-page capacity 13, full-page capacity 16:
        // 1 + ceil((33 - 13) / 16) = 3 pages.
        let doc = compose(&record(&body_of_lines(33)), &geometry(), None).unwrap();
        assert_eq!(doc.pages.len(), 3);
        assert_eq!(text_lines(&doc.pages[0]).len(), 13);
        assert_eq!(text_lines(&doc.pages[1]).len(), 16);
        assert_eq!(text_lines(&doc.pages[2]).len(), 4);
    }

    #[test]
    fn exactly_full_first_page_does_not_spill() {
        let doc = compose(&record(&body_of_lines(13)), &geometry(), None).unwrap();
        assert_eq!(doc.pages.len(), 1);
    }

    #[test]
    fn image_reduces_first_page_capacity() {
        // 4:2 image at 160pt usable width renders 80pt tall, pushing the
        // first body line down to 140pt and leaving 4 lines on page 1.
        let doc = compose(&record(&body_of_lines(5)), &geometry(), Some(&image())).unwrap();
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(text_lines(&doc.pages[0]).len(), 4);
        assert_eq!(text_lines(&doc.pages[1]).len(), 1);
    }

    #[test]
    fn oversized_image_is_placed_anyway() {
        let tall = CapturedImage {
            width: 1,
            height: 10,
            pixels: vec![0u8; 30],
        };
        let doc = compose(&record(""), &geometry(), Some(&tall)).unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert!(matches!(doc.pages[0].blocks[1], Block::Image { height, .. } if height > 200.0));
    }

    #[test]
    fn composition_is_deterministic() {
        let record = record(&body_of_lines(40));
        let image = image();
        let first = compose(&record, &geometry(), Some(&image)).unwrap();
        let second = compose(&record, &geometry(), Some(&image)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unusable_geometry_is_rejected() {
        let geometry = PageGeometry {
            margin: 120.0,
            ..geometry()
        };
        let err = compose(&record("text"), &geometry, None).unwrap_err();
        assert!(matches!(err, LayoutError::UnusableArea { .. }));
    }

    #[test]
    fn wrapped_lines_never_exceed_usable_width() {
        let metrics = FontMetrics::helvetica();
        let body = "The quick brown fox jumps over the lazy dog again and again, \
                    wandering through moonlit meadows until morning.";
        for line in wrap_text(body, &metrics, 10.0, 160.0) {
            assert!(metrics.line_width(&line, 10.0) <= 160.0);
        }
    }

    #[test]
    fn oversized_word_is_broken_at_glyph_boundaries() {
        let metrics = FontMetrics::helvetica();
        let word = "a".repeat(200);
        let lines = wrap_text(&word, &metrics, 10.0, 160.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(metrics.line_width(line, 10.0) <= 160.0);
        }
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn paragraph_gap_costs_one_line() {
        let doc = compose(&record("first\n\nsecond"), &geometry(), None).unwrap();
        let lines = &doc.pages[0].blocks;
        // Title, then two body lines separated by one blank advance.
        assert_eq!(lines.len(), 3);
        let baselines: Vec<f32> = lines
            .iter()
            .filter_map(|block| match block {
                Block::TextLine {
                    baseline,
                    style: FontStyle::Body,
                    ..
                } => Some(*baseline),
                _ => None,
            })
            .collect();
        assert_eq!(baselines, vec![60.0, 80.0]);
    }
}
