//! crates/storytime_core/src/pdf.rs
//!
//! Renders a composed `PaginatedDocument` to PDF bytes with `lopdf`.
//!
//! The composer works in top-down page coordinates; PDF's origin is the
//! bottom-left corner, so every y coordinate is flipped against the page
//! height here. Text uses the standard-14 Helvetica faces (whose metrics
//! the wrap pass already used), images are embedded as raw `/DeviceRGB`
//! XObjects scaled to their composed bounding box.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use crate::domain::StoryRecord;
use crate::error::LayoutError;
use crate::layout::{Block, FontStyle, PageGeometry, PaginatedDocument};

/// Serializes `document` into a complete single-file PDF.
///
/// Output is a pure function of its inputs: the same document and geometry
/// produce byte-identical PDFs.
pub fn render(document: &PaginatedDocument, geometry: &PageGeometry) -> Result<Vec<u8>, LayoutError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let body_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let heading_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });

    let mut page_ids = Vec::with_capacity(document.pages.len());
    for page in &document.pages {
        let mut operations = Vec::new();
        let mut xobjects = Dictionary::new();

        for block in &page.blocks {
            match block {
                Block::TextLine {
                    text,
                    x,
                    baseline,
                    size,
                    style,
                } => {
                    let font = match style {
                        FontStyle::Heading => "F2",
                        FontStyle::Body => "F1",
                    };
                    operations.push(Operation::new("BT", vec![]));
                    operations.push(Operation::new("Tf", vec![font.into(), (*size).into()]));
                    operations.push(Operation::new(
                        "Td",
                        vec![(*x).into(), (geometry.page_height - baseline).into()],
                    ));
                    operations.push(Operation::new(
                        "Tj",
                        vec![Object::string_literal(text.as_str())],
                    ));
                    operations.push(Operation::new("ET", vec![]));
                }
                Block::Image {
                    image,
                    x,
                    y,
                    width,
                    height,
                } => {
                    let image_id = doc.add_object(Stream::new(
                        dictionary! {
                            "Type" => "XObject",
                            "Subtype" => "Image",
                            "Width" => image.width as i64,
                            "Height" => image.height as i64,
                            "ColorSpace" => "DeviceRGB",
                            "BitsPerComponent" => 8,
                        },
                        image.pixels.clone(),
                    ));
                    let name = format!("Im{}", xobjects.len());
                    operations.push(Operation::new("q", vec![]));
                    operations.push(Operation::new(
                        "cm",
                        vec![
                            (*width).into(),
                            0.into(),
                            0.into(),
                            (*height).into(),
                            (*x).into(),
                            (geometry.page_height - (y + height)).into(),
                        ],
                    ));
                    operations.push(Operation::new("Do", vec![name.as_str().into()]));
                    operations.push(Operation::new("Q", vec![]));
                    xobjects.set(name, image_id);
                }
            }
        }

        let content = Content { operations };
        let data = content
            .encode()
            .map_err(|e| LayoutError::Render(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), data));

        let mut resources = dictionary! {
            "Font" => dictionary! {
                "F1" => body_font_id,
                "F2" => heading_font_id,
            },
        };
        if !xobjects.is_empty() {
            resources.set("XObject", xobjects);
        }

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_ids.len() as i64,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                geometry.page_width.into(),
                geometry.page_height.into(),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| LayoutError::Render(e.to_string()))?;
    Ok(bytes)
}

/// The export file name, derived from the story's `name`: lowercased,
/// non-alphanumerics collapsed to single dashes, with a `story.pdf`
/// fallback when nothing survives sanitization.
pub fn export_file_name(record: &StoryRecord) -> String {
    let mut slug = String::new();
    for ch in record.name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "story.pdf".to_string()
    } else {
        format!("{slug}-story.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CapturedImage;
    use crate::layout::compose;

    fn record() -> StoryRecord {
        StoryRecord {
            id: None,
            name: "Mia".to_string(),
            character: "astronaut".to_string(),
            topic: "Space".to_string(),
            body: "Mia looked up at the stars.\n".repeat(60),
            image_url: None,
        }
    }

    fn image() -> CapturedImage {
        CapturedImage {
            width: 3,
            height: 2,
            pixels: vec![200u8; 3 * 2 * 3],
        }
    }

    #[test]
    fn renders_a_parsable_pdf_with_all_composed_pages() {
        let geometry = PageGeometry::default();
        let composed = compose(&record(), &geometry, Some(&image())).unwrap();
        let bytes = render(&composed, &geometry).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), composed.pages.len());
    }

    #[test]
    fn rendering_is_byte_identical_across_exports() {
        let geometry = PageGeometry::default();
        let composed = compose(&record(), &geometry, Some(&image())).unwrap();
        let first = render(&composed, &geometry).unwrap();
        let second = render(&composed, &geometry).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn file_name_comes_from_the_story_name() {
        let mut record = record();
        assert_eq!(export_file_name(&record), "mia-story.pdf");

        record.name = "  Rosa Marie!  ".to_string();
        assert_eq!(export_file_name(&record), "rosa-marie-story.pdf");

        record.name = "???".to_string();
        assert_eq!(export_file_name(&record), "story.pdf");
    }
}
