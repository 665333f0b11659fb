use super::{inherited, number, resolve};
use crate::error::{ToolError, ToolResult};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

const FONT_KEY: &[u8] = b"PdfToolsPageNo";
const FONT_SIZE: f32 = 12.0;
const MARGIN: f32 = 20.0;
// Every digit in Helvetica is 556/1000 em wide.
const DIGIT_WIDTH: f32 = 0.556;
const LETTER: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Return a copy of `source` with a right-aligned 1-based page number near the
/// bottom-right corner of every page, as the page is displayed.
///
/// Placement is computed from the first page's visible box (CropBox, else
/// MediaBox) and `/Rotate`, and reused for all pages, so pages of a different
/// size or orientation get the number at the same coordinates.
/// Existing page content is kept and wrapped in its own graphics state.
pub fn stamp_page_numbers(source: &Document) -> ToolResult<Document> {
    let mut doc = source.clone();
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let Some(&first_page) = pages.first() else {
        return Err(ToolError::EmptyDocument);
    };

    let canvas = Canvas::of_page(&doc, first_page);
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    for (index, page_id) in pages.into_iter().enumerate() {
        let label = (index + 1).to_string();
        let x = canvas.width - MARGIN - label_width(&label);
        let y = MARGIN;

        add_font_resource(&mut doc, page_id, font_id)?;
        append_overlay(&mut doc, page_id, overlay(&label, &canvas, x, y)?)?;
    }

    tracing::debug!(pages = doc.get_pages().len(), rotate = canvas.rotate, "stamped page numbers");
    Ok(doc)
}

fn label_width(label: &str) -> f32 {
    label.len() as f32 * DIGIT_WIDTH * FONT_SIZE
}

/// The page as displayed: origin at the visual bottom-left, `width` along the
/// visual bottom edge. `matrix` maps these coordinates into user space.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Canvas {
    width: f32,
    rotate: i64,
    matrix: [f32; 6],
}

impl Canvas {
    fn of_page(doc: &Document, page_id: ObjectId) -> Self {
        let [llx, lly, urx, ury] = visible_box(doc, page_id);
        let rotate = rotation(doc, page_id);
        let (width, matrix) = match rotate {
            90 => (ury - lly, [0.0, 1.0, -1.0, 0.0, urx, lly]),
            180 => (urx - llx, [-1.0, 0.0, 0.0, -1.0, urx, ury]),
            270 => (ury - lly, [0.0, -1.0, 1.0, 0.0, llx, ury]),
            _ => (urx - llx, [1.0, 0.0, 0.0, 1.0, llx, lly]),
        };
        Canvas {
            width,
            rotate,
            matrix,
        }
    }
}

fn page_box(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<[f32; 4]> {
    let arr = resolve(doc, inherited(doc, page_id, key)?).as_array().ok()?;
    let values: Vec<f32> = arr.iter().filter_map(|o| number(resolve(doc, o))).collect();
    let [x0, y0, x1, y1] = <[f32; 4]>::try_from(values).ok()?;
    Some([x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)])
}

/// CropBox clipped to the MediaBox; the MediaBox alone when there is no
/// CropBox or the two do not overlap.
fn visible_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let media = page_box(doc, page_id, b"MediaBox").unwrap_or(LETTER);
    let Some(crop) = page_box(doc, page_id, b"CropBox") else {
        return media;
    };
    let clipped = [
        crop[0].max(media[0]),
        crop[1].max(media[1]),
        crop[2].min(media[2]),
        crop[3].min(media[3]),
    ];
    if clipped[0] < clipped[2] && clipped[1] < clipped[3] {
        clipped
    } else {
        media
    }
}

/// `/Rotate` normalized to 0, 90, 180 or 270. Values that are not a multiple
/// of 90 are ignored.
fn rotation(doc: &Document, page_id: ObjectId) -> i64 {
    let degrees = inherited(doc, page_id, b"Rotate")
        .and_then(|obj| resolve(doc, obj).as_i64().ok())
        .unwrap_or(0)
        .rem_euclid(360);
    if degrees % 90 == 0 {
        degrees
    } else {
        0
    }
}

/// Give the page its own resource dictionary holding the page-number font.
///
/// The effective (possibly inherited or shared) resources are copied rather than
/// edited in place, so other pages and the source tree are left alone.
fn add_font_resource(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> ToolResult<()> {
    let mut resources = inherited(doc, page_id, b"Resources")
        .and_then(|obj| resolve(doc, obj).as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);
    let mut fonts = resources
        .get(b"Font")
        .ok()
        .and_then(|obj| resolve(doc, obj).as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);

    fonts.set(FONT_KEY, Object::Reference(font_id));
    resources.set("Font", fonts);
    doc.get_dictionary_mut(page_id)?.set("Resources", resources);
    Ok(())
}

fn overlay(label: &str, canvas: &Canvas, x: f32, y: f32) -> ToolResult<Vec<u8>> {
    let content = Content {
        operations: vec![
            // closes the `q` pushed in front of the original content
            Operation::new("Q", vec![]),
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                canvas.matrix.iter().map(|&v| Object::Real(v)).collect(),
            ),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(FONT_KEY.to_vec()), Object::Real(FONT_SIZE)],
            ),
            Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
            Operation::new("Tj", vec![Object::string_literal(label)]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ],
    };
    let mut bytes = b"\n".to_vec();
    bytes.extend(content.encode()?);
    Ok(bytes)
}

fn append_overlay(doc: &mut Document, page_id: ObjectId, overlay: Vec<u8>) -> ToolResult<()> {
    let existing: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Array(items)) => items.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        _ => Vec::new(),
    };

    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(save_id));
    contents.extend(existing);
    contents.push(Object::Reference(overlay_id));

    doc.get_dictionary_mut(page_id)?.set("Contents", contents);
    Ok(())
}
