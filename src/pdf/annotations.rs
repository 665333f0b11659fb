use super::{number, resolve};
use crate::highlight::ColorSample;
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Highlight annotation colors for every page, as `(0-based page index, colors)`.
///
/// Pages come out in document order. A highlight without a usable `/C` entry
/// contributes `None`.
pub fn highlight_colors(doc: &Document) -> Vec<(u32, Vec<Option<ColorSample>>)> {
    doc.get_pages()
        .into_values()
        .enumerate()
        .map(|(index, page_id)| (index as u32, page_highlights(doc, page_id)))
        .collect()
}

fn page_highlights(doc: &Document, page_id: ObjectId) -> Vec<Option<ColorSample>> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    // /Annots may be an inline array or a reference to one
    let annots = match page.get(b"Annots") {
        Ok(obj) => resolve(doc, obj),
        Err(_) => return Vec::new(),
    };
    let Ok(annots) = annots.as_array() else {
        return Vec::new();
    };

    annots
        .iter()
        .filter_map(|annot| resolve(doc, annot).as_dict().ok())
        .filter(|annot| is_highlight(annot))
        .map(|annot| stroke_color(doc, annot))
        .collect()
}

fn is_highlight(annot: &Dictionary) -> bool {
    matches!(annot.get(b"Subtype").and_then(Object::as_name), Ok(b"Highlight"))
}

fn stroke_color(doc: &Document, annot: &Dictionary) -> Option<ColorSample> {
    let components = resolve(doc, annot.get(b"C").ok()?).as_array().ok()?;
    let values = components
        .iter()
        .map(|c| number(resolve(doc, c)))
        .collect::<Option<Vec<f32>>>()?;
    ColorSample::from_components(&values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::{add_annotation, sample_pdf};
    use lopdf::dictionary;

    #[test]
    fn test_reads_highlight_colors_per_page() {
        let doc = sample_pdf(&[
            vec![vec![1.0, 1.0, 0.0]],
            vec![],
            vec![vec![0.0, 1.0, 0.0], vec![0.5]],
        ]);
        let colors = highlight_colors(&doc);
        assert_eq!(
            colors,
            vec![
                (0, vec![Some(ColorSample::new(1.0, 1.0, 0.0))]),
                (1, vec![]),
                (
                    2,
                    vec![
                        Some(ColorSample::new(0.0, 1.0, 0.0)),
                        Some(ColorSample::new(0.5, 0.5, 0.5)),
                    ]
                ),
            ]
        );
    }

    #[test]
    fn test_highlight_without_color_is_none() {
        let doc = sample_pdf(&[vec![vec![]]]);
        assert_eq!(highlight_colors(&doc), vec![(0, vec![None])]);
    }

    #[test]
    fn test_other_annotation_types_are_ignored() {
        let mut doc = sample_pdf(&[vec![]]);
        add_annotation(
            &mut doc,
            1,
            dictionary! {
                "Type" => "Annot",
                "Subtype" => "Underline",
                "C" => vec![Object::Real(1.0), Object::Real(1.0), Object::Real(0.0)],
            },
        );
        assert_eq!(highlight_colors(&doc), vec![(0, vec![])]);
    }

    #[test]
    fn test_integer_color_components() {
        let mut doc = sample_pdf(&[vec![]]);
        add_annotation(
            &mut doc,
            1,
            dictionary! {
                "Type" => "Annot",
                "Subtype" => "Highlight",
                "C" => vec![Object::Integer(0), Object::Integer(1), Object::Integer(0)],
            },
        );
        assert_eq!(
            highlight_colors(&doc),
            vec![(0, vec![Some(ColorSample::new(0.0, 1.0, 0.0))])]
        );
    }

    #[test]
    fn test_annots_behind_a_reference() {
        let mut doc = sample_pdf(&[vec![vec![0.0, 1.0, 0.0]]]);
        let page_id = doc.get_pages()[&1];
        let annots = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Annots")
            .unwrap()
            .clone();
        let annots_id = doc.add_object(annots);
        doc.get_dictionary_mut(page_id)
            .unwrap()
            .set("Annots", Object::Reference(annots_id));
        assert_eq!(
            highlight_colors(&doc),
            vec![(0, vec![Some(ColorSample::new(0.0, 1.0, 0.0))])]
        );
    }
}
