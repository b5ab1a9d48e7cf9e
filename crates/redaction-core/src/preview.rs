//! Review preview: the original document plus one highlight annotation
//! per detected region. Nothing is destroyed here; reviewers open the
//! preview to judge the proposal before any redaction runs.

use std::path::Path;

use lopdf::{dictionary, Document, Object, ObjectId};

use shared_types::{PageDimensions, SensitiveRegion};

use crate::pdfutil::page_box;
use crate::RedactionError;

/// Write a copy of `source` to `output` with a yellow square annotation
/// over every region. The annotation's note carries the detected value
/// and the classifier's rationale.
pub fn write_preview(
    source: &Path,
    regions: &[SensitiveRegion],
    output: &Path,
) -> Result<(), RedactionError> {
    let mut doc = Document::load(source)
        .map_err(|e| RedactionError::Pdf(format!("{}: {}", source.display(), e)))?;
    let pages = doc.get_pages();

    for region in regions {
        let Some(page_id) = pages.get(&region.page).copied() else {
            tracing::warn!(page = region.page, "preview region on missing page, skipping");
            continue;
        };
        let annotation_id = build_annotation(&mut doc, page_id, region);
        attach_annotation(&mut doc, page_id, annotation_id);
    }

    doc.save(output)
        .map_err(|e| RedactionError::Pdf(format!("{}: {}", output.display(), e)))?;
    tracing::info!(preview = %output.display(), regions = regions.len(), "wrote preview");
    Ok(())
}

fn build_annotation(doc: &mut Document, page_id: ObjectId, region: &SensitiveRegion) -> ObjectId {
    let (llx, lly, urx, ury) = page_box(doc, page_id);
    let page = PageDimensions::new(urx - llx, ury - lly);
    let b = region.bbox.clamp_to(&page);

    // Page points are top-left origin; annotation rects are PDF user
    // space, bottom-left origin.
    let rect = vec![
        Object::Real((llx + b.x0) as f32),
        Object::Real((lly + (page.height - b.y1)) as f32),
        Object::Real((llx + b.x1) as f32),
        Object::Real((lly + (page.height - b.y0)) as f32),
    ];
    let note = format!("{} ({})", region.content, region.rationale);

    doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Square",
        "Rect" => rect,
        "C" => vec![Object::Real(1.0), Object::Real(1.0), Object::Real(0.0)],
        "CA" => Object::Real(0.35),
        "Contents" => Object::string_literal(note),
        // Print flag so the highlight survives print-to-PDF review flows.
        "F" => 4,
    })
}

fn attach_annotation(doc: &mut Document, page_id: ObjectId, annotation_id: ObjectId) {
    let existing = match doc.get_object(page_id) {
        Ok(Object::Dictionary(dict)) => match dict.get(b"Annots") {
            Ok(Object::Array(arr)) => arr.clone(),
            Ok(Object::Reference(ref_id)) => match doc.get_object(*ref_id) {
                Ok(Object::Array(arr)) => arr.clone(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let mut annots = existing;
    annots.push(Object::Reference(annotation_id));
    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
        dict.set(b"Annots", Object::Array(annots));
    }
}
