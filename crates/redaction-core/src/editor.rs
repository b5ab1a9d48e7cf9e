//! Destructive opaque-box redaction over lopdf documents.
//!
//! Painting a black box is not redaction on its own: the glyphs under it
//! would still sit in the content stream, one copy-paste away. For every
//! target region this editor rewrites the page's content stream so that
//! characters inside the region are blanked out, image draws intersecting
//! it are dropped, and annotations over it are removed; the opaque box is
//! painted on top of that already-destroyed content.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object};

use shared_types::{
    DocumentEditProvider, PageDimensions, ProviderError, Redactable, RedactionTarget,
};

use crate::pdfutil::{number_f32, page_box, page_content, replace_page_content};

/// One redaction rectangle in PDF user space (origin bottom-left),
/// produced from a page-point target by flipping the y axis against the
/// page box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MaskRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl MaskRect {
    fn intersects(&self, x: f32, y: f32, width: f32, height: f32) -> bool {
        x < self.x + self.width
            && self.x < x + width
            && y < self.y + self.height
            && self.y < y + height
    }
}

/// Convert a page-point target (top-left origin) into PDF user space,
/// clamped to the page.
fn to_mask(target: &RedactionTarget, page_box: (f64, f64, f64, f64)) -> MaskRect {
    let (llx, lly, urx, ury) = page_box;
    let page = PageDimensions::new(urx - llx, ury - lly);
    let b = target.bbox.clamp_to(&page);
    MaskRect {
        x: (llx + b.x0) as f32,
        y: (lly + (page.height - b.y1)) as f32,
        width: b.width() as f32,
        height: b.height() as f32,
    }
}

fn estimate_char_width(byte: u8, font_size: f32) -> f32 {
    if byte < 128 {
        font_size * 0.55
    } else {
        font_size
    }
}

fn estimate_text_width(text: &[u8], font_size: f32) -> f32 {
    text.iter().map(|&b| estimate_char_width(b, font_size)).sum()
}

fn char_in_mask(char_x: f32, char_y: f32, char_width: f32, font_size: f32, masks: &[MaskRect]) -> bool {
    let char_height = font_size.abs().max(12.0);
    masks
        .iter()
        .any(|m| m.intersects(char_x, char_y, char_width, char_height))
}

/// Character-level destruction: any glyph whose estimated box falls in a
/// mask becomes a space, so the text positions stay stable while the
/// content itself is gone.
fn redact_text_chars(
    text: &[u8],
    start_x: f32,
    start_y: f32,
    font_size: f32,
    masks: &[MaskRect],
) -> (Vec<u8>, bool) {
    let mut result = Vec::with_capacity(text.len());
    let mut current_x = start_x;
    let mut any_redacted = false;

    for &byte in text {
        let char_width = estimate_char_width(byte, font_size);
        if char_in_mask(current_x, start_y, char_width, font_size, masks) {
            result.push(b' ');
            any_redacted = true;
        } else {
            result.push(byte);
        }
        current_x += char_width;
    }

    (result, any_redacted)
}

fn multiply(ctm: &[f32; 6], m: &[f32; 6]) -> [f32; 6] {
    [
        ctm[0] * m[0] + ctm[2] * m[1],
        ctm[1] * m[0] + ctm[3] * m[1],
        ctm[0] * m[2] + ctm[2] * m[3],
        ctm[1] * m[2] + ctm[3] * m[3],
        ctm[0] * m[4] + ctm[2] * m[5] + ctm[4],
        ctm[1] * m[4] + ctm[3] * m[5] + ctm[5],
    ]
}

fn operands_matrix(op: &Operation) -> Option<[f32; 6]> {
    if op.operands.len() < 6 {
        return None;
    }
    let mut m = [0.0f32; 6];
    for (slot, operand) in m.iter_mut().zip(&op.operands) {
        *slot = number_f32(operand)?;
    }
    Some(m)
}

/// Rewrite a content stream so nothing inside the masks survives.
pub(crate) fn process_content_stream(
    content_data: &[u8],
    masks: &[MaskRect],
) -> Result<Vec<u8>, String> {
    let content = Content::decode(content_data).map_err(|e| e.to_string())?;
    let mut new_operations: Vec<Operation> = Vec::new();

    let mut graphics_state_stack: Vec<[f32; 6]> = Vec::new();
    let mut ctm: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut text_matrix: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut line_matrix: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut in_text_object = false;
    let mut font_size: f32 = 12.0;

    for op in content.operations {
        match op.operator.as_str() {
            "q" => {
                graphics_state_stack.push(ctm);
                new_operations.push(op);
            }
            "Q" => {
                if let Some(saved) = graphics_state_stack.pop() {
                    ctm = saved;
                }
                new_operations.push(op);
            }
            "cm" => {
                if let Some(m) = operands_matrix(&op) {
                    ctm = multiply(&ctm, &m);
                }
                new_operations.push(op);
            }
            "BT" => {
                in_text_object = true;
                text_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
                line_matrix = text_matrix;
                new_operations.push(op);
            }
            "ET" => {
                in_text_object = false;
                new_operations.push(op);
            }
            "Tm" if in_text_object => {
                if let Some(m) = operands_matrix(&op) {
                    text_matrix = m;
                    line_matrix = m;
                }
                new_operations.push(op);
            }
            "Td" | "TD" if in_text_object && op.operands.len() >= 2 => {
                if let (Some(tx), Some(ty)) =
                    (number_f32(&op.operands[0]), number_f32(&op.operands[1]))
                {
                    line_matrix[4] += tx;
                    line_matrix[5] += ty;
                    text_matrix = line_matrix;
                }
                new_operations.push(op);
            }
            "Tf" if op.operands.len() >= 2 => {
                if let Some(size) = number_f32(&op.operands[1]) {
                    font_size = size.abs();
                }
                new_operations.push(op);
            }
            "Tj" | "'" if in_text_object => {
                let user_x = ctm[0] * text_matrix[4] + ctm[2] * text_matrix[5] + ctm[4];
                let user_y = ctm[1] * text_matrix[4] + ctm[3] * text_matrix[5] + ctm[5];
                new_operations.push(redact_show_text(op, 0, user_x, user_y, font_size, masks));
            }
            "\"" if in_text_object && op.operands.len() >= 3 => {
                let user_x = ctm[0] * text_matrix[4] + ctm[2] * text_matrix[5] + ctm[4];
                let user_y = ctm[1] * text_matrix[4] + ctm[3] * text_matrix[5] + ctm[5];
                new_operations.push(redact_show_text(op, 2, user_x, user_y, font_size, masks));
            }
            "TJ" if in_text_object => {
                let mut current_x = ctm[0] * text_matrix[4] + ctm[2] * text_matrix[5] + ctm[4];
                let user_y = ctm[1] * text_matrix[4] + ctm[3] * text_matrix[5] + ctm[5];
                let mut new_array: Vec<Object> = Vec::new();
                let mut any_redacted = false;

                if let Some(Object::Array(arr)) = op.operands.first() {
                    for item in arr {
                        match item {
                            Object::String(s, fmt) => {
                                let (redacted, redacted_this) =
                                    redact_text_chars(s, current_x, user_y, font_size, masks);
                                any_redacted |= redacted_this;
                                current_x += estimate_text_width(s, font_size);
                                new_array.push(Object::String(redacted, *fmt));
                            }
                            Object::Integer(n) => {
                                current_x -= (*n as f32) / 1000.0 * font_size;
                                new_array.push(item.clone());
                            }
                            Object::Real(n) => {
                                current_x -= n / 1000.0 * font_size;
                                new_array.push(item.clone());
                            }
                            _ => new_array.push(item.clone()),
                        }
                    }
                }

                if any_redacted {
                    new_operations.push(Operation::new("TJ", vec![Object::Array(new_array)]));
                } else {
                    new_operations.push(op);
                }
            }
            "Do" => {
                // Image/XObject draws inside a mask are removed outright;
                // the placement rectangle is the CTM image of the unit
                // square.
                let (x0, x1) = ordered(ctm[4], ctm[4] + ctm[0]);
                let (y0, y1) = ordered(ctm[5], ctm[5] + ctm[3]);
                let covered = masks.iter().any(|m| m.intersects(x0, y0, x1 - x0, y1 - y0));
                if covered {
                    tracing::debug!("removing xobject draw inside redaction region");
                } else {
                    new_operations.push(op);
                }
            }
            _ => new_operations.push(op),
        }
    }

    Content { operations: new_operations }
        .encode()
        .map_err(|e| e.to_string())
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn redact_show_text(
    op: Operation,
    operand_index: usize,
    user_x: f32,
    user_y: f32,
    font_size: f32,
    masks: &[MaskRect],
) -> Operation {
    let Some(Object::String(text, format)) = op.operands.get(operand_index) else {
        return op;
    };
    let (redacted, any_redacted) = redact_text_chars(text, user_x, user_y, font_size, masks);
    if !any_redacted {
        return op;
    }
    let mut operands = op.operands.clone();
    operands[operand_index] = Object::String(redacted, *format);
    Operation::new(op.operator.as_str(), operands)
}

/// Append opaque black boxes over the masks.
pub(crate) fn paint_opaque_boxes(content_data: &[u8], masks: &[MaskRect]) -> Result<Vec<u8>, String> {
    let content = Content::decode(content_data).map_err(|e| e.to_string())?;
    let mut operations = content.operations;

    operations.push(Operation::new("q", vec![]));
    operations.push(Operation::new(
        "rg",
        vec![Object::Real(0.0), Object::Real(0.0), Object::Real(0.0)],
    ));
    for mask in masks {
        operations.push(Operation::new(
            "re",
            vec![
                Object::Real(mask.x),
                Object::Real(mask.y),
                Object::Real(mask.width),
                Object::Real(mask.height),
            ],
        ));
        operations.push(Operation::new("f", vec![]));
    }
    operations.push(Operation::new("Q", vec![]));

    Content { operations }.encode().map_err(|e| e.to_string())
}

/// Drop annotations whose rectangle intersects a mask. Widget and markup
/// annotations can both carry the content being redacted.
fn remove_intersecting_annotations(doc: &mut Document, page_id: lopdf::ObjectId, masks: &[MaskRect]) {
    let annots: Vec<Object> = match doc.get_object(page_id) {
        Ok(Object::Dictionary(dict)) => match dict.get(b"Annots") {
            Ok(Object::Array(arr)) => arr.clone(),
            Ok(Object::Reference(ref_id)) => match doc.get_object(*ref_id) {
                Ok(Object::Array(arr)) => arr.clone(),
                _ => return,
            },
            _ => return,
        },
        _ => return,
    };

    let mut kept: Vec<Object> = Vec::new();
    for entry in annots {
        let rect = annotation_rect(doc, &entry);
        let covered = rect.is_some_and(|(x0, y0, x1, y1)| {
            masks.iter().any(|m| m.intersects(x0, y0, x1 - x0, y1 - y0))
        });
        if !covered {
            kept.push(entry);
        }
    }

    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
        dict.set(b"Annots", Object::Array(kept));
    }
}

fn annotation_rect(doc: &Document, entry: &Object) -> Option<(f32, f32, f32, f32)> {
    let dict = match entry {
        Object::Reference(ref_id) => match doc.get_object(*ref_id) {
            Ok(Object::Dictionary(dict)) => dict,
            _ => return None,
        },
        Object::Dictionary(dict) => dict,
        _ => return None,
    };
    let Ok(Object::Array(rect)) = dict.get(b"Rect") else {
        return None;
    };
    let values: Vec<f32> = rect.iter().filter_map(number_f32).collect();
    if values.len() != 4 {
        return None;
    }
    let (x0, x1) = ordered(values[0], values[2]);
    let (y0, y1) = ordered(values[1], values[3]);
    Some((x0, y0, x1, y1))
}

/// The Document Edit Provider: loads the source, destroys content under
/// every target, paints the boxes, and writes to `output`. The source
/// file is never touched.
#[derive(Debug, Clone, Default)]
pub struct OpaqueBoxEditor;

impl DocumentEditProvider for OpaqueBoxEditor {
    fn apply_redactions(
        &self,
        source: &Path,
        targets: &[RedactionTarget],
        output: &Path,
    ) -> Result<(), ProviderError> {
        let mut doc = Document::load(source)
            .map_err(|e| ProviderError::Document(format!("{}: {}", source.display(), e)))?;
        let pages = doc.get_pages();

        let mut by_page: BTreeMap<u32, Vec<RedactionTarget>> = BTreeMap::new();
        for target in targets {
            by_page.entry(target.page()).or_default().push(*target);
        }

        for (page_number, page_targets) in &by_page {
            let Some(page_id) = pages.get(page_number).copied() else {
                return Err(ProviderError::Document(format!(
                    "page {} does not exist in {}",
                    page_number,
                    source.display()
                )));
            };

            let bounds = page_box(&doc, page_id);
            let masks: Vec<MaskRect> = page_targets
                .iter()
                .map(|target| to_mask(target, bounds))
                .collect();

            tracing::info!(page = page_number, regions = masks.len(), "redacting page");

            let content = page_content(&doc, page_id).map_err(ProviderError::Document)?;
            let destroyed =
                process_content_stream(&content, &masks).map_err(ProviderError::Document)?;
            let painted = paint_opaque_boxes(&destroyed, &masks).map_err(ProviderError::Document)?;
            replace_page_content(&mut doc, page_id, painted).map_err(ProviderError::Document)?;
            remove_intersecting_annotations(&mut doc, page_id, &masks);
        }

        doc.compress();
        doc.save(output)
            .map_err(|e| ProviderError::Document(format!("{}: {}", output.display(), e)))?;
        Ok(())
    }
}
