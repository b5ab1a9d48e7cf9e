//! Low-level lopdf helpers shared by the editor and the preview writer.

use lopdf::{Document, Object, Stream};

/// Effective page rectangle (llx, lly, urx, ury). CropBox wins over
/// MediaBox; both inherit through Parent. Letter when neither exists.
pub fn page_box(doc: &Document, page_id: lopdf::ObjectId) -> (f64, f64, f64, f64) {
    inherited_box(doc, page_id, b"CropBox")
        .or_else(|| inherited_box(doc, page_id, b"MediaBox"))
        .unwrap_or((0.0, 0.0, 612.0, 792.0))
}

fn inherited_box(doc: &Document, page_id: lopdf::ObjectId, key: &[u8]) -> Option<(f64, f64, f64, f64)> {
    let mut current = page_id;
    loop {
        let Ok(Object::Dictionary(dict)) = doc.get_object(current) else {
            return None;
        };
        if let Ok(Object::Array(arr)) = dict.get(key) {
            let values: Vec<f64> = arr.iter().filter_map(number).collect();
            if values.len() == 4 {
                return Some((values[0], values[1], values[2], values[3]));
            }
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => return None,
        }
    }
}

pub fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

pub fn number_f32(obj: &Object) -> Option<f32> {
    number(obj).map(|n| n as f32)
}

fn stream_content(stream: &Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

/// Concatenated content stream bytes for one page. Handles a direct
/// stream, a reference, and an array of references.
pub fn page_content(doc: &Document, page_id: lopdf::ObjectId) -> Result<Vec<u8>, String> {
    let Ok(Object::Dictionary(dict)) = doc.get_object(page_id) else {
        return Err("page object is not a dictionary".to_string());
    };
    let Ok(contents) = dict.get(b"Contents") else {
        return Ok(Vec::new());
    };
    match contents {
        Object::Reference(ref_id) => match doc.get_object(*ref_id) {
            Ok(Object::Stream(stream)) => Ok(stream_content(stream)),
            _ => Ok(Vec::new()),
        },
        Object::Stream(stream) => Ok(stream_content(stream)),
        Object::Array(arr) => {
            let mut all = Vec::new();
            for item in arr {
                if let Object::Reference(ref_id) = item {
                    if let Ok(Object::Stream(stream)) = doc.get_object(*ref_id) {
                        all.extend(stream_content(stream));
                        all.push(b'\n');
                    }
                }
            }
            Ok(all)
        }
        _ => Ok(Vec::new()),
    }
}

/// Replace a page's content with a single new stream.
pub fn replace_page_content(
    doc: &mut Document,
    page_id: lopdf::ObjectId,
    data: Vec<u8>,
) -> Result<(), String> {
    let stream_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), data));
    match doc.get_object_mut(page_id) {
        Ok(Object::Dictionary(dict)) => {
            dict.set(b"Contents", Object::Reference(stream_id));
            Ok(())
        }
        _ => Err("page object is not a dictionary".to_string()),
    }
}
