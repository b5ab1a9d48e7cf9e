//! Native page geometry read straight from the PDF.

use std::path::Path;

use lopdf::{Document, Object};

use shared_types::PageDimensions;

use crate::ExtractionError;

/// Native size of every page, in points, ordered by page number.
/// CropBox (the visible area) wins over MediaBox; both inherit from the
/// parent page tree node when absent.
pub fn native_page_dimensions(document: &Path) -> Result<Vec<PageDimensions>, ExtractionError> {
    let doc = Document::load(document)
        .map_err(|e| ExtractionError::PageGeometry(format!("{}: {}", document.display(), e)))?;

    let mut dimensions = Vec::new();
    for (_number, page_id) in doc.get_pages() {
        let (llx, lly, urx, ury) = page_box(&doc, page_id);
        dimensions.push(PageDimensions::new((urx - llx).abs(), (ury - lly).abs()));
    }

    if dimensions.is_empty() {
        return Err(ExtractionError::PageGeometry(format!(
            "{}: document has no pages",
            document.display()
        )));
    }
    Ok(dimensions)
}

/// Effective page rectangle as (llx, lly, urx, ury). Falls back to Letter
/// when neither box is present anywhere up the tree.
pub fn page_box(doc: &Document, page_id: lopdf::ObjectId) -> (f64, f64, f64, f64) {
    dict_box(doc, page_id, b"CropBox")
        .or_else(|| dict_box(doc, page_id, b"MediaBox"))
        .unwrap_or((0.0, 0.0, 612.0, 792.0))
}

fn dict_box(doc: &Document, page_id: lopdf::ObjectId, key: &[u8]) -> Option<(f64, f64, f64, f64)> {
    let mut current = page_id;
    loop {
        let Ok(Object::Dictionary(dict)) = doc.get_object(current) else {
            return None;
        };
        if let Ok(Object::Array(arr)) = dict.get(key) {
            if let Some(values) = box_values(arr) {
                return Some(values);
            }
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => return None,
        }
    }
}

fn box_values(arr: &[Object]) -> Option<(f64, f64, f64, f64)> {
    let values: Vec<f64> = arr
        .iter()
        .filter_map(|o| match o {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(f64::from(*r)),
            _ => None,
        })
        .collect();
    if values.len() == 4 {
        Some((values[0], values[1], values[2], values[3]))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};
    use pretty_assertions::assert_eq;

    fn single_page_pdf(dir: &Path, media: [i64; 4], crop: Option<[i64; 4]>) -> std::path::PathBuf {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => media.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
        };
        if let Some(crop) = crop {
            page.set(
                "CropBox",
                crop.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
            );
        }
        let page_id = doc.add_object(page);
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let path = dir.join("geometry.pdf");
        doc.save(&path).unwrap();
        path
    }

    #[test]
    fn test_media_box_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = single_page_pdf(dir.path(), [0, 0, 612, 792], None);
        let dims = native_page_dimensions(&path).unwrap();
        assert_eq!(dims, vec![PageDimensions::new(612.0, 792.0)]);
    }

    #[test]
    fn test_crop_box_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let path = single_page_pdf(dir.path(), [0, 0, 612, 792], Some([0, 0, 595, 842]));
        let dims = native_page_dimensions(&path).unwrap();
        assert_eq!(dims, vec![PageDimensions::new(595.0, 842.0)]);
    }

    #[test]
    fn test_missing_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = native_page_dimensions(&dir.path().join("nope.pdf"));
        assert!(matches!(result, Err(ExtractionError::PageGeometry(_))));
    }
}
