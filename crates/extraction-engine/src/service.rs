//! The dual extraction pass: both modalities or nothing.

use std::path::Path;
use std::sync::Arc;

use shared_types::{
    ExtractedElement, ExtractionMode, ExtractionSet, PageDimensions, RawPage, TextExtractionProvider,
};

use crate::normalize::polygon_to_box_points;
use crate::pages::native_page_dimensions;
use crate::ExtractionError;

/// Runs the content and layout passes concurrently against one provider
/// and normalizes both into page-point space.
///
/// Detection needs both modalities: the content pass for what the document
/// says, the layout pass for where each word sits. A run with only one of
/// the two cannot produce redactable regions, so either pass failing or
/// coming back empty fails the whole extraction.
pub struct DualExtractionService {
    provider: Arc<dyn TextExtractionProvider>,
}

impl DualExtractionService {
    pub fn new(provider: Arc<dyn TextExtractionProvider>) -> Self {
        Self { provider }
    }

    /// Extract both passes for `document`. The result is cached by the
    /// caller for the life of the run; evaluation cycles never re-extract.
    pub async fn extract(&self, document: &Path) -> Result<ExtractionSet, ExtractionError> {
        if !document.exists() {
            return Err(ExtractionError::DocumentNotFound(
                document.display().to_string(),
            ));
        }

        let native = native_page_dimensions(document)?;

        tracing::info!(document = %document.display(), pages = native.len(), "starting dual extraction");

        let content_pass = self.run_pass(document, ExtractionMode::Content);
        let layout_pass = self.run_pass(document, ExtractionMode::Layout);
        let (content_pages, layout_pages) = tokio::try_join!(content_pass, layout_pass)?;

        let set = ExtractionSet {
            content: normalize_pages(&content_pages, &native),
            layout: normalize_pages(&layout_pages, &native),
        };

        if set.content.is_empty() {
            return Err(ExtractionError::EmptyPass { mode: ExtractionMode::Content });
        }
        if set.layout.is_empty() {
            return Err(ExtractionError::EmptyPass { mode: ExtractionMode::Layout });
        }

        tracing::info!(
            content_elements = set.content.len(),
            layout_elements = set.layout.len(),
            "dual extraction complete"
        );
        Ok(set)
    }

    async fn run_pass(
        &self,
        document: &Path,
        mode: ExtractionMode,
    ) -> Result<Vec<RawPage>, ExtractionError> {
        self.provider
            .extract(document, mode)
            .await
            .map_err(|source| ExtractionError::PassFailed { mode, source })
    }
}

fn normalize_pages(pages: &[RawPage], native: &[PageDimensions]) -> Vec<ExtractedElement> {
    let mut elements = Vec::new();
    for page in pages {
        // Pages past the native geometry keep reported coordinates as-is.
        let native_dims = native
            .get(page.number.saturating_sub(1) as usize)
            .copied()
            .unwrap_or(page.dimensions);
        let mut index = 0;
        for span in &page.spans {
            if span.text.trim().is_empty() {
                continue;
            }
            elements.push(ExtractedElement {
                id: ExtractedElement::element_id(span.granularity, page.number, index),
                page: page.number,
                text: span.text.clone(),
                bbox: polygon_to_box_points(&span.polygon, page.unit, page.dimensions, native_dims),
                granularity: span.granularity,
            });
            index += 1;
        }
    }
    elements
}
