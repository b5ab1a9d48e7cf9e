//! Stage 2 of detection: resolve classified values to word coordinates.

use std::collections::HashMap;

use serde::Deserialize;

use shared_types::{
    infer_structured, BoundingBox, ExtractedElement, ExtractionSet, InferenceRequest,
    ReasoningProvider, SensitiveRegion,
};

use crate::classifier::ClassifiedValue;

/// Mapped regions plus the values that could not be located. Unmapped
/// values are surfaced, not silently lost; they cannot be redacted but
/// the reviewer should know they exist.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MappingOutcome {
    pub regions: Vec<SensitiveRegion>,
    pub unmapped: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MapperResponse {
    #[serde(default)]
    items: Vec<MappedItem>,
}

#[derive(Debug, Deserialize)]
struct MappedItem {
    #[serde(default)]
    content: String,
    #[serde(default)]
    page_number: u32,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    element_ids: Vec<String>,
}

const MAP_INSTRUCTION: &str = "You map sensitive values to word-level element ids.\n\
MAPPING RULES:\n\
- Map ONLY the sensitive VALUE words, never field labels.\n\
- Example: for value 'N0004705512' next to 'SEVIS ID:', return only the id \
of the 'N0004705512' word, never 'SEVIS' or 'ID:'.\n\
- For multi-word values include the ids of ALL words of the value, in reading order.\n\
- Skip a value entirely if its words do not appear in the catalog.\n\
For each value return the exact content, its page, the reason, and the covering element ids.";

fn map_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "content": { "type": "string" },
                        "page_number": { "type": "integer" },
                        "reason": { "type": "string" },
                        "element_ids": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": ["content", "page_number", "reason", "element_ids"]
                }
            }
        },
        "required": ["items"]
    })
}

/// Resolve each classified value to a single region covering exactly the
/// value's words.
///
/// The provider proposes element ids, but the proposal is not trusted:
/// ids are validated against the cached layout pass, and any proposed
/// element whose text does not occur inside the value is discarded. That
/// guard is what keeps labels like "ID:" out of the region even when the
/// provider over-selects.
pub async fn map_to_regions(
    provider: &dyn ReasoningProvider,
    values: &[ClassifiedValue],
    extraction: &ExtractionSet,
) -> MappingOutcome {
    if values.is_empty() {
        return MappingOutcome::default();
    }

    let values_listing = values
        .iter()
        .map(|v| format!("Page {}: '{}' (reason: {})", v.page, v.content, v.rationale))
        .collect::<Vec<_>>()
        .join("\n");
    let payload = format!(
        "Sensitive values to locate:\n{}\n\nWord elements:\n{}",
        values_listing,
        extraction.word_catalog()
    );
    let request = InferenceRequest {
        instruction: MAP_INSTRUCTION.to_string(),
        payload,
        schema: map_schema(),
    };

    let response: MapperResponse = match infer_structured(provider, request).await {
        Ok(response) => response,
        Err(error) => {
            tracing::warn!(%error, "coordinate mapping failed; no regions produced");
            return MappingOutcome {
                regions: Vec::new(),
                unmapped: values.iter().map(|v| v.content.clone()).collect(),
            };
        }
    };

    let words = extraction.words_by_id();
    let mut outcome = MappingOutcome::default();
    let mut mapped_contents: Vec<String> = Vec::new();

    for item in response.items {
        match resolve_region(&item, &words) {
            Some(region) => {
                mapped_contents.push(item.content.clone());
                outcome.regions.push(region);
            }
            None => {
                tracing::warn!(content = %item.content, "classified value has no resolvable coordinates");
                if !item.content.trim().is_empty() {
                    outcome.unmapped.push(item.content);
                }
            }
        }
    }

    // Values the provider never answered for are unmapped too.
    for value in values {
        if !mapped_contents.iter().any(|c| c == &value.content)
            && !outcome.unmapped.contains(&value.content)
        {
            tracing::warn!(content = %value.content, "classified value missing from mapper response");
            outcome.unmapped.push(value.content.clone());
        }
    }

    tracing::info!(
        regions = outcome.regions.len(),
        unmapped = outcome.unmapped.len(),
        "coordinate mapping complete"
    );
    outcome
}

fn resolve_region(
    item: &MappedItem,
    words: &HashMap<&str, &ExtractedElement>,
) -> Option<SensitiveRegion> {
    let mut boxes: Vec<BoundingBox> = Vec::new();
    let mut page: Option<u32> = None;

    for id in &item.element_ids {
        let Some(element) = words.get(id.as_str()) else {
            continue;
        };
        // Containment guard: only words that actually occur inside the
        // value may contribute to the region. Adjacent labels fail this.
        if !word_in_value(&element.text, &item.content) {
            tracing::debug!(id = %element.id, word = %element.text, value = %item.content,
                "dropping proposed element outside the value");
            continue;
        }
        // One region covers one page; the first matched element anchors
        // it and stray proposals on other pages are dropped.
        if let Some(anchor) = page {
            if anchor != element.page {
                tracing::debug!(id = %element.id, page = element.page, anchor,
                    "dropping proposed element on another page");
                continue;
            }
        } else {
            page = Some(element.page);
        }
        boxes.push(element.bbox);
    }

    let merged = boxes
        .into_iter()
        .reduce(|acc, b| acc.union(&b))?;

    Some(SensitiveRegion {
        page: page.unwrap_or(item.page_number),
        content: item.content.clone(),
        rationale: item.reason.clone(),
        bbox: merged,
    })
}

/// Whether a word element's text is part of the value. The word is
/// trimmed of surrounding punctuation and must occur in the value at
/// token boundaries: "Smith," matches "John Smith" and "6789" matches
/// "123-45-6789", but a label like "ID:" never matches "IDAHO-REG-7"
/// even though "ID" is a prefix of it.
fn word_in_value(word: &str, value: &str) -> bool {
    let trimmed = trim_punctuation(word);
    if trimmed.is_empty() {
        return false;
    }
    occurs_at_token_boundary(value, trimmed)
}

/// Substring search refusing occurrences glued to an alphanumeric
/// neighbor on either side.
fn occurs_at_token_boundary(value: &str, token: &str) -> bool {
    let mut from = 0;
    while let Some(offset) = value[from..].find(token) {
        let begin = from + offset;
        let end = begin + token.len();
        let glued_left = value[..begin]
            .chars()
            .next_back()
            .is_some_and(char::is_alphanumeric);
        let glued_right = value[end..].chars().next().is_some_and(char::is_alphanumeric);
        if !glued_left && !glued_right {
            return true;
        }
        match value[begin..].chars().next() {
            Some(c) => from = begin + c.len_utf8(),
            None => break,
        }
    }
    false
}

fn trim_punctuation(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use shared_types::{Granularity, ProviderError};

    struct CannedReasoning(serde_json::Value);

    #[async_trait]
    impl ReasoningProvider for CannedReasoning {
        async fn infer(
            &self,
            _request: InferenceRequest,
        ) -> Result<serde_json::Value, ProviderError> {
            Ok(self.0.clone())
        }
    }

    struct FailingReasoning;

    #[async_trait]
    impl ReasoningProvider for FailingReasoning {
        async fn infer(
            &self,
            _request: InferenceRequest,
        ) -> Result<serde_json::Value, ProviderError> {
            Err(ProviderError::Request("model unavailable".to_string()))
        }
    }

    fn word(id: &str, text: &str, x0: f64) -> ExtractedElement {
        ExtractedElement {
            id: id.to_string(),
            page: 1,
            text: text.to_string(),
            bbox: BoundingBox::new(x0, 100.0, x0 + 40.0, 112.0),
            granularity: Granularity::Word,
        }
    }

    fn sevis_extraction() -> ExtractionSet {
        ExtractionSet {
            content: vec![word("para_1_0", "SEVIS ID: N0004705512", 10.0)],
            layout: vec![
                word("word_1_0", "SEVIS", 10.0),
                word("word_1_1", "ID:", 60.0),
                word("word_1_2", "N0004705512", 110.0),
            ],
        }
    }

    fn value(content: &str) -> ClassifiedValue {
        ClassifiedValue {
            content: content.to_string(),
            page: 1,
            rationale: "identifier".to_string(),
        }
    }

    #[tokio::test]
    async fn test_maps_value_to_its_word_only() {
        let provider = CannedReasoning(serde_json::json!({
            "items": [{
                "content": "N0004705512",
                "page_number": 1,
                "reason": "identifier",
                "element_ids": ["word_1_2"],
            }]
        }));
        let outcome =
            map_to_regions(&provider, &[value("N0004705512")], &sevis_extraction()).await;
        assert_eq!(outcome.regions.len(), 1);
        assert_eq!(outcome.regions[0].bbox, BoundingBox::new(110.0, 100.0, 150.0, 112.0));
        assert!(outcome.unmapped.is_empty());
    }

    #[tokio::test]
    async fn test_containment_guard_rejects_label_words() {
        // Provider over-selects all three ids; only the value survives.
        let provider = CannedReasoning(serde_json::json!({
            "items": [{
                "content": "N0004705512",
                "page_number": 1,
                "reason": "identifier",
                "element_ids": ["word_1_0", "word_1_1", "word_1_2"],
            }]
        }));
        let outcome =
            map_to_regions(&provider, &[value("N0004705512")], &sevis_extraction()).await;
        assert_eq!(outcome.regions.len(), 1);
        assert_eq!(outcome.regions[0].bbox, BoundingBox::new(110.0, 100.0, 150.0, 112.0));
    }

    #[tokio::test]
    async fn test_label_prefixing_the_value_is_rejected() {
        // "ID:" trims to "ID", which is a prefix of "IDAHO-REG-7" but
        // not a whole token of it. The label's box must not widen the
        // region leftward.
        let extraction = ExtractionSet {
            content: vec![word("para_1_0", "ID: IDAHO-REG-7", 10.0)],
            layout: vec![
                word("word_1_0", "ID:", 10.0),
                word("word_1_1", "IDAHO-REG-7", 110.0),
            ],
        };
        let provider = CannedReasoning(serde_json::json!({
            "items": [{
                "content": "IDAHO-REG-7",
                "page_number": 1,
                "reason": "registration number",
                "element_ids": ["word_1_0", "word_1_1"],
            }]
        }));
        let outcome = map_to_regions(&provider, &[value("IDAHO-REG-7")], &extraction).await;
        assert_eq!(outcome.regions.len(), 1);
        assert_eq!(outcome.regions[0].bbox, BoundingBox::new(110.0, 100.0, 150.0, 112.0));
    }

    #[tokio::test]
    async fn test_ocr_sub_tokens_of_a_hyphenated_value_still_match() {
        // OCR sometimes splits "123-45-6789" across elements; pieces
        // that sit on token boundaries inside the value still map.
        let extraction = ExtractionSet {
            content: vec![word("para_1_0", "SSN: 123-45-6789", 10.0)],
            layout: vec![
                word("word_1_0", "SSN:", 10.0),
                word("word_1_1", "123-45-", 60.0),
                word("word_1_2", "6789", 110.0),
            ],
        };
        let provider = CannedReasoning(serde_json::json!({
            "items": [{
                "content": "123-45-6789",
                "page_number": 1,
                "reason": "social security number",
                "element_ids": ["word_1_1", "word_1_2"],
            }]
        }));
        let outcome = map_to_regions(&provider, &[value("123-45-6789")], &extraction).await;
        assert_eq!(outcome.regions[0].bbox, BoundingBox::new(60.0, 100.0, 150.0, 112.0));
    }

    #[tokio::test]
    async fn test_region_pinned_to_first_matched_page() {
        // The same text recurring on a later page must not stretch one
        // region across pages; the first match anchors the page.
        let mut later = word("word_2_0", "N0004705512", 400.0);
        later.page = 2;
        let mut extraction = sevis_extraction();
        extraction.layout.push(later);
        let provider = CannedReasoning(serde_json::json!({
            "items": [{
                "content": "N0004705512",
                "page_number": 1,
                "reason": "identifier",
                "element_ids": ["word_1_2", "word_2_0"],
            }]
        }));
        let outcome =
            map_to_regions(&provider, &[value("N0004705512")], &extraction).await;
        assert_eq!(outcome.regions.len(), 1);
        assert_eq!(outcome.regions[0].page, 1);
        assert_eq!(outcome.regions[0].bbox, BoundingBox::new(110.0, 100.0, 150.0, 112.0));
    }

    #[tokio::test]
    async fn test_multiword_value_union_box() {
        let extraction = ExtractionSet {
            content: vec![word("para_1_0", "Name: John Smith", 10.0)],
            layout: vec![
                word("word_1_0", "Name:", 10.0),
                word("word_1_1", "John", 60.0),
                word("word_1_2", "Smith,", 110.0),
            ],
        };
        let provider = CannedReasoning(serde_json::json!({
            "items": [{
                "content": "John Smith",
                "page_number": 1,
                "reason": "person name",
                "element_ids": ["word_1_1", "word_1_2"],
            }]
        }));
        let outcome = map_to_regions(&provider, &[value("John Smith")], &extraction).await;
        assert_eq!(outcome.regions[0].bbox, BoundingBox::new(60.0, 100.0, 150.0, 112.0));
    }

    #[tokio::test]
    async fn test_unresolvable_value_is_reported_not_fatal() {
        let provider = CannedReasoning(serde_json::json!({
            "items": [{
                "content": "not in document",
                "page_number": 1,
                "reason": "ghost",
                "element_ids": ["word_9_9"],
            }]
        }));
        let outcome =
            map_to_regions(&provider, &[value("not in document")], &sevis_extraction()).await;
        assert_eq!(outcome.regions, vec![]);
        assert_eq!(outcome.unmapped, vec!["not in document".to_string()]);
    }

    #[tokio::test]
    async fn test_values_omitted_by_provider_count_as_unmapped() {
        let provider = CannedReasoning(serde_json::json!({ "items": [] }));
        let outcome =
            map_to_regions(&provider, &[value("N0004705512")], &sevis_extraction()).await;
        assert_eq!(outcome.unmapped, vec!["N0004705512".to_string()]);
    }

    #[tokio::test]
    async fn test_provider_failure_reports_everything_unmapped() {
        let outcome =
            map_to_regions(&FailingReasoning, &[value("N0004705512")], &sevis_extraction()).await;
        assert_eq!(outcome.regions, vec![]);
        assert_eq!(outcome.unmapped.len(), 1);
    }

    #[tokio::test]
    async fn test_no_values_no_call() {
        let outcome = map_to_regions(&FailingReasoning, &[], &sevis_extraction()).await;
        assert_eq!(outcome, MappingOutcome::default());
    }
}
