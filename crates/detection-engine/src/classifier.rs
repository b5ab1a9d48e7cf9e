//! Stage 1 of detection: what is sensitive, independent of where.

use serde::Deserialize;

use shared_types::{infer_structured, ExtractionSet, GuidanceList, InferenceRequest, ReasoningProvider};

/// One value the classifier flagged. `content` is a literal span of the
/// source text; the mapper depends on that to locate it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassifiedValue {
    pub content: String,
    pub page: u32,
    pub rationale: String,
}

#[derive(Debug, Default, Deserialize)]
struct ClassifierResponse {
    #[serde(default)]
    items: Vec<ClassifierItem>,
}

#[derive(Debug, Deserialize)]
struct ClassifierItem {
    #[serde(default)]
    sensitive_content: String,
    #[serde(default = "default_page")]
    page_number: u32,
    #[serde(default)]
    reason: String,
}

fn default_page() -> u32 {
    1
}

const CLASSIFY_INSTRUCTION: &str = "You identify sensitive information in document text. \
Interpret the guidance EXPANSIVELY to maximize recall: flagging too much is acceptable, \
missing sensitive data is not. A human reviews and rejects false positives later.\n\
Extract the EXACT sensitive VALUES as they appear in the text, never paraphrases, \
with the page number each one appears on and a short reason.";

fn classify_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "sensitive_content": { "type": "string" },
                        "page_number": { "type": "integer" },
                        "reason": { "type": "string" }
                    },
                    "required": ["sensitive_content", "page_number", "reason"]
                }
            }
        },
        "required": ["items"]
    })
}

/// Classify sensitive values in the content pass against the guidance.
///
/// Empty guidance or empty extraction is a valid no-findings case, and a
/// provider failure degrades to the same: an empty list, never an error.
pub async fn classify_content(
    provider: &dyn ReasoningProvider,
    extraction: &ExtractionSet,
    guidance: &GuidanceList,
) -> Vec<ClassifiedValue> {
    if guidance.is_empty() || extraction.is_empty() {
        return Vec::new();
    }

    let payload = format!(
        "Guidance for sensitive data detection:\n{}\n\nDocument text:\n{}",
        guidance.joined(),
        extraction.page_text()
    );
    let request = InferenceRequest {
        instruction: CLASSIFY_INSTRUCTION.to_string(),
        payload,
        schema: classify_schema(),
    };

    let response: ClassifierResponse = match infer_structured(provider, request).await {
        Ok(response) => response,
        Err(error) => {
            tracing::warn!(%error, "content classification failed; treating as no findings");
            return Vec::new();
        }
    };

    let values: Vec<ClassifiedValue> = response
        .items
        .into_iter()
        .filter(|item| !item.sensitive_content.trim().is_empty())
        .map(|item| ClassifiedValue {
            content: item.sensitive_content,
            page: item.page_number,
            rationale: item.reason,
        })
        .collect();

    tracing::info!(values = values.len(), "content classification complete");
    values
}
