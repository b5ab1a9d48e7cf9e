//! Detection quality review.

use serde::Deserialize;

use shared_types::{
    infer_structured, ExtractionSet, GuidanceList, InferenceRequest, ReasoningProvider,
    SensitiveRegion,
};

/// The reviewer's verdict on one detection pass. Loop bookkeeping (cycle
/// counting, the ceiling) lives with the pipeline; this is only the
/// quality judgment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EvaluationVerdict {
    #[serde(default)]
    pub issues_found: bool,
    #[serde(default)]
    pub missing_sensitive_data: Vec<String>,
    #[serde(default)]
    pub incorrect_detections: Vec<String>,
    #[serde(default)]
    pub feedback_message: String,
}

impl EvaluationVerdict {
    /// Whether this verdict should trigger another detection pass.
    pub fn requests_rerun(&self) -> bool {
        self.issues_found && !self.feedback_message.trim().is_empty()
    }
}

const REVIEW_INSTRUCTION: &str = "You evaluate sensitive data detection quality.\n\
Find FALSE NEGATIVES: sensitive data in the document matching the guidance that was \
not detected. Find FALSE POSITIVES: detected items not actually sensitive per the \
guidance. If significant issues exist, set issues_found and write one specific \
feedback_message the detector can act on; otherwise report no issues.";

fn review_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "issues_found": { "type": "boolean" },
            "missing_sensitive_data": { "type": "array", "items": { "type": "string" } },
            "incorrect_detections": { "type": "array", "items": { "type": "string" } },
            "feedback_message": { "type": "string" }
        },
        "required": ["issues_found", "feedback_message"]
    })
}

/// Compare guidance, source content, and current detections.
///
/// A provider failure is an accepting verdict: the pipeline degrades
/// forward to the human gate rather than blocking on a flaky reviewer.
pub async fn review_detections(
    provider: &dyn ReasoningProvider,
    guidance: &GuidanceList,
    extraction: &ExtractionSet,
    regions: &[SensitiveRegion],
) -> EvaluationVerdict {
    let detected = regions
        .iter()
        .map(|r| format!("Page {}: '{}' (reason: {})", r.page, r.content, r.rationale))
        .collect::<Vec<_>>()
        .join("\n");
    let payload = format!(
        "Detection guidance:\n{}\n\nDocument text:\n{}\n\nDetected items:\n{}",
        guidance.joined(),
        extraction.page_text(),
        if detected.is_empty() { "(none)" } else { &detected }
    );
    let request = InferenceRequest {
        instruction: REVIEW_INSTRUCTION.to_string(),
        payload,
        schema: review_schema(),
    };

    match infer_structured(provider, request).await {
        Ok(verdict) => verdict,
        Err(error) => {
            tracing::warn!(%error, "evaluation failed; accepting current detections");
            EvaluationVerdict::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use shared_types::{BoundingBox, ExtractedElement, Granularity, ProviderError};

    struct CannedReasoning(Result<serde_json::Value, String>);

    #[async_trait]
    impl ReasoningProvider for CannedReasoning {
        async fn infer(
            &self,
            _request: InferenceRequest,
        ) -> Result<serde_json::Value, ProviderError> {
            self.0
                .clone()
                .map_err(|message| ProviderError::Request(message))
        }
    }

    fn extraction() -> ExtractionSet {
        let element = ExtractedElement {
            id: "para_1_0".to_string(),
            page: 1,
            text: "SSN: 123-45-6789".to_string(),
            bbox: BoundingBox::new(0.0, 0.0, 100.0, 12.0),
            granularity: Granularity::Paragraph,
        };
        ExtractionSet { content: vec![element.clone()], layout: vec![element] }
    }

    #[tokio::test]
    async fn test_issue_verdict_requests_rerun() {
        let provider = CannedReasoning(Ok(serde_json::json!({
            "issues_found": true,
            "missing_sensitive_data": ["123-45-6789"],
            "incorrect_detections": [],
            "feedback_message": "Also flag social security numbers in the footer.",
        })));
        let verdict = review_detections(
            &provider,
            &GuidanceList::from_items(["redact SSNs"]),
            &extraction(),
            &[],
        )
        .await;
        assert!(verdict.requests_rerun());
        assert_eq!(verdict.missing_sensitive_data.len(), 1);
    }

    #[tokio::test]
    async fn test_clean_verdict_accepts() {
        let provider = CannedReasoning(Ok(serde_json::json!({
            "issues_found": false,
            "feedback_message": "",
        })));
        let verdict = review_detections(
            &provider,
            &GuidanceList::from_items(["redact SSNs"]),
            &extraction(),
            &[],
        )
        .await;
        assert!(!verdict.requests_rerun());
    }

    #[tokio::test]
    async fn test_issues_without_feedback_do_not_rerun() {
        let provider = CannedReasoning(Ok(serde_json::json!({
            "issues_found": true,
            "feedback_message": "   ",
        })));
        let verdict = review_detections(
            &provider,
            &GuidanceList::from_items(["redact SSNs"]),
            &extraction(),
            &[],
        )
        .await;
        assert!(!verdict.requests_rerun());
    }

    #[tokio::test]
    async fn test_provider_failure_accepts_current_state() {
        let provider = CannedReasoning(Err("reviewer down".to_string()));
        let verdict = review_detections(
            &provider,
            &GuidanceList::from_items(["redact SSNs"]),
            &extraction(),
            &[],
        )
        .await;
        assert_eq!(verdict, EvaluationVerdict::default());
        assert!(!verdict.requests_rerun());
    }
}
