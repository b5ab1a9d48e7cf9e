//! Summarize lookup sources into detection guidance items.

use serde::Deserialize;

use shared_types::{
    infer_structured, InferenceRequest, KnowledgeSource, LookupFilters, ReasoningProvider,
};

#[derive(Debug, Default, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    sensitive_descriptions: Vec<String>,
}

const SUMMARIZE_INSTRUCTION: &str = "You are a compliance analyst. Given a search query, \
optional industry and jurisdiction, and a list of regulatory sources, produce 1-3 concise \
sensitive data descriptions (categories or rules) to guide detection in documents.";

fn summary_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "sensitive_descriptions": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["sensitive_descriptions"]
    })
}

/// Turn lookup sources into guidance items. Failure yields an empty list;
/// the caller proceeds with guidance unchanged.
pub async fn summarize_sources(
    provider: &dyn ReasoningProvider,
    query: &str,
    filters: &LookupFilters,
    sources: &[KnowledgeSource],
) -> Vec<String> {
    if sources.is_empty() {
        return Vec::new();
    }

    let citations = sources
        .iter()
        .map(|s| match &s.excerpt {
            Some(excerpt) => format!("- {}: {} ({})", s.name, s.url, excerpt),
            None => format!("- {}: {}", s.name, s.url),
        })
        .collect::<Vec<_>>()
        .join("\n");
    let payload = format!(
        "Query: {}\nIndustry: {}\nJurisdiction: {}\nSources:\n{}",
        query,
        filters.industry.as_deref().unwrap_or(""),
        filters.jurisdiction.as_deref().unwrap_or(""),
        citations
    );
    let request = InferenceRequest {
        instruction: SUMMARIZE_INSTRUCTION.to_string(),
        payload,
        schema: summary_schema(),
    };

    let response: SummaryResponse = match infer_structured(provider, request).await {
        Ok(response) => response,
        Err(error) => {
            tracing::warn!(%error, "source summarization failed; guidance unchanged");
            return Vec::new();
        }
    };

    response
        .sensitive_descriptions
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use shared_types::ProviderError;

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

    fn sources() -> Vec<KnowledgeSource> {
        vec![KnowledgeSource {
            name: "HHS (HIPAA)".to_string(),
            url: "https://www.hhs.gov/hipaa/index.html".to_string(),
            excerpt: None,
        }]
    }

    #[tokio::test]
    async fn test_summarizes_into_trimmed_items() {
        let provider = CannedReasoning(Ok(serde_json::json!({
            "sensitive_descriptions": ["  redact patient identifiers ", "", "redact diagnoses"]
        })));
        let filters = LookupFilters {
            industry: Some("healthcare".to_string()),
            jurisdiction: Some("US".to_string()),
        };
        let items = summarize_sources(&provider, "hipaa phi", &filters, &sources()).await;
        assert_eq!(items, vec!["redact patient identifiers", "redact diagnoses"]);
    }

    #[tokio::test]
    async fn test_no_sources_no_call() {
        let provider = CannedReasoning(Err("should not be called".to_string()));
        let items =
            summarize_sources(&provider, "query", &LookupFilters::default(), &[]).await;
        assert_eq!(items, Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_failure_degrades_to_empty() {
        let provider = CannedReasoning(Err("model down".to_string()));
        let items =
            summarize_sources(&provider, "query", &LookupFilters::default(), &sources()).await;
        assert_eq!(items, Vec::<String>::new());
    }
}
