//! HTTP client for a document-analysis extraction service.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use shared_types::{
    ExtractionMode, Granularity, PageDimensions, ProviderError, RawPage, RawSpan, SourceUnit,
    TextExtractionProvider,
};

const CONTENT_MODEL: &str = "prebuilt-read";
const LAYOUT_MODEL: &str = "prebuilt-layout";

/// Text Extraction Provider backed by an analyze endpoint.
///
/// The document body is POSTed as raw PDF bytes; the mode selects the
/// analysis model. The gateway is expected to block until analysis is
/// complete and answer with the full result.
#[derive(Debug, Clone)]
pub struct DocIntelClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl DocIntelClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn model_for(mode: ExtractionMode) -> &'static str {
        match mode {
            ExtractionMode::Content => CONTENT_MODEL,
            ExtractionMode::Layout => LAYOUT_MODEL,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    pages: Vec<AnalyzedPage>,
}

#[derive(Debug, Deserialize)]
struct AnalyzedPage {
    #[serde(rename = "pageNumber")]
    page_number: u32,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    paragraphs: Vec<AnalyzedSpan>,
    #[serde(default)]
    lines: Vec<AnalyzedSpan>,
    #[serde(default)]
    words: Vec<AnalyzedSpan>,
}

#[derive(Debug, Deserialize)]
struct AnalyzedSpan {
    #[serde(default)]
    content: String,
    #[serde(default)]
    polygon: Vec<f64>,
}

#[async_trait]
impl TextExtractionProvider for DocIntelClient {
    async fn extract(
        &self,
        document: &Path,
        mode: ExtractionMode,
    ) -> Result<Vec<RawPage>, ProviderError> {
        let bytes = tokio::fs::read(document).await?;
        let url = format!(
            "{}/documents:analyze?model={}",
            self.endpoint,
            Self::model_for(mode)
        );

        tracing::debug!(%url, mode = %mode, bytes = bytes.len(), "requesting extraction pass");

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/pdf")
            .body(bytes)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status: status.as_u16(), message });
        }

        let analysis: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Ok(analysis
            .pages
            .into_iter()
            .map(|page| convert_page(page, mode))
            .collect())
    }
}

fn convert_page(page: AnalyzedPage, mode: ExtractionMode) -> RawPage {
    let spans = match mode {
        // Paragraphs carry better semantic units; lines are the fallback
        // for engines that do not paragraph-segment.
        ExtractionMode::Content => {
            if page.paragraphs.is_empty() {
                convert_spans(page.lines, Granularity::Line)
            } else {
                convert_spans(page.paragraphs, Granularity::Paragraph)
            }
        }
        ExtractionMode::Layout => convert_spans(page.words, Granularity::Word),
    };
    RawPage {
        number: page.page_number,
        dimensions: PageDimensions::new(page.width, page.height),
        unit: SourceUnit::from_report(&page.unit),
        spans,
    }
}

fn convert_spans(spans: Vec<AnalyzedSpan>, granularity: Granularity) -> Vec<RawSpan> {
    spans
        .into_iter()
        .map(|span| RawSpan { text: span.content, polygon: span.polygon, granularity })
        .collect()
}
