//! Capability interfaces consumed by the pipeline core.
//!
//! The pipeline never talks to OCR, LLM, search, or PDF-editing services
//! directly; it goes through these traits. Concrete clients live in the
//! engine crates, mocks live next to the tests that use them.

use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::element::{ExtractionMode, Granularity};
use crate::geometry::{PageDimensions, SourceUnit};
use crate::region::RedactionTarget;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("document error: {0}")]
    Document(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// One reasoning call: free-form instruction plus payload in, JSON out.
/// Every reasoning stage shares this shape; `schema` describes the object
/// the caller expects back.
#[derive(Debug, Clone, Serialize)]
pub struct InferenceRequest {
    pub instruction: String,
    pub payload: String,
    pub schema: serde_json::Value,
}

#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    async fn infer(&self, request: InferenceRequest) -> Result<serde_json::Value, ProviderError>;
}

/// Run `infer` and deserialize the result into the caller's response type.
pub async fn infer_structured<T: DeserializeOwned>(
    provider: &dyn ReasoningProvider,
    request: InferenceRequest,
) -> Result<T, ProviderError> {
    let value = provider.infer(request).await?;
    serde_json::from_value(value).map_err(|e| ProviderError::MalformedResponse(e.to_string()))
}

/// One span as reported by an extraction provider, before unit
/// normalization. The polygon is a flat x,y list in the page's reported
/// unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSpan {
    pub text: String,
    pub polygon: Vec<f64>,
    pub granularity: Granularity,
}

/// One page of raw spans plus the dimensions the provider reported for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPage {
    pub number: u32,
    pub dimensions: PageDimensions,
    pub unit: SourceUnit,
    pub spans: Vec<RawSpan>,
}

#[async_trait]
pub trait TextExtractionProvider: Send + Sync {
    /// Run one extraction pass. Both modes are mandatory capabilities;
    /// the dual extraction service aborts the run if either fails.
    async fn extract(
        &self,
        document: &Path,
        mode: ExtractionMode,
    ) -> Result<Vec<RawPage>, ProviderError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupFilters {
    pub industry: Option<String>,
    pub jurisdiction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSource {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub excerpt: Option<String>,
}

#[async_trait]
pub trait KnowledgeLookupProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        filters: &LookupFilters,
    ) -> Result<Vec<KnowledgeSource>, ProviderError>;
}

/// Destructive redaction of page regions.
///
/// Implementations must remove the underlying content, not merely paint
/// over it, write the result to `output`, and leave `source` untouched.
pub trait DocumentEditProvider: Send + Sync {
    fn apply_redactions(
        &self,
        source: &Path,
        targets: &[RedactionTarget],
        output: &Path,
    ) -> Result<(), ProviderError>;
}
