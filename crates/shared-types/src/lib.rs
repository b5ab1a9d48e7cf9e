pub mod element;
pub mod geometry;
pub mod guidance;
pub mod provider;
pub mod region;

pub use element::{ExtractedElement, ExtractionMode, ExtractionSet, Granularity};
pub use geometry::{BoundingBox, PageDimensions, SourceUnit, POINTS_PER_CM, POINTS_PER_INCH};
pub use guidance::{GuidanceList, LoopCounter};
pub use provider::{
    infer_structured, DocumentEditProvider, InferenceRequest, KnowledgeLookupProvider,
    KnowledgeSource, LookupFilters, ProviderError, RawPage, RawSpan, ReasoningProvider,
    TextExtractionProvider,
};
pub use region::{ManualRegion, Redactable, RedactionTarget, SensitiveRegion};
