//! Detection reasoning: classify sensitive content, map it to word
//! coordinates, and review the result.
//!
//! All three stages speak to the same [`shared_types::ReasoningProvider`]
//! with the shared instruction + payload + schema shape. Provider failures
//! never abort a run here; each stage degrades to an empty or accepting
//! result and the pipeline moves forward.

pub mod classifier;
pub mod evaluator;
pub mod mapper;
pub mod openai;

pub use classifier::{classify_content, ClassifiedValue};
pub use evaluator::{review_detections, EvaluationVerdict};
pub use mapper::{map_to_regions, MappingOutcome};
pub use openai::ChatClient;
