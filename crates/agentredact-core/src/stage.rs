//! The closed set of pipeline stages.

use serde::{Deserialize, Serialize};

/// Routing is an exhaustive match over this enum; there is no other way
/// to move a record between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    Intake,
    ContextLookup,
    Detection,
    Evaluation,
    Preview,
    HumanGate,
    Redaction,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Intake => "intake",
            PipelineStage::ContextLookup => "context_lookup",
            PipelineStage::Detection => "detection",
            PipelineStage::Evaluation => "evaluation",
            PipelineStage::Preview => "preview",
            PipelineStage::HumanGate => "human_gate",
            PipelineStage::Redaction => "redaction",
        };
        write!(f, "{}", name)
    }
}
