//! Hard failures a run can terminate with. Everything softer degrades
//! forward inside the stage machine.

use thiserror::Error;

use extraction_engine::ExtractionError;
use redaction_core::RedactionError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Redaction(#[from] RedactionError),

    #[error("checkpoint serialization failed: {0}")]
    Checkpoint(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
