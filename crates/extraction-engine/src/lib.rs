//! Dual-pass document extraction.
//!
//! One provider, two passes: a content pass (paragraphs/lines) feeding the
//! classifier and evaluator, and a layout pass (words) feeding the
//! coordinate mapper. Both passes are normalized into page-point space
//! against the document's native page sizes before anything downstream
//! sees them.

pub mod docintel;
pub mod normalize;
pub mod pages;
pub mod service;

use thiserror::Error;

use shared_types::{ExtractionMode, ProviderError};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("{mode} extraction pass failed: {source}")]
    PassFailed {
        mode: ExtractionMode,
        source: ProviderError,
    },

    #[error("{mode} extraction pass returned no elements")]
    EmptyPass { mode: ExtractionMode },

    #[error("failed to read page geometry: {0}")]
    PageGeometry(String),
}

pub use docintel::DocIntelClient;
pub use service::DualExtractionService;
