//! Redaction artifacts: destructive opaque-box editing, non-destructive
//! previews, and the composition of AI and manual region sets.

pub mod artifacts;
pub mod compose;
pub mod editor;
pub mod pdfutil;
pub mod preview;

use thiserror::Error;

use shared_types::ProviderError;

#[derive(Debug, Error)]
pub enum RedactionError {
    #[error("no regions to redact")]
    NoRegions,

    #[error("document edit failed: {0}")]
    Edit(#[from] ProviderError),

    #[error("pdf error: {0}")]
    Pdf(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub use artifacts::ArtifactStore;
pub use compose::{CompositionOutcome, RedactionComposer};
pub use editor::OpaqueBoxEditor;
pub use preview::write_preview;
