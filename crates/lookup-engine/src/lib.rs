//! External regulatory context: curated authorities, live search, and
//! summarization of sources into detection guidance.

pub mod authorities;
pub mod search;
pub mod summarize;

pub use authorities::curated_sources;
pub use search::{CuratedLookup, KnowledgeSearch};
pub use summarize::summarize_sources;
