//! Pipeline orchestration: the run record, the stage machine, and the
//! human-gate checkpoint.
//!
//! A run is a single mutable [`PipelineRecord`] driven through a closed
//! stage enum until it either suspends at the human gate or terminates in
//! redaction. Suspension is by value: the caller receives a serializable
//! checkpoint and resumes with a decision.

pub mod config;
pub mod error;
pub mod gate;
pub mod pipeline;
pub mod record;
pub mod stage;

pub use config::{PipelineConfig, RunRequest, DEFAULT_DEDUP_TOLERANCE, DEFAULT_MAX_CYCLES};
pub use error::PipelineError;
pub use gate::{PipelineCheckpoint, ReviewDecision};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use record::PipelineRecord;
pub use stage::PipelineStage;
