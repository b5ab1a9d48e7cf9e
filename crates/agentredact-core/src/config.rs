//! Run configuration and the request that starts a run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use shared_types::{LookupFilters, ManualRegion};

pub const DEFAULT_MAX_CYCLES: u32 = 3;
pub const DEFAULT_DEDUP_TOLERANCE: f64 = 5.0;

/// Knobs shared by every run the pipeline executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory under which each run gets its own artifact subtree.
    pub output_root: PathBuf,
    /// Ceiling on evaluator-driven detection re-runs.
    pub max_evaluation_cycles: u32,
    /// Top-left proximity (points) below which two same-page regions are
    /// one redaction.
    pub dedup_tolerance: f64,
}

impl PipelineConfig {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            max_evaluation_cycles: DEFAULT_MAX_CYCLES,
            dedup_tolerance: DEFAULT_DEDUP_TOLERANCE,
        }
    }
}

/// Everything the caller supplies to start one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub document: PathBuf,
    /// Free-text description of what to redact. When `guidance` is empty
    /// the intake stage derives guidance items from this text.
    pub request_text: String,
    #[serde(default)]
    pub guidance: Vec<String>,
    #[serde(default)]
    pub filters: LookupFilters,
    #[serde(default)]
    pub manual_regions: Vec<ManualRegion>,
}
