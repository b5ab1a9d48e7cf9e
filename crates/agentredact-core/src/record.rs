//! The single mutable state threaded through a run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_types::{ExtractionSet, GuidanceList, LookupFilters, LoopCounter, ManualRegion, SensitiveRegion};

/// Created at run start, mutated in place by each stage, discarded when
/// the run terminates. Serializable as a whole so the human-gate
/// checkpoint can round-trip it through JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRecord {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// The imported copy under the artifact store's original/ directory.
    pub document: PathBuf,
    pub request_text: String,
    pub filters: LookupFilters,
    pub guidance: GuidanceList,
    /// Search query derived at intake; drives the context-lookup route.
    pub search_query: Option<String>,
    /// Dual-pass cache. Written once; evaluation cycles and rejected
    /// re-runs reuse it.
    pub extraction: Option<ExtractionSet>,
    pub regions: Vec<SensitiveRegion>,
    pub manual_regions: Vec<ManualRegion>,
    /// Classified values the mapper could not locate; reported to the
    /// reviewer, never silently dropped.
    pub unmapped: Vec<String>,
    pub counter: LoopCounter,
    pub preview_path: Option<PathBuf>,
}

impl PipelineRecord {
    pub fn new(
        document: PathBuf,
        request_text: String,
        guidance: GuidanceList,
        filters: LookupFilters,
        manual_regions: Vec<ManualRegion>,
        max_cycles: u32,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            document,
            request_text,
            filters,
            guidance,
            search_query: None,
            extraction: None,
            regions: Vec::new(),
            manual_regions,
            unmapped: Vec::new(),
            counter: LoopCounter::new(max_cycles),
            preview_path: None,
        }
    }
}
