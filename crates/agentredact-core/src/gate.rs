//! The human gate: a serializable suspension point.
//!
//! The pipeline never blocks in memory waiting for a reviewer. It hands
//! the caller a checkpoint (record + stage tag) as a value; the caller
//! may persist it, show the preview, collect a decision, and resume. A
//! dropped checkpoint cancels the run.

use std::path::Path;

use serde::{Deserialize, Serialize};

use shared_types::{ManualRegion, SensitiveRegion};

use crate::record::PipelineRecord;
use crate::stage::PipelineStage;
use crate::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineCheckpoint {
    pub record: PipelineRecord,
    pub stage: PipelineStage,
}

impl PipelineCheckpoint {
    pub fn preview_path(&self) -> Option<&Path> {
        self.record.preview_path.as_deref()
    }

    pub fn regions(&self) -> &[SensitiveRegion] {
        &self.record.regions
    }

    pub fn manual_regions(&self) -> &[ManualRegion] {
        &self.record.manual_regions
    }

    /// Values that were classified as sensitive but could not be located
    /// on the page. The reviewer should check these by hand.
    pub fn unmapped_values(&self) -> &[String] {
        &self.record.unmapped
    }

    pub fn to_json(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// What the reviewer decided at the gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReviewDecision {
    /// Commit the current region lists.
    Approve,
    /// Send the run back to intake, optionally with revised hints. The
    /// extraction cache is kept; the loop counter restarts.
    Reject { revised_request: Option<String> },
    /// Replace one or both region lists and stay suspended.
    Edit {
        sensitive: Option<Vec<SensitiveRegion>>,
        manual: Option<Vec<ManualRegion>>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::{BoundingBox, GuidanceList, LookupFilters};

    #[test]
    fn test_checkpoint_round_trips_through_json() {
        let mut record = PipelineRecord::new(
            "/tmp/original/doc.pdf".into(),
            "redact personal data".to_string(),
            GuidanceList::from_items(["redact names"]),
            LookupFilters::default(),
            vec![],
            3,
        );
        record.regions.push(SensitiveRegion {
            page: 1,
            content: "John Smith".to_string(),
            rationale: "full name".to_string(),
            bbox: BoundingBox::new(10.0, 20.0, 110.0, 35.0),
        });
        record.unmapped.push("offscreen value".to_string());
        let checkpoint = PipelineCheckpoint { record, stage: PipelineStage::HumanGate };

        let json = checkpoint.to_json().unwrap();
        let restored = PipelineCheckpoint::from_json(&json).unwrap();

        assert_eq!(restored.stage, PipelineStage::HumanGate);
        assert_eq!(restored.record.run_id, checkpoint.record.run_id);
        assert_eq!(restored.regions(), checkpoint.regions());
        assert_eq!(restored.unmapped_values(), ["offscreen value"]);
        assert_eq!(restored.record.counter, checkpoint.record.counter);
    }
}
