//! Regions marked for redaction, AI-detected and human-drawn.

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// A span of content the detection stages classified as sensitive.
/// Dedup identity is (page, top-left proximity), never object identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitiveRegion {
    pub page: u32,
    pub content: String,
    pub rationale: String,
    pub bbox: BoundingBox,
}

/// A region drawn directly by a reviewer. Composed in its own redaction
/// pass, after AI regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualRegion {
    pub page: u32,
    pub bbox: BoundingBox,
    #[serde(default)]
    pub note: Option<String>,
}

/// Page + box view shared by everything the composer can commit.
pub trait Redactable {
    fn page(&self) -> u32;
    fn bbox(&self) -> &BoundingBox;
}

impl Redactable for SensitiveRegion {
    fn page(&self) -> u32 {
        self.page
    }

    fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

impl Redactable for ManualRegion {
    fn page(&self) -> u32 {
        self.page
    }

    fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

/// Flattened commit unit handed to a document edit provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RedactionTarget {
    pub page: u32,
    pub bbox: BoundingBox,
}

impl RedactionTarget {
    pub fn of<R: Redactable>(region: &R) -> Self {
        Self { page: region.page(), bbox: *region.bbox() }
    }
}

impl Redactable for RedactionTarget {
    fn page(&self) -> u32 {
        self.page
    }

    fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}
