//! Extraction output cached on a pipeline run.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// Level of content decomposition produced by an extraction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Paragraph,
    Line,
    Word,
}

impl Granularity {
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Granularity::Paragraph => "para",
            Granularity::Line => "line",
            Granularity::Word => "word",
        }
    }
}

/// The two extraction passes: semantic text vs. precise word layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    Content,
    Layout,
}

impl std::fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionMode::Content => write!(f, "content"),
            ExtractionMode::Layout => write!(f, "layout"),
        }
    }
}

/// One normalized span of extracted text. Ids are page-scoped and unique
/// within a pass, e.g. `word_2_17`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedElement {
    pub id: String,
    pub page: u32,
    pub text: String,
    pub bbox: BoundingBox,
    pub granularity: Granularity,
}

impl ExtractedElement {
    pub fn element_id(granularity: Granularity, page: u32, index: usize) -> String {
        format!("{}_{}_{}", granularity.id_prefix(), page, index)
    }
}

/// Both passes for one document. Written once per run and reused by every
/// detection cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSet {
    pub content: Vec<ExtractedElement>,
    pub layout: Vec<ExtractedElement>,
}

impl ExtractionSet {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() || self.layout.is_empty()
    }

    /// Content-pass text grouped by page, for classifier and evaluator
    /// payloads.
    pub fn page_text(&self) -> String {
        let mut pages: BTreeMap<u32, Vec<&str>> = BTreeMap::new();
        for element in &self.content {
            pages.entry(element.page).or_default().push(&element.text);
        }
        pages
            .iter()
            .map(|(page, texts)| format!("Page {}:\n{}", page, texts.join("\n")))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Layout-pass words listed per page with their ids, for the mapper
    /// payload.
    pub fn word_catalog(&self) -> String {
        let mut pages: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        for element in &self.layout {
            pages
                .entry(element.page)
                .or_default()
                .push(format!("  {}: {}", element.id, element.text));
        }
        pages
            .iter()
            .map(|(page, lines)| format!("Page {}:\n{}", page, lines.join("\n")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn words_by_id(&self) -> HashMap<&str, &ExtractedElement> {
        self.layout
            .iter()
            .map(|element| (element.id.as_str(), element))
            .collect()
    }
}
