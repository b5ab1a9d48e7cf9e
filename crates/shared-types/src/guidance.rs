//! Accumulated detection guidance and the evaluation loop counter.

use serde::{Deserialize, Serialize};

/// Ordered, append-only list of natural-language sensitivity rules.
///
/// The orchestrator and the evaluator both append; nothing removes or
/// reorders. Appends drop exact repeats so feedback cycles never inflate
/// the list with duplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuidanceList {
    items: Vec<String>,
}

impl GuidanceList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::new();
        for item in items {
            list.append(item);
        }
        list
    }

    /// Append one rule. Blank input and exact repeats are skipped; returns
    /// whether the list grew.
    pub fn append<S: Into<String>>(&mut self, item: S) -> bool {
        let item = item.into().trim().to_string();
        if item.is_empty() || self.items.iter().any(|existing| *existing == item) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Append many rules; returns how many were actually added.
    pub fn append_all<I, S>(&mut self, items: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = 0;
        for item in items {
            if self.append(item) {
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    /// Bullet-list rendering for reasoning payloads.
    pub fn joined(&self) -> String {
        self.items
            .iter()
            .map(|item| format!("- {}", item))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Detection/evaluation cycle bookkeeping.
///
/// `current` never exceeds `max`; once the ceiling is reached the
/// evaluation loop is forced to exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopCounter {
    current: u32,
    max: u32,
}

impl LoopCounter {
    pub fn new(max: u32) -> Self {
        Self { current: 0, max }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn at_ceiling(&self) -> bool {
        self.current >= self.max
    }

    /// Advance one cycle. Returns false (and stays put) at the ceiling.
    pub fn advance(&mut self) -> bool {
        if self.at_ceiling() {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}
