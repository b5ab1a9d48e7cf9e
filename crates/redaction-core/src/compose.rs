//! Composition of approved AI regions and reviewer-drawn regions into
//! redacted output documents.
//!
//! Three passes can come out of one run: AI-only when detections were
//! approved, manual-only when the reviewer drew regions, and combined
//! when both exist. Within a pass, near-duplicate regions (same page,
//! top-left corners within the tolerance) collapse to the first one
//! seen. The combined artifact is layered: manual regions are committed
//! on top of the AI-redacted output, skipping any manual box that
//! retraces an already-committed AI box.

use std::path::{Path, PathBuf};

use shared_types::{DocumentEditProvider, ManualRegion, RedactionTarget, SensitiveRegion};

use crate::artifacts::ArtifactStore;
use crate::RedactionError;

/// Paths to the redacted documents one composition produced. A pass with
/// no regions produces no file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositionOutcome {
    pub ai_redacted: Option<PathBuf>,
    pub manual_redacted: Option<PathBuf>,
    pub combined_redacted: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RedactionComposer {
    tolerance: f64,
}

impl RedactionComposer {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Run every applicable pass against the stored original. Errors if
    /// there is nothing at all to redact.
    pub fn compose(
        &self,
        editor: &dyn DocumentEditProvider,
        store: &ArtifactStore,
        original: &Path,
        ai: &[SensitiveRegion],
        manual: &[ManualRegion],
    ) -> Result<CompositionOutcome, RedactionError> {
        let ai_targets = self.dedup(ai.iter().map(RedactionTarget::of).collect());
        let manual_targets = self.dedup(manual.iter().map(RedactionTarget::of).collect());

        if ai_targets.is_empty() && manual_targets.is_empty() {
            return Err(RedactionError::NoRegions);
        }

        let mut outcome = CompositionOutcome::default();

        if !ai_targets.is_empty() {
            let path = store.ai_redacted_path(original);
            editor.apply_redactions(original, &ai_targets, &path)?;
            tracing::info!(output = %path.display(), regions = ai_targets.len(), "ai pass done");
            outcome.ai_redacted = Some(path);
        }

        if !manual_targets.is_empty() {
            let path = store.manual_redacted_path(original);
            editor.apply_redactions(original, &manual_targets, &path)?;
            tracing::info!(output = %path.display(), regions = manual_targets.len(), "manual pass done");
            outcome.manual_redacted = Some(path);
        }

        // Layered composition: manual regions apply last, on top of the
        // AI-redacted artifact, minus any retrace of a committed AI box.
        if let (Some(ai_artifact), false) = (&outcome.ai_redacted, manual_targets.is_empty()) {
            let remaining: Vec<RedactionTarget> = manual_targets
                .iter()
                .filter(|target| {
                    !ai_targets.iter().any(|committed| {
                        committed.page == target.page
                            && committed.bbox.near_duplicate(&target.bbox, self.tolerance)
                    })
                })
                .copied()
                .collect();

            let path = store.combined_redacted_path(original);
            if remaining.is_empty() {
                std::fs::copy(ai_artifact, &path)?;
            } else {
                editor.apply_redactions(ai_artifact, &remaining, &path)?;
            }
            tracing::info!(output = %path.display(), regions = remaining.len(), "combined pass done");
            outcome.combined_redacted = Some(path);
        }

        Ok(outcome)
    }

    /// First-wins dedup over (page, top-left proximity).
    fn dedup(&self, targets: Vec<RedactionTarget>) -> Vec<RedactionTarget> {
        let mut kept: Vec<RedactionTarget> = Vec::with_capacity(targets.len());
        for target in targets {
            let duplicate = kept.iter().any(|existing| {
                existing.page == target.page
                    && existing.bbox.near_duplicate(&target.bbox, self.tolerance)
            });
            if duplicate {
                tracing::debug!(page = target.page, "dropping near-duplicate region");
            } else {
                kept.push(target);
            }
        }
        kept
    }
}
