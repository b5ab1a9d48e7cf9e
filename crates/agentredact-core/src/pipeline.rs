//! The stage machine that drives a run.

use std::sync::Arc;

use serde::Deserialize;

use detection_engine::{classify_content, map_to_regions, review_detections};
use extraction_engine::DualExtractionService;
use lookup_engine::summarize_sources;
use redaction_core::{write_preview, ArtifactStore, CompositionOutcome, RedactionComposer};
use shared_types::{
    infer_structured, DocumentEditProvider, GuidanceList, InferenceRequest,
    KnowledgeLookupProvider, ReasoningProvider, TextExtractionProvider,
};

use crate::config::{PipelineConfig, RunRequest};
use crate::error::PipelineError;
use crate::gate::{PipelineCheckpoint, ReviewDecision};
use crate::record::PipelineRecord;
use crate::stage::PipelineStage;

/// How one drive through the machine ended: suspended at the gate, or
/// terminated with redacted artifacts.
#[derive(Debug)]
pub enum PipelineOutcome {
    Suspended(PipelineCheckpoint),
    Completed(CompositionOutcome),
}

#[derive(Debug, Default, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    guidance_items: Vec<String>,
    #[serde(default)]
    search_query: Option<String>,
}

const ROUTE_INSTRUCTION: &str = "You turn a free-text redaction request into detection \
guidance. Derive 1-3 concise descriptions of the sensitive data categories the request \
implies. If the request references an industry, regulation, or jurisdiction whose rules \
would sharpen detection, also produce one web search query for authoritative sources; \
otherwise omit it.";

fn route_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "guidance_items": { "type": "array", "items": { "type": "string" } },
            "search_query": { "type": ["string", "null"] }
        },
        "required": ["guidance_items"]
    })
}

pub struct Pipeline {
    config: PipelineConfig,
    extraction: DualExtractionService,
    reasoning: Arc<dyn ReasoningProvider>,
    lookup: Option<Arc<dyn KnowledgeLookupProvider>>,
    editor: Arc<dyn DocumentEditProvider>,
    composer: RedactionComposer,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        reasoning: Arc<dyn ReasoningProvider>,
        extraction_provider: Arc<dyn TextExtractionProvider>,
        lookup: Option<Arc<dyn KnowledgeLookupProvider>>,
        editor: Arc<dyn DocumentEditProvider>,
    ) -> Result<Self, PipelineError> {
        std::fs::create_dir_all(&config.output_root)?;
        let composer = RedactionComposer::new(config.dedup_tolerance);
        Ok(Self {
            config,
            extraction: DualExtractionService::new(extraction_provider),
            reasoning,
            lookup,
            editor,
            composer,
        })
    }

    /// Artifacts live under `output_root/<run_id>/`, so concurrent runs
    /// over the same document never contend for an output path.
    fn store_for(&self, record: &PipelineRecord) -> Result<ArtifactStore, PipelineError> {
        Ok(ArtifactStore::open(
            &self.config.output_root.join(record.run_id.to_string()),
        )?)
    }

    /// Start a run: import the document into the artifact store and drive
    /// the record from intake until it suspends or terminates.
    pub async fn run(&self, request: RunRequest) -> Result<PipelineOutcome, PipelineError> {
        if !request.document.exists() {
            return Err(PipelineError::DocumentNotFound(
                request.document.display().to_string(),
            ));
        }
        let mut record = PipelineRecord::new(
            request.document.clone(),
            request.request_text,
            GuidanceList::from_items(request.guidance),
            request.filters,
            request.manual_regions,
            self.config.max_evaluation_cycles,
        );
        record.document = self.store_for(&record)?.import_original(&request.document)?;
        tracing::info!(run_id = %record.run_id, document = %record.document.display(), "run started");

        self.drive(record, PipelineStage::Intake).await
    }

    /// Resume a suspended run with the reviewer's decision.
    pub async fn resume(
        &self,
        checkpoint: PipelineCheckpoint,
        decision: ReviewDecision,
    ) -> Result<PipelineOutcome, PipelineError> {
        let mut record = checkpoint.record;
        match decision {
            ReviewDecision::Approve => {
                tracing::info!(run_id = %record.run_id, "approved; committing redactions");
                self.drive(record, PipelineStage::Redaction).await
            }
            ReviewDecision::Reject { revised_request } => {
                tracing::info!(run_id = %record.run_id, "rejected; re-entering intake");
                if let Some(revised) = revised_request {
                    // Revised hints supersede the old routing: guidance is
                    // re-derived from them at intake.
                    record.request_text = revised;
                    record.guidance = GuidanceList::new();
                    record.search_query = None;
                }
                record.regions.clear();
                record.unmapped.clear();
                record.preview_path = None;
                record.counter.reset();
                self.drive(record, PipelineStage::Intake).await
            }
            ReviewDecision::Edit { sensitive, manual } => {
                if let Some(sensitive) = sensitive {
                    record.regions = sensitive;
                }
                if let Some(manual) = manual {
                    record.manual_regions = manual;
                }
                tracing::info!(run_id = %record.run_id, "regions edited; awaiting decision");
                Ok(PipelineOutcome::Suspended(PipelineCheckpoint {
                    record,
                    stage: PipelineStage::HumanGate,
                }))
            }
        }
    }

    async fn drive(
        &self,
        mut record: PipelineRecord,
        start: PipelineStage,
    ) -> Result<PipelineOutcome, PipelineError> {
        let mut stage = start;
        loop {
            tracing::debug!(run_id = %record.run_id, %stage, "entering stage");
            stage = match stage {
                PipelineStage::Intake => self.intake(&mut record).await?,
                PipelineStage::ContextLookup => self.context_lookup(&mut record).await,
                PipelineStage::Detection => self.detection(&mut record).await?,
                PipelineStage::Evaluation => self.evaluation(&mut record).await,
                PipelineStage::Preview => self.preview(&mut record),
                PipelineStage::HumanGate => {
                    return Ok(PipelineOutcome::Suspended(PipelineCheckpoint {
                        record,
                        stage: PipelineStage::HumanGate,
                    }));
                }
                PipelineStage::Redaction => {
                    let store = self.store_for(&record)?;
                    let outcome = self.composer.compose(
                        self.editor.as_ref(),
                        &store,
                        &record.document,
                        &record.regions,
                        &record.manual_regions,
                    )?;
                    tracing::info!(run_id = %record.run_id, "run complete");
                    return Ok(PipelineOutcome::Completed(outcome));
                }
            };
        }
    }

    async fn intake(&self, record: &mut PipelineRecord) -> Result<PipelineStage, PipelineError> {
        if !record.document.exists() {
            return Err(PipelineError::DocumentNotFound(
                record.document.display().to_string(),
            ));
        }

        if record.guidance.is_empty() {
            let request = InferenceRequest {
                instruction: ROUTE_INSTRUCTION.to_string(),
                payload: record.request_text.clone(),
                schema: route_schema(),
            };
            match infer_structured::<RouteResponse>(self.reasoning.as_ref(), request).await {
                Ok(route) => {
                    record.guidance.append_all(route.guidance_items);
                    record.search_query =
                        route.search_query.filter(|query| !query.trim().is_empty());
                }
                Err(error) => {
                    tracing::warn!(%error, "guidance derivation failed; using the raw request");
                }
            }
            // Derivation can come back empty; the raw request is always a
            // usable guidance item.
            if record.guidance.is_empty() {
                record.guidance.append(record.request_text.clone());
                record.search_query = None;
            }
        }

        if record.search_query.is_some() && self.lookup.is_some() {
            Ok(PipelineStage::ContextLookup)
        } else {
            Ok(PipelineStage::Detection)
        }
    }

    async fn context_lookup(&self, record: &mut PipelineRecord) -> PipelineStage {
        let (Some(lookup), Some(query)) = (self.lookup.as_deref(), record.search_query.clone())
        else {
            return PipelineStage::Detection;
        };

        match lookup.search(&query, &record.filters).await {
            Ok(sources) if !sources.is_empty() => {
                let items =
                    summarize_sources(self.reasoning.as_ref(), &query, &record.filters, &sources)
                        .await;
                let added = record.guidance.append_all(items);
                tracing::info!(sources = sources.len(), added, "context lookup merged");
            }
            Ok(_) => {
                tracing::warn!(query, "context lookup returned nothing; guidance unchanged");
            }
            Err(error) => {
                tracing::warn!(%error, "context lookup failed; guidance unchanged");
            }
        }
        PipelineStage::Detection
    }

    async fn detection(&self, record: &mut PipelineRecord) -> Result<PipelineStage, PipelineError> {
        if record.extraction.is_none() {
            let set = self.extraction.extract(&record.document).await?;
            record.extraction = Some(set);
        }
        // Cached for the life of the run; unwrap is unreachable past the
        // write above.
        let extraction = record.extraction.as_ref().ok_or_else(|| {
            PipelineError::DocumentNotFound(record.document.display().to_string())
        })?;

        let values =
            classify_content(self.reasoning.as_ref(), extraction, &record.guidance).await;
        let outcome = map_to_regions(self.reasoning.as_ref(), &values, extraction).await;

        record.regions = outcome.regions;
        record.unmapped = outcome.unmapped;
        tracing::info!(
            run_id = %record.run_id,
            regions = record.regions.len(),
            unmapped = record.unmapped.len(),
            "detection pass complete"
        );
        Ok(PipelineStage::Evaluation)
    }

    async fn evaluation(&self, record: &mut PipelineRecord) -> PipelineStage {
        if record.counter.at_ceiling() {
            tracing::info!(run_id = %record.run_id, cycles = record.counter.current(), "cycle ceiling reached");
            return PipelineStage::Preview;
        }
        if record.guidance.is_empty() {
            return PipelineStage::Preview;
        }

        let Some(extraction) = record.extraction.as_ref() else {
            return PipelineStage::Preview;
        };
        let verdict = review_detections(
            self.reasoning.as_ref(),
            &record.guidance,
            extraction,
            &record.regions,
        )
        .await;

        if verdict.requests_rerun() && record.counter.advance() {
            record.guidance.append(verdict.feedback_message);
            tracing::info!(
                run_id = %record.run_id,
                cycle = record.counter.current(),
                "evaluator requested another detection pass"
            );
            PipelineStage::Detection
        } else {
            PipelineStage::Preview
        }
    }

    fn preview(&self, record: &mut PipelineRecord) -> PipelineStage {
        record.preview_path = None;
        match self.store_for(record) {
            Ok(store) => {
                let path = store.preview_path(&record.document);
                match write_preview(&record.document, &record.regions, &path) {
                    Ok(()) => record.preview_path = Some(path),
                    Err(error) => {
                        tracing::warn!(%error, "preview generation failed; continuing without one");
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%error, "artifact store unavailable; continuing without a preview");
            }
        }
        PipelineStage::HumanGate
    }
}
