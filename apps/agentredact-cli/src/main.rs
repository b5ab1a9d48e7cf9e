//! agentRedact CLI
//!
//! Thin command-line caller around the redaction pipeline: starts a run,
//! plays the human gate on stdin, and prints the artifact paths.
//!
//! Provider configuration comes from the environment:
//!
//! - `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OPENAI_MODEL`: reasoning
//! - `DOCINTEL_ENDPOINT`, `DOCINTEL_API_KEY`: text extraction
//! - `SEARCH_ENDPOINT`, `SEARCH_API_KEY`: optional live lookup; without
//!   them the curated authority table answers lookups.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use agentredact_core::{
    Pipeline, PipelineCheckpoint, PipelineConfig, PipelineOutcome, ReviewDecision, RunRequest,
};
use detection_engine::ChatClient;
use extraction_engine::DocIntelClient;
use lookup_engine::{CuratedLookup, KnowledgeSearch};
use redaction_core::OpaqueBoxEditor;
use shared_types::{KnowledgeLookupProvider, LookupFilters, ManualRegion};

/// Command-line arguments for the agentRedact pipeline
#[derive(Parser, Debug)]
#[command(name = "agentredact")]
#[command(about = "AI-assisted destructive PDF redaction")]
struct Args {
    /// Document to redact
    document: PathBuf,

    /// Free-text description of what should be redacted
    #[arg(short, long)]
    request: String,

    /// Explicit guidance items; when given, intake skips derivation
    #[arg(short, long)]
    guidance: Vec<String>,

    /// Industry filter for regulatory lookup
    #[arg(long)]
    industry: Option<String>,

    /// Jurisdiction filter for regulatory lookup (e.g. US, EU)
    #[arg(long)]
    jurisdiction: Option<String>,

    /// Root directory for run artifacts
    #[arg(long, default_value = "runs")]
    output_root: PathBuf,

    /// Ceiling on evaluator-driven detection re-runs
    #[arg(long, default_value = "3")]
    max_cycles: u32,

    /// Dedup tolerance in points
    #[arg(long, default_value = "5.0")]
    tolerance: f64,

    /// JSON file with manual regions to compose after the AI pass
    #[arg(long)]
    manual_regions: Option<PathBuf>,

    /// Approve the first proposal without asking
    #[arg(long)]
    auto_approve: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let reasoning = Arc::new(ChatClient::new(
        env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
        std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?,
        env_or("OPENAI_MODEL", "gpt-4o-mini"),
    ));
    let extraction = Arc::new(DocIntelClient::new(
        std::env::var("DOCINTEL_ENDPOINT").context("DOCINTEL_ENDPOINT is not set")?,
        std::env::var("DOCINTEL_API_KEY").context("DOCINTEL_API_KEY is not set")?,
    ));
    let lookup: Arc<dyn KnowledgeLookupProvider> =
        match (std::env::var("SEARCH_ENDPOINT"), std::env::var("SEARCH_API_KEY")) {
            (Ok(endpoint), Ok(api_key)) => Arc::new(KnowledgeSearch::new(endpoint, api_key)),
            _ => {
                info!("no live search configured; using curated authorities");
                Arc::new(CuratedLookup)
            }
        };

    let mut config = PipelineConfig::new(&args.output_root);
    config.max_evaluation_cycles = args.max_cycles;
    config.dedup_tolerance = args.tolerance;

    let pipeline = Pipeline::new(
        config,
        reasoning,
        extraction,
        Some(lookup),
        Arc::new(OpaqueBoxEditor),
    )?;

    let manual_regions = match &args.manual_regions {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading manual regions from {}", path.display()))?;
            serde_json::from_str::<Vec<ManualRegion>>(&json)
                .with_context(|| format!("parsing manual regions from {}", path.display()))?
        }
        None => Vec::new(),
    };

    let request = RunRequest {
        document: args.document.clone(),
        request_text: args.request.clone(),
        guidance: args.guidance.clone(),
        filters: LookupFilters {
            industry: args.industry.clone(),
            jurisdiction: args.jurisdiction.clone(),
        },
        manual_regions,
    };

    info!(document = %args.document.display(), "starting redaction run");
    let mut outcome = pipeline.run(request).await?;

    loop {
        match outcome {
            PipelineOutcome::Completed(artifacts) => {
                if let Some(path) = artifacts.ai_redacted {
                    println!("AI-redacted:       {}", path.display());
                }
                if let Some(path) = artifacts.manual_redacted {
                    println!("Manually redacted: {}", path.display());
                }
                if let Some(path) = artifacts.combined_redacted {
                    println!("Combined:          {}", path.display());
                }
                return Ok(());
            }
            PipelineOutcome::Suspended(checkpoint) => {
                print_proposal(&checkpoint);
                let decision = if args.auto_approve {
                    Some(ReviewDecision::Approve)
                } else {
                    prompt_decision()?
                };
                let Some(decision) = decision else {
                    println!("Run cancelled; no redaction was performed.");
                    return Ok(());
                };
                outcome = pipeline.resume(checkpoint, decision).await?;
            }
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn print_proposal(checkpoint: &PipelineCheckpoint) {
    println!("\nProposed redactions:");
    for region in checkpoint.regions() {
        println!(
            "  page {:>2}  {:?}  ({})",
            region.page, region.content, region.rationale
        );
    }
    if checkpoint.regions().is_empty() {
        println!("  (none)");
    }
    for region in checkpoint.manual_regions() {
        println!(
            "  page {:>2}  manual region{}",
            region.page,
            region
                .note
                .as_deref()
                .map(|note| format!(": {}", note))
                .unwrap_or_default()
        );
    }
    if !checkpoint.unmapped_values().is_empty() {
        println!("Detected but not locatable (review by hand):");
        for value in checkpoint.unmapped_values() {
            println!("  {:?}", value);
        }
    }
    if let Some(path) = checkpoint.preview_path() {
        println!("Preview: {}", path.display());
    }
}

/// One round at the gate. `None` means quit.
fn prompt_decision() -> anyhow::Result<Option<ReviewDecision>> {
    let stdin = io::stdin();
    loop {
        print!("[a]pprove, [r]eject with new hints, [q]uit: ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match line.trim().to_lowercase().as_str() {
            "a" | "approve" => return Ok(Some(ReviewDecision::Approve)),
            "r" | "reject" => {
                print!("Revised hints (empty keeps the original request): ");
                io::stdout().flush()?;
                let mut hints = String::new();
                stdin.lock().read_line(&mut hints)?;
                let hints = hints.trim();
                return Ok(Some(ReviewDecision::Reject {
                    revised_request: (!hints.is_empty()).then(|| hints.to_string()),
                }));
            }
            "q" | "quit" => return Ok(None),
            _ => println!("Unrecognized choice."),
        }
    }
}
