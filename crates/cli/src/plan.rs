//! The `build-slide-plan` run.

use anyhow::{Context, Result};
use clap::Parser;
use deck_core::SlidePlan;
use deck_plan::PlanOutputs;
use std::path::PathBuf;

/// Map a proposal's sections to a typed slide plan (JSON) and summary (markdown).
#[derive(Parser, Debug)]
#[command(name = "build-slide-plan")]
#[command(author, version, about, long_about = None)]
pub struct PlanArgs {
    /// Proposal markdown file
    pub proposal: PathBuf,

    /// Architecture diagram file with a mermaid block
    pub diagram: Option<PathBuf>,

    /// Output directory (default: same as the proposal)
    pub output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn run(args: &PlanArgs) -> Result<(SlidePlan, PlanOutputs)> {
    deck_plan::build_slide_plan(
        &args.proposal,
        args.diagram.as_deref(),
        args.output.as_deref(),
    )
    .with_context(|| format!("Failed to build slide plan for {}", args.proposal.display()))
}
