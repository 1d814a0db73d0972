//! The `assemble-deck` run.

use crate::{load_references, reference_dir};
use anyhow::{bail, Context, Result};
use clap::Parser;
use deck_core::{DeploymentMethod, ProjectInfo};
use deck_pptx::{AssemblyReport, DeckAssembler, Presentation};
use std::path::{Path, PathBuf};

/// Add the architecture template and general reference slides to a generated deck.
#[derive(Parser, Debug)]
#[command(name = "assemble-deck")]
#[command(author, version, about, long_about = None)]
pub struct AssembleArgs {
    /// Generated presentation (.pptx)
    pub generated: PathBuf,

    /// Project info JSON carrying the deployment method
    pub project_info: PathBuf,

    /// Output deck (default: replace the generated deck)
    pub output: Option<PathBuf>,

    /// Directory holding the reference decks
    #[arg(long, env = "DECK_REF_DIR")]
    pub ref_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl AssembleArgs {
    /// Where the assembled deck is written.
    pub fn output_path(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.generated)
    }
}

/// Assemble the deck and write it to the output path.
///
/// The output file is only replaced once the whole deck has been built and
/// serialized; on any error it is left as it was.
pub fn run(args: &AssembleArgs) -> Result<AssemblyReport> {
    if !args.generated.is_file() {
        bail!("Generated deck not found: {}", args.generated.display());
    }

    let deployment = read_deployment(&args.project_info);
    if let Some(method) = &deployment {
        log::info!("Deployment method: {}", method);
    }

    let ref_dir = reference_dir(args.ref_dir.as_deref());
    log::debug!("Reference decks in {}", ref_dir.display());
    let references = load_references(&ref_dir);

    let mut deck = Presentation::open(&args.generated)
        .with_context(|| format!("Failed to open {}", args.generated.display()))?;
    log::info!("Generated deck: {} slides", deck.slide_count());

    let report = DeckAssembler::default()
        .assemble(&mut deck, &references, deployment.as_ref())
        .context("Deck assembly failed")?;

    let output = args.output_path();
    deck.save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(report)
}

/// The deployment method named by the project-info file.
///
/// A missing, unreadable or invalid file costs only the architecture slide.
fn read_deployment(path: &Path) -> Option<DeploymentMethod> {
    if !path.is_file() {
        log::warn!(
            "Project info not found: {}; architecture slide will be skipped",
            path.display()
        );
        return None;
    }

    match ProjectInfo::from_path(path) {
        Ok(info) => info.deployment(),
        Err(e) => {
            log::warn!(
                "Could not read project info {}: {}; architecture slide will be skipped",
                path.display(),
                e
            );
            None
        }
    }
}
