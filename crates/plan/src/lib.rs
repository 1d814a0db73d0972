//! Slide plan building from technical proposal markdown.
//!
//! Parses the numbered `## ` sections of a proposal, maps them to typed
//! slide records and writes the plan as JSON plus a markdown summary.

pub mod builder;
pub mod diagram;
pub mod fields;
pub mod modules;
pub mod proposal;
pub mod report;
pub mod timeline;

pub use builder::SlidePlanBuilder;
pub use proposal::Proposal;
pub use report::{summary_markdown, write_outputs, PlanOutputs};

use deck_core::{Result, SlidePlan};
use std::path::Path;

/// Build the plan for a proposal file and write its output files.
///
/// `output_dir` defaults to the proposal's directory.
pub fn build_slide_plan(
    proposal_path: &Path,
    diagram_path: Option<&Path>,
    output_dir: Option<&Path>,
) -> Result<(SlidePlan, PlanOutputs)> {
    let proposal = Proposal::from_path(proposal_path)?;
    let diagram_code = diagram_path.and_then(diagram::read_diagram_file);

    let plan = SlidePlanBuilder::new(&proposal)
        .with_diagram(diagram_code)
        .build()?;

    let stem = proposal_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "proposal".to_string());
    let output_dir = output_dir
        .or_else(|| proposal_path.parent())
        .unwrap_or_else(|| Path::new("."));

    let outputs = write_outputs(&plan, &stem, output_dir)?;
    Ok((plan, outputs))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROPOSAL: &str = "# Yard Technical Proposal
## 1. COVER PAGE
**Date:** June 2025
## 2. PROJECT REQUIREMENT STATEMENT
**Project Owner:** Port Ops
## 7. PROPOSED MODULES & FUNCTIONAL DESCRIPTION
### Module 1: Vest Detection
**Purpose Description:** Vests
**Alert Trigger Logic:** No vest
**Preconditions:** Daylight
";

    #[test]
    fn test_build_slide_plan_writes_next_to_proposal() {
        let dir = tempfile::tempdir().unwrap();
        let proposal = dir.path().join("yard.md");
        let diagram = dir.path().join("yard_diagram.md");
        std::fs::write(&proposal, PROPOSAL).unwrap();
        std::fs::write(&diagram, "```mermaid\ngraph LR\n  Cam --> AI\n```\n").unwrap();

        let (plan, outputs) = build_slide_plan(&proposal, Some(&diagram), None).unwrap();
        assert_eq!(plan.project_name, "Yard");
        assert_eq!(plan.client_name, "Port Ops");
        assert_eq!(outputs.structure, dir.path().join("yard_slide_structure.json"));
        assert!(outputs.summary.exists());

        let diagram_slide = plan
            .slides
            .iter()
            .find(|s| s.kind() == "diagram")
            .unwrap();
        match &diagram_slide.body {
            deck_core::SlideBody::Diagram { diagram, .. } => {
                assert_eq!(diagram.code, "graph LR\n  Cam --> AI")
            }
            _ => unreachable!(),
        }
        assert_eq!(plan.slides.last().unwrap().title(), "Vest Detection");
    }

    #[test]
    fn test_missing_proposal_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = build_slide_plan(&dir.path().join("none.md"), None, None);
        assert!(matches!(result, Err(deck_core::Error::IoError(_))));
    }
}
