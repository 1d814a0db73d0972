//! Slide plan output files.

use deck_core::{Result, SlideBody, SlidePlan};
use log::info;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Paths of the files written for one plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutputs {
    pub structure: PathBuf,
    pub summary: PathBuf,
}

/// Write `{stem}_slide_structure.json` and `{stem}_slide_content.md` into
/// `output_dir`, creating it if needed.
pub fn write_outputs(plan: &SlidePlan, stem: &str, output_dir: &Path) -> Result<PlanOutputs> {
    std::fs::create_dir_all(output_dir)?;

    let structure = output_dir.join(format!("{stem}_slide_structure.json"));
    let summary = output_dir.join(format!("{stem}_slide_content.md"));

    std::fs::write(&structure, serde_json::to_string_pretty(plan)?)?;
    std::fs::write(&summary, summary_markdown(plan))?;

    info!("Wrote {} and {}", structure.display(), summary.display());
    Ok(PlanOutputs { structure, summary })
}

/// Human-readable outline of a plan.
pub fn summary_markdown(plan: &SlidePlan) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "# Slide Content Summary: {}\n\n**Client:** {}\n**Total Slides:** {}\n\n---\n\n",
        plan.project_name, plan.client_name, plan.total_slides
    );

    for slide in &plan.slides {
        let _ = write!(
            out,
            "## Slide {}: {}\n\n**Type:** {}\n\n",
            slide.slide_number,
            slide.title(),
            slide.kind()
        );
        if let SlideBody::ContentBullets { content, .. } = &slide.body {
            let _ = write!(out, "**Content:** {} bullet points\n\n", content.len());
        }
        out.push_str("---\n\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{Bullet, SlideRecord};

    fn plan() -> SlidePlan {
        SlidePlan::new(
            "Harbour Site",
            "ACME",
            vec![
                SlideRecord {
                    slide_number: 1,
                    body: SlideBody::Title {
                        title: "Video Analytics Solution Proposal for ACME".to_string(),
                        date: "May 2025".to_string(),
                    },
                },
                SlideRecord {
                    slide_number: 2,
                    body: SlideBody::ContentBullets {
                        title: "Dashboard".to_string(),
                        content: vec![Bullet::new(0, "Live alerts"), Bullet::new(1, "Sound")],
                    },
                },
            ],
        )
    }

    #[test]
    fn test_summary_markdown() {
        let expected = "# Slide Content Summary: Harbour Site\n\n**Client:** ACME\n**Total Slides:** 2\n\n---\n\n\
## Slide 1: Video Analytics Solution Proposal for ACME\n\n**Type:** title\n\n---\n\n\
## Slide 2: Dashboard\n\n**Type:** content_bullets\n\n**Content:** 2 bullet points\n\n---\n\n";
        assert_eq!(summary_markdown(&plan()), expected);
    }

    #[test]
    fn test_write_outputs_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("nested").join("out");

        let outputs = write_outputs(&plan(), "harbour", &out_dir).unwrap();
        assert_eq!(outputs.structure, out_dir.join("harbour_slide_structure.json"));
        assert_eq!(outputs.summary, out_dir.join("harbour_slide_content.md"));

        let json = std::fs::read_to_string(&outputs.structure).unwrap();
        let back: SlidePlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan());
        assert!(json.contains("\n  \"project_name\": \"Harbour Site\""));

        let summary = std::fs::read_to_string(&outputs.summary).unwrap();
        assert!(summary.starts_with("# Slide Content Summary: Harbour Site"));
    }
}
