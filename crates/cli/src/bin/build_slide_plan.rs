//! Build a slide plan from a technical proposal.

use anyhow::Result;
use clap::Parser;
use deck_cli::{init_logging, plan, PlanArgs};

fn main() -> Result<()> {
    let args = PlanArgs::parse();
    init_logging(args.verbose);

    let (plan, outputs) = plan::run(&args)?;

    println!(
        "Slide plan for '{}' ({}): {} slides",
        plan.project_name, plan.client_name, plan.total_slides
    );
    println!("Structure: {}", outputs.structure.display());
    println!("Summary: {}", outputs.summary.display());

    Ok(())
}
