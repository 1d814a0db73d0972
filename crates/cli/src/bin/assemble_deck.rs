//! Insert reference slides into a generated proposal deck.

use anyhow::Result;
use clap::Parser;
use deck_cli::{assemble, init_logging, AssembleArgs};

fn main() -> Result<()> {
    let args = AssembleArgs::parse();
    init_logging(args.verbose);

    let report = assemble::run(&args)?;

    println!("Architecture: {}", report.architecture);
    println!("Early reference block: {}", report.early_block);
    println!("Late reference block: {}", report.late_block);
    for warning in &report.warnings {
        println!("Warning: {}", warning);
    }
    println!(
        "Final deck: {} slides ({} before) written to {}",
        report.final_slides,
        report.generated_slides,
        args.output_path().display()
    );

    Ok(())
}
