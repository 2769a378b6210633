use std::path::PathBuf;

use clap::Args;

use super::{open_engine, require_completed};

#[derive(Args)]
pub struct CycleArgs {
    /// JSON file with today's usage: [{"package_name": ..., "total_foreground_millis": ...}]
    #[arg(long)]
    usage: PathBuf,
    /// Output the full cycle report as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: CycleArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(&args.usage)?;
    let outcome = engine.run_cycle();
    require_completed(&outcome)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let blocked = engine.block_state().current();
    if blocked.is_empty() {
        println!("nothing over budget");
    }
    for package in blocked.iter() {
        println!("{package}");
    }
    if let Some(report) = outcome.report() {
        if report.persistence_failures > 0 {
            eprintln!("warning: {} usage record(s) not saved", report.persistence_failures);
        }
    }
    Ok(())
}
