use std::path::PathBuf;

use clap::{Args, ValueEnum};
use focusguard_core::{DecisionOutcome, EscapeHatch};
use serde::Serialize;

use super::{open_engine, require_completed};

#[derive(Clone, Copy, ValueEnum)]
enum Hatch {
    Points,
    Wait,
    Task,
}

#[derive(Args)]
pub struct CheckArgs {
    /// JSON file with today's usage
    #[arg(long)]
    usage: PathBuf,
    /// Grant a grace period to this package before checking (repeatable)
    #[arg(long = "grant")]
    grants: Vec<String>,
    /// Escape hatch used for grants
    #[arg(long, value_enum, default_value = "task")]
    hatch: Hatch,
    /// Output as JSON
    #[arg(long)]
    json: bool,
    /// Foreground packages, in the order they come to the front
    #[arg(required = true)]
    packages: Vec<String>,
}

#[derive(Serialize)]
struct CheckLine {
    foreground: String,
    #[serde(flatten)]
    outcome: DecisionOutcome,
}

pub fn run(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(&args.usage)?;
    require_completed(&engine.run_cycle())?;

    let hatch = match args.hatch {
        Hatch::Points => EscapeHatch::SpendPoints { cost: 10 },
        Hatch::Wait => EscapeHatch::WaitTimer,
        Hatch::Task => EscapeHatch::CompleteTask,
    };
    for package in &args.grants {
        let expires_at = engine.grant_temporary_unblock(package, hatch);
        if !args.json {
            println!("grace {package} until {}", expires_at.format("%H:%M:%S"));
        }
    }

    let lines: Vec<CheckLine> = args
        .packages
        .into_iter()
        .map(|foreground| {
            let outcome = engine.on_foreground_change(&foreground);
            CheckLine { foreground, outcome }
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
        return Ok(());
    }
    for line in &lines {
        let verdict = match &line.outcome {
            DecisionOutcome::Allow => "allow",
            DecisionOutcome::Block(_) => "block",
            DecisionOutcome::NoOpAlreadyBlocking(_) => "noop",
        };
        println!("{}\t{verdict}", line.foreground);
    }
    Ok(())
}
