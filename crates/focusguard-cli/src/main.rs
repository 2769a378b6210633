use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusguard-cli", version, about = "FocusGuard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daily app budgets
    Budget {
        #[command(subcommand)]
        action: commands::budget::BudgetAction,
    },
    /// Persisted usage counters
    Usage {
        #[command(subcommand)]
        action: commands::usage::UsageAction,
    },
    /// Run one aggregation cycle
    Cycle(commands::cycle::CycleArgs),
    /// Feed foreground changes through the decision protocol
    Check(commands::check::CheckArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Log to stderr, filtered by `FOCUSGUARD_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("FOCUSGUARD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Budget { action } => commands::budget::run(action),
        Commands::Usage { action } => commands::usage::run(action),
        Commands::Cycle(args) => commands::cycle::run(args),
        Commands::Check(args) => commands::check::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
