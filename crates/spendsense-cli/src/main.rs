//! spendsense CLI - rule-based personal finance analytics
//!
//! Usage:
//!   spendsense --file txs.json report        Full analysis report
//!   spendsense --file txs.json leaks         Top-ranked money leaks
//!   spendsense --file txs.json --as-of 2026-06-20 savings
//!
//! The snapshot file is a JSON array of transactions:
//!   [{"date": "2026-06-05", "amount": -499.0, "narration": "UPI-NETFLIX-...",
//!     "category": "Entertainment", "subcategory": null, "transaction_type": null}]

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let snapshot = commands::load_snapshot(&cli.file)?;
    let today = commands::resolve_as_of(cli.as_of.as_deref())?;

    match cli.command {
        Commands::Report => commands::cmd_report(&snapshot, today, cli.json),
        Commands::Patterns => commands::cmd_patterns(&snapshot, today, cli.json),
        Commands::Trends => commands::cmd_trends(&snapshot, today, cli.json),
        Commands::Predict => commands::cmd_predict(&snapshot, today, cli.json),
        Commands::Leaks => commands::cmd_leaks(&snapshot, today, cli.json),
        Commands::Recurring => commands::cmd_recurring(&snapshot, today, cli.json),
        Commands::Overspending => commands::cmd_overspending(&snapshot, today, cli.json),
        Commands::Savings => commands::cmd_savings(&snapshot, today, cli.json),
        Commands::Nudges => commands::cmd_nudges(&snapshot, today, cli.json),
    }
}
