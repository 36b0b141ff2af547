//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "spendsense",
    about = "Rule-based personal finance analytics",
    version
)]
pub struct Cli {
    /// Path to the transaction snapshot (a JSON array of transactions)
    #[arg(short, long, global = true, default_value = "snapshot.json")]
    pub file: PathBuf,

    /// Analysis date (YYYY-MM-DD); defaults to today. Pinning this makes
    /// runs reproducible.
    #[arg(long, global = true, value_name = "DATE")]
    pub as_of: Option<String>,

    /// Emit raw JSON instead of formatted output
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full analysis pipeline and print every section
    Report,
    /// Detected daily/weekly/monthly spending routines
    Patterns,
    /// Per-category trends with spike/dip months
    Trends,
    /// Next-month spending forecast per category
    Predict,
    /// Top-ranked money leaks
    Leaks,
    /// All recurring monthly charges, investments included
    Recurring,
    /// Current-month category overspending alerts
    Overspending,
    /// Year-end savings projection
    Savings,
    /// Prioritized nudges
    Nudges,
}
