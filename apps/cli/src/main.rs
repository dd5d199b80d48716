//! ecfr — download, combine, and summarize eCFR title structures.
//!
//! Turns one JSON structure document per CFR title into a combined corpus
//! and a flat, per-node summary with word counts.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
