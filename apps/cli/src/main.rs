//! Rolodex CLI — CRM account enrichment.
//!
//! Pulls candidate contacts and company facts from an enrichment source,
//! filters and ranks them, and writes the best back to the system of record.

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
