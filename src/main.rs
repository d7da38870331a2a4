//! Permalift CLI: preview folder uploads against the ledger.

use anyhow::Result;
use clap::Parser;
use permalift::cli::Cli;
use permalift::cli::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
