//! windraw CLI - backend and module diagnostics

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    log::debug!("Running {:?}", cli.command);
    match cli.command {
        Commands::Info => commands::info::run(),
        Commands::Probe(args) => commands::probe::run(&args),
    }
}
