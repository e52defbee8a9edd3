use anyhow::Result;
use clap::Parser;
use sacache::cli::Cli;
use sacache::utils::{init_logger, level_for};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(level_for(cli.verbose, cli.debug));

    sacache::run_this(cli)?;
    Ok(())
}
