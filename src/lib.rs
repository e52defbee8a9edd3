use crate::cli::Cli;
use crate::io::{open_trace, replay, write_stats, ResultWriter, TokenPolicy};
use anyhow::{Context, Result};
use log::info;
use std::fs::File;

/// Core simulation: cache, sets and the simulation context
pub mod cache;
pub mod cli;
/// Cache topology
pub mod config;
pub mod decoder;
/// Trace input and result output
pub mod io;
pub mod line;
pub mod memory;
pub mod set;
pub mod utils;

pub use cache::{AccessResult, Cache, Operation, Outcome, SimStats, Simulation};
pub use config::CacheConfig;

pub fn run_this(cli: Cli) -> Result<SimStats> {
    let policy = if cli.strict { TokenPolicy::Strict } else { TokenPolicy::Lenient };
    let records = open_trace(&cli.input, policy)?;

    let mut sim = Simulation::new(CacheConfig::default());
    let mut sink = ResultWriter::create(&cli.output)?;
    let count = replay(&mut sim, records, &mut sink)
        .with_context(|| format!("Failed to replay trace {}", cli.input.display()))?;
    sink.into_inner()?;
    info!("replayed {} records from {}", count, cli.input.display());

    let stats = sim.stats();
    if let Some(path) = &cli.stats {
        let file = File::create(path).with_context(|| format!("Failed to create stats file {}", path.display()))?;
        write_stats(file, sim.config(), &stats)?;
    }

    if cli.verbose {
        println!(
            "reads: {}, writes: {}, hits: {}, misses: {}, writebacks: {}, miss rate: {:.4}",
            stats.reads,
            stats.writes,
            stats.hits,
            stats.misses,
            stats.writebacks,
            stats.miss_rate()
        );
    }
    Ok(stats)
}
