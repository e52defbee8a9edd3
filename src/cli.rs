use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "sacache",
    version = "0.1",
    about = "Set-associative write-back LRU cache simulator for memory access traces"
)]
pub struct Cli {
    /// Trace file of hex `address op data` triples (`.zst` files are decompressed)
    pub input: PathBuf,

    /// Where read results are written
    #[arg(short = 'o', long, default_value = "sa-out.txt")]
    pub output: PathBuf,

    /// Reject malformed hex tokens instead of reading them as zero
    #[arg(long)]
    pub strict: bool,

    /// Also write a CSV summary of the run
    #[arg(long)]
    pub stats: Option<PathBuf>,

    /// Print a run summary
    #[arg(short, long)]
    pub verbose: bool,

    /// Log every access
    #[arg(short = 'd', long)]
    pub debug: bool,
}
