use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "architect-miner")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "mine", about = "Assemble a block from a mempool directory and mine it")]
    Mine {
        #[arg(long = "mempool", help = "Directory of mempool JSON records")]
        mempool: Option<PathBuf>,
        #[arg(long = "output", help = "Also write the result to FILE")]
        output: Option<PathBuf>,
        #[arg(long = "config", help = "TOML settings file")]
        config: Option<PathBuf>,
        #[arg(long = "height", help = "Block height encoded in the coinbase")]
        height: Option<u64>,
        #[arg(long = "workers", help = "Number of nonce search threads")]
        workers: Option<usize>,
        #[arg(long = "timestamp", help = "Header timestamp in seconds (default: now)")]
        timestamp: Option<u32>,
        #[arg(long = "target", help = "Big-endian hex proof-of-work target")]
        target: Option<String>,
        #[arg(
            long = "strict-capacity",
            help = "Skip transactions heavier than the remaining block weight"
        )]
        strict_capacity: bool,
    },
    #[command(name = "inspect", about = "Print the ids, weight and fee of one mempool record")]
    Inspect {
        #[arg(help = "Mempool JSON file")]
        file: PathBuf,
    },
}
