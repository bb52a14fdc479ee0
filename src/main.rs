// Entry point for the architect-miner CLI
use architect_miner::{
    current_timestamp, encode_hex, read_record, to_display_hex, BlockCandidate, Command, Mempool,
    MinerSettings, Opt, GLOBAL_CONFIG,
};
use clap::Parser;
use log::{error, info, LevelFilter};
use std::path::PathBuf;
use std::{fs, process};

fn main() {
    // Info by default, RUST_LOG still wins. Logs go to stderr so stdout stays clean.
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Mine {
            mempool,
            output,
            config,
            height,
            workers,
            timestamp,
            target,
            strict_capacity,
        } => {
            // Layering: defaults or the TOML file, then the environment, then flags
            let mut settings = GLOBAL_CONFIG.load(config.as_deref())?;
            apply_flags(
                &mut settings,
                mempool,
                output,
                height,
                workers,
                timestamp,
                target,
                strict_capacity,
            );
            settings.validate()?;

            let mempool = Mempool::load(&settings.mempool_dir)?;
            let timestamp = match settings.timestamp {
                Some(timestamp) => timestamp,
                None => current_timestamp()?,
            };
            let params = settings.assembly_params(timestamp)?;

            let candidate = BlockCandidate::assemble(mempool.candidates()?, &params)?;
            let block = candidate.mine(&settings.target_bytes()?, settings.workers)?;
            info!(
                "Mined block {} with {} transactions",
                to_display_hex(&block.get_hash()),
                block.get_txids().len()
            );

            let rendered = block.render();
            print!("{rendered}");
            if let Some(path) = settings.output_file {
                fs::write(&path, &rendered)?;
                info!("Wrote block to {}", path.display());
            }
        }
        Command::Inspect { file } => {
            let record = read_record(&file)?;
            let result = record.serialize(true)?;
            println!("txid: {}", to_display_hex(&record.txid()));
            println!("wtxid: {}", to_display_hex(&record.wtxid()));
            println!("weight: {}", result.weight);
            println!("fee: {}", result.fee);
            println!("segwit: {}", record.is_segwit());
            println!("size: {}", result.bytes.len());
            println!("hex: {}", encode_hex(&result.bytes));
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn apply_flags(
    settings: &mut MinerSettings,
    mempool: Option<PathBuf>,
    output: Option<PathBuf>,
    height: Option<u64>,
    workers: Option<usize>,
    timestamp: Option<u32>,
    target: Option<String>,
    strict_capacity: bool,
) {
    if let Some(dir) = mempool {
        settings.mempool_dir = dir;
    }
    if output.is_some() {
        settings.output_file = output;
    }
    if let Some(height) = height {
        settings.block_height = height;
    }
    if let Some(workers) = workers {
        settings.workers = workers;
    }
    if timestamp.is_some() {
        settings.timestamp = timestamp;
    }
    if let Some(target) = target {
        settings.target = target;
    }
    if strict_capacity {
        settings.strict_capacity = true;
    }
}
