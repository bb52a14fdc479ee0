//! # Architect Miner
//!
//! Assembles a candidate block from a directory of JSON mempool records and
//! mines it against a fixed proof-of-work target.
//!
//! ## Pipeline
//! 1. `storage::Mempool` loads and decodes every record.
//! 2. `core::TransactionRecord` serializes each one to get its txid, wtxid, weight and fee.
//! 3. `core::BlockTemplate` greedily picks transactions by fee rate under the weight budget.
//! 4. `core::witness` commits to the selected wtxids and `core::CoinbaseTxn` claims
//!    the subsidy plus fees.
//! 5. `core::MerkleTree` roots the txids into a `core::BlockHeader`.
//! 6. `core::ProofOfWork` searches nonces, optionally across several threads.
//!
//! ## Layout
//! - `core/`: serialization, merkle, witness commitment, coinbase, selection, mining
//! - `storage/`: mempool directory reader
//! - `config/`: layered runtime settings
//! - `utils/`: hashing and byte codecs
//! - `cli/`: command-line parsing
//! - `error/`: the crate-wide error type

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{Config, MinerSettings, GLOBAL_CONFIG};
pub use core::{
    AssemblyParams, Block, BlockCandidate, BlockHeader, BlockTemplate, CandidateTxn,
    CapacityPolicy, CoinbaseTxn, MerkleTree, OutPoint, ProofOfWork, SearchState,
    SerializationResult, TransactionRecord, TxInput, TxOutput,
};
pub use error::{MinerError, Result};
pub use storage::{expected_file_name, parse_record, read_record, Mempool};
pub use utils::{
    current_timestamp, decode_hex, double_sha256, encode_hex, from_display_hex, reversed,
    sha256_digest, to_display_hex, Hash,
};
