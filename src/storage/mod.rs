//! Mempool storage
//!
//! This module reads the directory of JSON-encoded transactions the
//! miner builds its block from.

pub mod mempool;

pub use mempool::{expected_file_name, parse_record, read_record, Mempool};
