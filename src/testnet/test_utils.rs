//! Test utilities for miner testing

use crate::core::{CandidateTxn, OutPoint, TransactionRecord, TxInput, TxOutput};
use crate::error::Result;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

/// Raw bytes of the Bitcoin genesis coinbase transaction
pub const GENESIS_COINBASE_HEX: &str = "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";

/// Serialized Bitcoin genesis block header
pub const GENESIS_HEADER_HEX: &str = "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c";

const P2PKH_SCRIPT: &str = "76a914000102030405060708090a0b0c0d0e0f1011121388ac";
const P2WPKH_SCRIPT: &str = "0014000102030405060708090a0b0c0d0e0f10111213";

/// One-input, one-output legacy transaction
pub fn legacy_record(input_value: u64, output_value: u64) -> TransactionRecord {
    TransactionRecord {
        version: 1,
        vin: vec![TxInput {
            prevout: OutPoint {
                txid: [0x11; 32],
                vout: 0,
            },
            script_sig: vec![0x51; 10],
            sequence: 0xffff_fffe,
            prevout_value: Some(input_value),
            witness: None,
        }],
        vout: vec![TxOutput {
            value: output_value,
            script_pubkey: vec![0x76, 0xa9, 0x14, 0x00, 0x88, 0xac],
        }],
        locktime: 0,
    }
}

/// One-input, two-output P2WPKH-style transaction with a two-item witness
pub fn segwit_record() -> TransactionRecord {
    TransactionRecord {
        version: 2,
        vin: vec![TxInput {
            prevout: OutPoint {
                txid: [0x22; 32],
                vout: 1,
            },
            script_sig: vec![],
            sequence: 0xffff_ffff,
            prevout_value: Some(50_000),
            witness: Some(vec![vec![0x30; 71], vec![0x02; 33]]),
        }],
        vout: vec![
            TxOutput {
                value: 30_000,
                script_pubkey: vec![0x00, 0x14, 0xaa, 0xbb],
            },
            TxOutput {
                value: 18_000,
                script_pubkey: vec![0x00, 0x14, 0xcc, 0xdd],
            },
        ],
        locktime: 0,
    }
}

/// Candidate with a recognisable id byte
pub fn candidate(id: u8, fee: i64, weight: u64) -> CandidateTxn {
    CandidateTxn {
        txid: [id; 32],
        wtxid: [id; 32],
        weight,
        fee,
        source: format!("{id:02x}.json"),
    }
}

/// Mempool JSON for a legacy transaction
pub fn legacy_json(prev_txid: &str, input_value: u64, output_value: u64) -> Value {
    json!({
        "version": 1,
        "locktime": 0,
        "vin": [{
            "txid": prev_txid,
            "vout": 0,
            "prevout": {
                "scriptpubkey": P2PKH_SCRIPT,
                "value": input_value
            },
            "scriptsig": "483045022100aa",
            "is_coinbase": false,
            "sequence": 4294967295u32
        }],
        "vout": [{
            "scriptpubkey": P2PKH_SCRIPT,
            "scriptpubkey_type": "p2pkh",
            "value": output_value
        }]
    })
}

/// Mempool JSON for a segwit transaction
pub fn segwit_json(prev_txid: &str, input_value: u64, output_value: u64) -> Value {
    json!({
        "version": 2,
        "locktime": 0,
        "vin": [{
            "txid": prev_txid,
            "vout": 1,
            "prevout": {
                "scriptpubkey": P2WPKH_SCRIPT,
                "value": input_value
            },
            "scriptsig": "",
            "witness": [
                "3044022000aa",
                "02bbcc"
            ],
            "sequence": 4294967293u32
        }],
        "vout": [{
            "scriptpubkey": P2WPKH_SCRIPT,
            "value": output_value
        }]
    })
}

/// Write each `(file name, json)` pair into a fresh temporary mempool directory
pub fn create_test_mempool(files: &[(&str, Value)]) -> Result<TempDir> {
    let dir = tempfile::tempdir()?;
    for (name, value) in files {
        write_json(dir.path(), name, value)?;
    }
    Ok(dir)
}

pub fn write_json(dir: &Path, name: &str, value: &Value) -> Result<()> {
    std::fs::write(dir.join(name), serde_json::to_vec_pretty(value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_fees() {
        assert_eq!(legacy_record(100_000, 99_000).fee().unwrap(), 1_000);
        assert_eq!(segwit_record().fee().unwrap(), 2_000);
        assert!(segwit_record().is_segwit());
    }

    #[test]
    fn test_create_test_mempool() {
        let dir = create_test_mempool(&[("a.json", legacy_json(&"ab".repeat(32), 10, 5))]).unwrap();
        assert!(dir.path().join("a.json").exists());
    }
}
