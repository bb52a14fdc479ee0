use crate::core::{CandidateTxn, OutPoint, TransactionRecord, TxInput, TxOutput};
use crate::error::{MinerError, Result};
use crate::utils::{decode_hex, encode_hex, reversed, sha256_digest, Hash};
use log::{debug, info, warn};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

// Mempool file layout. Fields this miner does not use (`scriptsig_asm`,
// `is_coinbase`, `scriptpubkey_type`, ...) are ignored.
#[derive(Debug, Deserialize)]
struct RawTransaction {
    version: u32,
    locktime: u32,
    vin: Vec<RawInput>,
    vout: Vec<RawOutput>,
}

#[derive(Debug, Deserialize)]
struct RawInput {
    txid: String,
    vout: u32,
    prevout: Option<RawPrevout>,
    scriptsig: String,
    sequence: u32,
    witness: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawPrevout {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    value: u64,
    scriptpubkey: String,
}

impl RawTransaction {
    fn into_record(self, file: &str) -> Result<TransactionRecord> {
        let hex = |field: &str, text: &str| {
            decode_hex(text).map_err(|e| MinerError::malformed(file, format!("{field}: {e}")))
        };

        let mut vin = Vec::with_capacity(self.vin.len());
        for (index, input) in self.vin.into_iter().enumerate() {
            let txid_bytes = hex("vin.txid", input.txid.as_str())?;
            let mut txid: Hash = txid_bytes.as_slice().try_into().map_err(|_| {
                MinerError::malformed(
                    file,
                    format!("vin[{index}].txid is {} bytes, expected 32", txid_bytes.len()),
                )
            })?;
            // JSON carries display order
            txid.reverse();

            let witness = match input.witness {
                Some(items) => Some(
                    items
                        .iter()
                        .map(|item| hex("vin.witness", item.as_str()))
                        .collect::<Result<Vec<_>>>()?,
                ),
                None => None,
            };

            vin.push(TxInput {
                prevout: OutPoint {
                    txid,
                    vout: input.vout,
                },
                script_sig: hex("vin.scriptsig", input.scriptsig.as_str())?,
                sequence: input.sequence,
                prevout_value: input.prevout.map(|prevout| prevout.value),
                witness,
            });
        }

        let vout = self
            .vout
            .into_iter()
            .map(|output| {
                Ok(TxOutput {
                    value: output.value,
                    script_pubkey: hex("vout.scriptpubkey", output.scriptpubkey.as_str())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let record = TransactionRecord {
            version: self.version,
            vin,
            vout,
            locktime: self.locktime,
        };
        // Amounts are valid u64s but their difference must still be representable
        record
            .fee()
            .map_err(|e| MinerError::malformed(file, e.to_string()))?;
        Ok(record)
    }
}

/// Parse one mempool JSON document
pub fn parse_record(json: &str, file: &str) -> Result<TransactionRecord> {
    let raw: RawTransaction =
        serde_json::from_str(json).map_err(|e| MinerError::malformed(file, e.to_string()))?;
    raw.into_record(file)
}

/// Read and parse a single mempool file
pub fn read_record(path: &Path) -> Result<TransactionRecord> {
    let file = path.display().to_string();
    let json = fs::read_to_string(path).map_err(|e| MinerError::malformed(&file, e.to_string()))?;
    parse_record(&json, &file)
}

/// Mempool files are conventionally named after SHA-256 of the display-order txid
pub fn expected_file_name(txid: &Hash) -> String {
    format!("{}.json", encode_hex(&sha256_digest(&reversed(txid))))
}

/// Transactions loaded from a mempool directory, in ascending file-name order
pub struct Mempool {
    entries: Vec<(String, TransactionRecord)>,
}

impl Mempool {
    /// Load every `*.json` file in `dir`. Any unreadable or malformed file aborts the load.
    pub fn load(dir: &Path) -> Result<Mempool> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| MinerError::Io(format!("Cannot read mempool {}: {e}", dir.display())))?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let record = read_record(&path)?;
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            let expected = expected_file_name(&record.txid());
            if name != expected {
                warn!("{name} does not match its txid (expected {expected})");
            }
            debug!("Loaded {name}");
            entries.push((name, record));
        }

        info!("Loaded {} transactions from {}", entries.len(), dir.display());
        Ok(Mempool { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Derive id, witness id, weight and fee for every record, keeping load order
    pub fn candidates(&self) -> Result<Vec<CandidateTxn>> {
        self.entries
            .iter()
            .map(|(name, record)| {
                record
                    .to_candidate(name.as_str())
                    .map_err(|e| MinerError::malformed(name.as_str(), e.to_string()))
            })
            .collect()
    }
}
