// This file implements the transaction codec - how a mempool record becomes wire bytes
// I derive everything the template needs from these bytes: txid, wtxid, weight and fee
// Legacy and segregated-witness encodings share one writer; only the witness region differs

use crate::error::{MinerError, Result};
use crate::utils::{decode_varint, double_sha256, encode_varint, Hash};
use serde::{Deserialize, Serialize};

// Non-witness bytes are charged this many weight units each
pub const WITNESS_SCALE_FACTOR: u64 = 4;

const SEGWIT_MARKER: u8 = 0x00;
const SEGWIT_FLAG: u8 = 0x01;

/// Reference to the output being spent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Previous transaction id in internal byte order
    pub txid: Hash,
    pub vout: u32,
}

impl OutPoint {
    /// The "no previous output" sentinel used by coinbase inputs
    pub fn null() -> OutPoint {
        OutPoint {
            txid: [0u8; 32],
            vout: u32::MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub prevout: OutPoint,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
    // Only used for fee accounting, never serialized
    pub prevout_value: Option<u64>,
    pub witness: Option<Vec<Vec<u8>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

/// A parsed transaction, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub version: u32,
    pub vin: Vec<TxInput>,
    pub vout: Vec<TxOutput>,
    pub locktime: u32,
}

/// Wire encoding of a transaction together with its fee and weight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializationResult {
    pub bytes: Vec<u8>,
    /// Input value minus output value; negative values are passed through
    pub fee: i64,
    pub weight: u64,
}

/// Everything the template selector needs to know about one mempool transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTxn {
    pub txid: Hash,
    pub wtxid: Hash,
    pub weight: u64,
    pub fee: i64,
    pub source: String,
}

// Accumulates wire bytes and keeps witness-region bytes apart for weight accounting
struct Encoder {
    bytes: Vec<u8>,
    witness_len: usize,
}

impl Encoder {
    fn new() -> Encoder {
        Encoder {
            bytes: Vec::new(),
            witness_len: 0,
        }
    }

    fn put(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    fn put_witness(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
        self.witness_len += data.len();
    }

    fn weight(&self) -> u64 {
        let base_len = (self.bytes.len() - self.witness_len) as u64;
        base_len * WITNESS_SCALE_FACTOR + self.witness_len as u64
    }
}

impl TransactionRecord {
    /// A witness on any input marks the whole transaction as segwit
    pub fn is_segwit(&self) -> bool {
        self.vin.iter().any(|input| input.witness.is_some())
    }

    /// Sum of declared previous-output values minus sum of output values.
    ///
    /// Sums are taken in `i128` so no realistic number of `u64` amounts can
    /// overflow; a difference outside the `i64` range is an error.
    pub fn fee(&self) -> Result<i64> {
        let input_value: i128 = self
            .vin
            .iter()
            .filter_map(|input| input.prevout_value)
            .map(i128::from)
            .sum();
        let output_value: i128 = self.vout.iter().map(|output| i128::from(output.value)).sum();
        let fee = input_value - output_value;
        i64::try_from(fee).map_err(|_| {
            MinerError::AmountOutOfRange(format!(
                "fee {fee} (inputs {input_value}, outputs {output_value}) does not fit in 64 bits"
            ))
        })
    }

    /// Encode the transaction with its fee and weight. The marker/flag form is only
    /// produced when `include_witness` is set and the transaction carries witness data.
    pub fn serialize(&self, include_witness: bool) -> Result<SerializationResult> {
        let enc = self.encode(include_witness);
        Ok(SerializationResult {
            weight: enc.weight(),
            fee: self.fee()?,
            bytes: enc.bytes,
        })
    }

    /// Wire bytes only
    pub fn to_bytes(&self, include_witness: bool) -> Vec<u8> {
        self.encode(include_witness).bytes
    }

    fn encode(&self, include_witness: bool) -> Encoder {
        let with_witness = include_witness && self.is_segwit();
        let mut enc = Encoder::new();

        enc.put(&self.version.to_le_bytes());
        if with_witness {
            enc.put_witness(&[SEGWIT_MARKER, SEGWIT_FLAG]);
        }

        enc.put(&encode_varint(self.vin.len() as u64));
        for input in &self.vin {
            enc.put(&input.prevout.txid);
            enc.put(&input.prevout.vout.to_le_bytes());
            enc.put(&encode_varint(input.script_sig.len() as u64));
            enc.put(&input.script_sig);
            enc.put(&input.sequence.to_le_bytes());
        }

        enc.put(&encode_varint(self.vout.len() as u64));
        for output in &self.vout {
            enc.put(&output.value.to_le_bytes());
            enc.put(&encode_varint(output.script_pubkey.len() as u64));
            enc.put(&output.script_pubkey);
        }

        if with_witness {
            for input in &self.vin {
                match &input.witness {
                    Some(items) => {
                        enc.put_witness(&encode_varint(items.len() as u64));
                        for item in items {
                            enc.put_witness(&encode_varint(item.len() as u64));
                            enc.put_witness(item);
                        }
                    }
                    None => enc.put_witness(&[0x00]),
                }
            }
        }

        enc.put(&self.locktime.to_le_bytes());
        enc
    }

    /// Double SHA-256 of the legacy encoding
    pub fn txid(&self) -> Hash {
        double_sha256(&self.to_bytes(false))
    }

    /// Double SHA-256 of the witness encoding; equals the txid for legacy transactions
    pub fn wtxid(&self) -> Hash {
        double_sha256(&self.to_bytes(true))
    }

    pub fn weight(&self) -> u64 {
        self.encode(true).weight()
    }

    pub fn to_candidate(&self, source: impl Into<String>) -> Result<CandidateTxn> {
        let legacy = self.encode(false);
        let txid = double_sha256(&legacy.bytes);
        let (wtxid, weight) = if self.is_segwit() {
            let full = self.encode(true);
            (double_sha256(&full.bytes), full.weight())
        } else {
            (txid, legacy.weight())
        };

        Ok(CandidateTxn {
            txid,
            wtxid,
            weight,
            fee: self.fee()?,
            source: source.into(),
        })
    }

    /// Parse a legacy or marker/flag encoded transaction.
    ///
    /// Previous-output values are not part of the wire format and come back as `None`.
    /// A `0x00` byte after the version is only read as the segwit marker when the
    /// following byte is the `0x01` flag; otherwise it is an empty input list.
    pub fn from_bytes(bytes: &[u8]) -> Result<TransactionRecord> {
        let mut reader = Reader::new(bytes);

        let version = reader.u32_le()?;
        let segwit = reader.peek(0) == Some(SEGWIT_MARKER) && reader.peek(1) == Some(SEGWIT_FLAG);
        if segwit {
            reader.take(2)?;
        }

        let input_count = reader.varint()?;
        let mut vin = Vec::new();
        for _ in 0..input_count {
            let txid = reader.hash()?;
            let vout = reader.u32_le()?;
            let script_len = reader.varint()?;
            let script_sig = reader.take(script_len as usize)?.to_vec();
            let sequence = reader.u32_le()?;
            vin.push(TxInput {
                prevout: OutPoint { txid, vout },
                script_sig,
                sequence,
                prevout_value: None,
                witness: None,
            });
        }

        let output_count = reader.varint()?;
        let mut vout = Vec::new();
        for _ in 0..output_count {
            let value = reader.u64_le()?;
            let script_len = reader.varint()?;
            let script_pubkey = reader.take(script_len as usize)?.to_vec();
            vout.push(TxOutput {
                value,
                script_pubkey,
            });
        }

        if segwit {
            for input in vin.iter_mut() {
                let item_count = reader.varint()?;
                if item_count == 0 {
                    continue;
                }
                let mut items = Vec::new();
                for _ in 0..item_count {
                    let len = reader.varint()?;
                    items.push(reader.take(len as usize)?.to_vec());
                }
                input.witness = Some(items);
            }
        }

        let locktime = reader.u32_le()?;
        if !reader.is_empty() {
            return Err(MinerError::InvalidEncoding(format!(
                "{} trailing bytes after locktime",
                reader.remaining()
            )));
        }

        Ok(TransactionRecord {
            version,
            vin,
            vout,
            locktime,
        })
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Reader<'a> {
        Reader { bytes, pos: 0 }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(MinerError::InvalidEncoding(format!(
                "needed {n} bytes at offset {}, only {} left",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u32_le(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(buf))
    }

    fn u64_le(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn hash(&mut self) -> Result<Hash> {
        let mut hash = [0u8; 32];
        hash.copy_from_slice(self.take(32)?);
        Ok(hash)
    }

    fn varint(&mut self) -> Result<u64> {
        let (value, used) = decode_varint(&self.bytes[self.pos..])?;
        self.pos += used;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::test_utils::{legacy_record, segwit_record, GENESIS_COINBASE_HEX};
    use crate::utils::{decode_hex, encode_hex, to_display_hex};

    #[test]
    fn test_genesis_coinbase_round_trip_and_txid() {
        let bytes = decode_hex(GENESIS_COINBASE_HEX).unwrap();
        let tx = TransactionRecord::from_bytes(&bytes).unwrap();

        assert_eq!(tx.version, 1);
        assert_eq!(tx.vin.len(), 1);
        assert_eq!(tx.vin[0].prevout, OutPoint::null());
        assert_eq!(tx.vout[0].value, 5_000_000_000);
        assert!(!tx.is_segwit());

        let encoded = tx.serialize(false).unwrap();
        assert_eq!(encode_hex(&encoded.bytes), GENESIS_COINBASE_HEX);
        assert_eq!(
            to_display_hex(&tx.txid()),
            "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
        );
    }

    #[test]
    fn test_legacy_weight_is_four_times_length() {
        let tx = legacy_record(100_000, 99_000);
        let result = tx.serialize(false).unwrap();
        assert_eq!(result.weight, 4 * result.bytes.len() as u64);
        // No witness: the witness flag changes nothing
        assert_eq!(tx.serialize(true).unwrap(), result);
    }

    #[test]
    fn test_legacy_ids_match() {
        let tx = legacy_record(100_000, 99_000);
        assert_eq!(tx.txid(), tx.wtxid());
        let candidate = tx.to_candidate("legacy.json").unwrap();
        assert_eq!(candidate.txid, candidate.wtxid);
        assert_eq!(candidate.fee, 1_000);
        assert_eq!(candidate.source, "legacy.json");
    }

    #[test]
    fn test_segwit_layout_and_weight() {
        let tx = segwit_record();
        let legacy = tx.serialize(false).unwrap();
        let full = tx.serialize(true).unwrap();

        assert_eq!(&full.bytes[4..6], &[SEGWIT_MARKER, SEGWIT_FLAG]);
        assert_eq!(full.bytes[..4], legacy.bytes[..4]);
        assert_eq!(full.bytes[full.bytes.len() - 4..], legacy.bytes[legacy.bytes.len() - 4..]);

        // marker + flag + witness section are the only extra bytes, each costing 1 unit
        let witness_region = (full.bytes.len() - legacy.bytes.len()) as u64;
        assert_eq!(full.weight, legacy.weight + witness_region);
        assert!(full.weight < 4 * full.bytes.len() as u64);

        assert_ne!(tx.txid(), tx.wtxid());
        assert_eq!(tx.txid(), double_sha256(&legacy.bytes));
    }

    #[test]
    fn test_input_without_witness_gets_empty_placeholder() {
        let mut tx = segwit_record();
        let mut bare = tx.vin[0].clone();
        bare.witness = None;
        tx.vin.push(bare);

        let full = tx.serialize(true).unwrap();
        // the last witness entry before locktime is the lone 0x00 placeholder
        let n = full.bytes.len();
        assert_eq!(full.bytes[n - 5], 0x00);

        let decoded = TransactionRecord::from_bytes(&full.bytes).unwrap();
        assert!(decoded.vin[0].witness.is_some());
        assert!(decoded.vin[1].witness.is_none());
    }

    #[test]
    fn test_segwit_round_trip() {
        let tx = segwit_record();
        let decoded = TransactionRecord::from_bytes(&tx.to_bytes(true)).unwrap();

        assert_eq!(decoded.version, tx.version);
        assert_eq!(decoded.locktime, tx.locktime);
        assert_eq!(decoded.vout, tx.vout);
        assert_eq!(decoded.vin[0].witness, tx.vin[0].witness);
        assert_eq!(decoded.vin[0].prevout, tx.vin[0].prevout);
        assert_eq!(decoded.wtxid(), tx.wtxid());
    }

    #[test]
    fn test_negative_fee_passes_through() {
        let tx = legacy_record(1_000, 5_000);
        assert_eq!(tx.serialize(false).unwrap().fee, -4_000);
    }

    #[test]
    fn test_missing_prevout_value_counts_as_zero() {
        let mut tx = legacy_record(10_000, 4_000);
        tx.vin[0].prevout_value = None;
        assert_eq!(tx.fee().unwrap(), -4_000);
    }

    #[test]
    fn test_decode_rejects_truncated_and_trailing() {
        let bytes = legacy_record(100_000, 99_000).to_bytes(false);
        assert!(TransactionRecord::from_bytes(&bytes[..bytes.len() - 1]).is_err());

        let mut extended = bytes.clone();
        extended.push(0x00);
        assert!(matches!(
            TransactionRecord::from_bytes(&extended),
            Err(MinerError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let tx = segwit_record();
        assert_eq!(tx.serialize(true).unwrap(), tx.serialize(true).unwrap());
        assert_eq!(tx.to_candidate("a").unwrap(), tx.to_candidate("a").unwrap());
    }

    #[test]
    fn test_fee_outside_i64_range_is_an_error() {
        let mut tx = legacy_record(10, 0);
        tx.vout[0].value = u64::MAX;
        let expected = 10 - i128::from(u64::MAX);
        assert!(expected < i64::MIN as i128);
        assert!(matches!(tx.fee(), Err(MinerError::AmountOutOfRange(_))));
        assert!(tx.serialize(false).is_err());
        assert!(tx.to_candidate("big.json").is_err());
        // ids and bytes do not depend on the fee
        assert_eq!(tx.txid(), double_sha256(&tx.to_bytes(false)));
    }

    #[test]
    fn test_fee_sums_do_not_wrap() {
        // three outputs of 2^62 sum past both u64 and i64
        let mut tx = legacy_record(0, 1 << 62);
        tx.vout.push(tx.vout[0].clone());
        tx.vout.push(tx.vout[0].clone());
        assert!(matches!(tx.fee(), Err(MinerError::AmountOutOfRange(_))));

        // large values that cancel out are still exact
        let mut balanced = legacy_record(u64::MAX, u64::MAX - 7);
        balanced.vin.push(balanced.vin[0].clone());
        balanced.vout.push(TxOutput {
            value: u64::MAX,
            script_pubkey: vec![0x51],
        });
        assert_eq!(balanced.fee().unwrap(), 7);
    }
}
