// The coinbase is the reward-claiming transaction at the front of every block
// It pays subsidy + fees to the payout script and carries the witness commitment

use crate::core::monetary::{block_reward, COINBASE_VERSION};
use crate::core::witness::{commitment_script, WITNESS_RESERVED_VALUE};
use crate::core::{OutPoint, TransactionRecord, TxInput, TxOutput};
use crate::error::{MinerError, Result};
use crate::utils::{double_sha256, Hash};

const OP_PUSHDATA1: u8 = 0x4c;

/// Coinbase transaction plus the ids derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinbaseTxn {
    record: TransactionRecord,
    txid: Hash,
    reward: u64,
}

impl CoinbaseTxn {
    /// Build the coinbase for a block at `block_height` collecting `total_fees`
    pub fn build(
        block_height: u64,
        total_fees: u64,
        witness_commitment: &Hash,
        payout_script: &[u8],
        tag: &[u8],
    ) -> Result<CoinbaseTxn> {
        let reward = block_reward(total_fees)?;

        let mut script_sig = push_data(&encode_script_number(block_height))?;
        script_sig.extend(push_data(tag)?);

        let input = TxInput {
            prevout: OutPoint::null(),
            script_sig,
            sequence: u32::MAX,
            // New money, so the coinbase reports a zero fee
            prevout_value: Some(reward),
            // The placeholder witness item makes the coinbase a segwit transaction
            witness: Some(vec![WITNESS_RESERVED_VALUE.to_vec()]),
        };

        let record = TransactionRecord {
            version: COINBASE_VERSION,
            vin: vec![input],
            vout: vec![
                TxOutput {
                    value: reward,
                    script_pubkey: payout_script.to_vec(),
                },
                TxOutput {
                    value: 0,
                    script_pubkey: commitment_script(witness_commitment),
                },
            ],
            locktime: 0,
        };

        let txid = double_sha256(&record.to_bytes(false));
        Ok(CoinbaseTxn {
            record,
            txid,
            reward,
        })
    }

    pub fn get_record(&self) -> &TransactionRecord {
        &self.record
    }

    /// Legacy txid; the first leaf of the transaction Merkle tree
    pub fn get_txid(&self) -> Hash {
        self.txid
    }

    pub fn get_reward(&self) -> u64 {
        self.reward
    }

    /// Witness-inclusive encoding, as submitted with the block
    pub fn segwit_bytes(&self) -> Vec<u8> {
        self.record.to_bytes(true)
    }
}

/// Minimal little-endian script number, with a sign byte when the top bit is set
pub fn encode_script_number(n: u64) -> Vec<u8> {
    let mut bytes: Vec<u8> = n.to_le_bytes().to_vec();
    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    if bytes.last().is_some_and(|b| b & 0x80 != 0) {
        bytes.push(0x00);
    }
    bytes
}

/// Length-prefixed push of `data`, at most 255 bytes
pub fn push_data(data: &[u8]) -> Result<Vec<u8>> {
    let len = u8::try_from(data.len()).map_err(|_| {
        MinerError::Template(format!("coinbase push of {} bytes exceeds 255", data.len()))
    })?;
    let mut out = Vec::with_capacity(data.len() + 2);
    if len >= OP_PUSHDATA1 {
        out.push(OP_PUSHDATA1);
    }
    out.push(len);
    out.extend_from_slice(data);
    Ok(out)
}
