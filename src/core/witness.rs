//! Witness commitment construction
//!
//! The coinbase commits to every witness id in the block:
//! `SHA256(witness_root || witness_reserved_value)`, where the witness root is
//! the Merkle root over `[0; 32]` (standing in for the coinbase itself)
//! followed by the selected transactions' wtxids.

use crate::core::MerkleTree;
use crate::error::Result;
use crate::utils::{sha256_digest, Hash, ZERO_HASH};

/// Fixed header identifying the witness commitment output
pub const WITNESS_COMMITMENT_HEADER: [u8; 4] = [0xaa, 0x21, 0xa9, 0xed];

/// Value committed alongside the witness root; also the coinbase witness item
pub const WITNESS_RESERVED_VALUE: Hash = ZERO_HASH;

const OP_RETURN: u8 = 0x6a;

/// Witness root over the coinbase placeholder followed by `wtxids`
pub fn witness_merkle_root(wtxids: &[Hash]) -> Result<Hash> {
    let mut leaves = Vec::with_capacity(wtxids.len() + 1);
    leaves.push(ZERO_HASH);
    leaves.extend_from_slice(wtxids);
    MerkleTree::calculate_merkle_root(&leaves)
}

/// Commitment digest for the given ordered witness ids (single SHA-256)
pub fn witness_commitment(wtxids: &[Hash]) -> Result<Hash> {
    let root = witness_merkle_root(wtxids)?;

    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(&root);
    preimage[32..].copy_from_slice(&WITNESS_RESERVED_VALUE);
    Ok(sha256_digest(&preimage))
}

/// `OP_RETURN <36 bytes: header || commitment>`
pub fn commitment_script(commitment: &Hash) -> Vec<u8> {
    let payload_len = WITNESS_COMMITMENT_HEADER.len() + commitment.len();
    let mut script = Vec::with_capacity(2 + payload_len);
    script.push(OP_RETURN);
    script.push(payload_len as u8);
    script.extend_from_slice(&WITNESS_COMMITMENT_HEADER);
    script.extend_from_slice(commitment);
    script
}

/// Pull the commitment back out of an output script, if it is a commitment output
pub fn extract_commitment(script: &[u8]) -> Option<Hash> {
    if script.len() < 38 || script[0] != OP_RETURN || script[1] != 0x24 {
        return None;
    }
    if script[2..6] != WITNESS_COMMITMENT_HEADER {
        return None;
    }
    let mut commitment = [0u8; 32];
    commitment.copy_from_slice(&script[6..38]);
    Some(commitment)
}
