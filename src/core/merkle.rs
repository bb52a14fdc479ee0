use crate::error::{MinerError, Result};
use crate::utils::{double_sha256, Hash};

/// Bitcoin-style Merkle root computation.
///
/// Leaves are digests in internal byte order. Each level pairs nodes left to
/// right, duplicating the last node when the count is odd, and double-hashes
/// the 64-byte concatenation of every pair. The same engine produces the
/// transaction root and the witness root.
pub struct MerkleTree;

impl MerkleTree {
    /// Calculate the Merkle root from an ordered list of digests
    pub fn calculate_merkle_root(leaves: &[Hash]) -> Result<Hash> {
        if leaves.is_empty() {
            return Err(MinerError::Template(
                "Cannot calculate Merkle root from empty hash list".to_string(),
            ));
        }

        let mut current_level = leaves.to_vec();

        while current_level.len() > 1 {
            current_level = current_level
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => Self::hash_pair(left, right),
                    // Duplicate the last hash if odd number (Bitcoin behavior)
                    [last] => Self::hash_pair(last, last),
                    _ => unreachable!("chunks(2) yields one or two elements"),
                })
                .collect();
        }

        Ok(current_level[0])
    }

    /// Hash two nodes together (double SHA-256 of the concatenation)
    pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
        let mut combined = [0u8; 64];
        combined[..32].copy_from_slice(left);
        combined[32..].copy_from_slice(right);
        double_sha256(&combined)
    }
}
