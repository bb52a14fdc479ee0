use ring::digest::{Context, SHA256};

use crate::error::{MinerError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// 256-bit digest in internal (natural) byte order
pub type Hash = [u8; 32];

pub const ZERO_HASH: Hash = [0u8; 32];

/// Wall-clock time in whole seconds, as carried by a block header
pub fn current_timestamp() -> Result<u32> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| MinerError::Config(format!("System time error: {e}")))?
        .as_secs();

    u32::try_from(secs).map_err(|_| MinerError::Config("Timestamp overflow".to_string()))
}

pub fn sha256_digest(data: &[u8]) -> Hash {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    let mut hash = ZERO_HASH;
    hash.copy_from_slice(digest.as_ref());
    hash
}

/// SHA-256 applied twice, used for txids, merkle nodes and header hashes
pub fn double_sha256(data: &[u8]) -> Hash {
    sha256_digest(&sha256_digest(data))
}
