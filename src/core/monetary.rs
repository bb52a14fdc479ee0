//! Protocol constants used by block assembly
//!
//! Amounts are in satoshis (100,000,000 per coin). The subsidy is
//! 3.125 coins, the post-2024 halving era.

use crate::error::{MinerError, Result};

/// Block subsidy in satoshis (3.125 coins)
pub const BLOCK_SUBSIDY: u64 = 312_500_000;

/// Block weight budget in weight units
pub const MAX_BLOCK_WEIGHT: u64 = 4_000_000;

/// Selection stops once remaining capacity drops to this many weight units
pub const BLOCK_WEIGHT_RESERVE: u64 = 1_000;

/// Header version written into every mined block
pub const BLOCK_VERSION: u32 = 0x0000_0007;

/// Compact difficulty encoding written into the header
pub const BLOCK_BITS: u32 = 0x1f00_ffff;

/// Default proof-of-work target (big-endian)
pub const DEFAULT_TARGET: [u8; 32] = [
    0x00, 0x00, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Height embedded in the coinbase when none is configured
pub const DEFAULT_BLOCK_HEIGHT: u64 = 840_000;

/// Version of the coinbase transaction
pub const COINBASE_VERSION: u32 = 1;

/// Coinbase reward for a block collecting `total_fees`
pub fn block_reward(total_fees: u64) -> Result<u64> {
    BLOCK_SUBSIDY.checked_add(total_fees).ok_or_else(|| {
        MinerError::AmountOutOfRange(format!("subsidy plus {total_fees} in fees overflows"))
    })
}
