// Byte-level helpers shared by the transaction and header codecs:
// Bitcoin CompactSize varints, byte-order reversal and lowercase hex.

use crate::error::{MinerError, Result};
use crate::utils::Hash;
use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};

/// Encode `n` as a CompactSize varint
pub fn encode_varint(n: u64) -> Vec<u8> {
    match n {
        0..=0xfc => vec![n as u8],
        0xfd..=0xffff => {
            let mut out = vec![0xfd];
            out.extend_from_slice(&(n as u16).to_le_bytes());
            out
        }
        0x1_0000..=0xffff_ffff => {
            let mut out = vec![0xfe];
            out.extend_from_slice(&(n as u32).to_le_bytes());
            out
        }
        _ => {
            let mut out = vec![0xff];
            out.extend_from_slice(&n.to_le_bytes());
            out
        }
    }
}

/// Decode a CompactSize varint, returning the value and the bytes consumed
pub fn decode_varint(bytes: &[u8]) -> Result<(u64, usize)> {
    let prefix = *bytes
        .first()
        .ok_or_else(|| MinerError::InvalidEncoding("varint: unexpected end of input".to_string()))?;

    let width = match prefix {
        0xfd => 2,
        0xfe => 4,
        0xff => 8,
        _ => return Ok((prefix as u64, 1)),
    };

    let body = bytes.get(1..1 + width).ok_or_else(|| {
        MinerError::InvalidEncoding(format!("varint: expected {width} bytes after 0x{prefix:02x}"))
    })?;
    let mut buf = [0u8; 8];
    buf[..width].copy_from_slice(body);
    Ok((u64::from_le_bytes(buf), 1 + width))
}

pub fn reversed(hash: &Hash) -> Hash {
    let mut out = *hash;
    out.reverse();
    out
}

pub fn encode_hex(bytes: &[u8]) -> String {
    HEXLOWER.encode(bytes)
}

pub fn decode_hex(text: &str) -> Result<Vec<u8>> {
    HEXLOWER_PERMISSIVE
        .decode(text.as_bytes())
        .map_err(|e| MinerError::Serialization(format!("Invalid hex string: {e}")))
}

/// Render a digest the way block explorers show it (byte-reversed)
pub fn to_display_hex(hash: &Hash) -> String {
    encode_hex(&reversed(hash))
}

/// Parse a display-order hex digest back into internal byte order
pub fn from_display_hex(text: &str) -> Result<Hash> {
    let bytes = decode_hex(text)?;
    let mut hash: Hash = bytes.as_slice().try_into().map_err(|_| {
        MinerError::Serialization(format!("Expected 32-byte hash, got {} bytes", bytes.len()))
    })?;
    hash.reverse();
    Ok(hash)
}
