//! Utility functions and helpers
//!
//! This module contains the hash primitives and byte codecs
//! used throughout the miner.

pub mod crypto;
pub mod encoding;

pub use crypto::{current_timestamp, double_sha256, sha256_digest, Hash, ZERO_HASH};

pub use encoding::{
    decode_hex, decode_varint, encode_hex, encode_varint, from_display_hex, reversed,
    to_display_hex,
};
