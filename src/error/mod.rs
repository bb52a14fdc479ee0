//! Error handling for the miner
//!
//! This module provides the error types for every stage of block assembly,
//! from reading mempool records to the nonce search.

use std::fmt;

/// Result type alias for miner operations
pub type Result<T> = std::result::Result<T, MinerError>;

/// Error types for block assembly and mining
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinerError {
    /// A mempool record could not be read or is missing required fields
    MalformedRecord { file: String, reason: String },
    /// Raw transaction bytes could not be decoded
    InvalidEncoding(String),
    /// Every nonce was tried without meeting the target
    SearchExhausted { timestamp: u32 },
    /// A value sum or reward does not fit its integer type
    AmountOutOfRange(String),
    /// The selected transactions cannot form a block
    Template(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(String),
    /// Serialization/deserialization errors
    Serialization(String),
}

impl MinerError {
    pub fn malformed(file: impl Into<String>, reason: impl Into<String>) -> Self {
        MinerError::MalformedRecord {
            file: file.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for MinerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinerError::MalformedRecord { file, reason } => {
                write!(f, "Malformed transaction record {file}: {reason}")
            }
            MinerError::InvalidEncoding(msg) => write!(f, "Invalid transaction encoding: {msg}"),
            MinerError::SearchExhausted { timestamp } => write!(
                f,
                "Nonce space exhausted without meeting the target (timestamp {timestamp})"
            ),
            MinerError::AmountOutOfRange(msg) => write!(f, "Amount out of range: {msg}"),
            MinerError::Template(msg) => write!(f, "Block template error: {msg}"),
            MinerError::Config(msg) => write!(f, "Configuration error: {msg}"),
            MinerError::Io(msg) => write!(f, "I/O error: {msg}"),
            MinerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for MinerError {}

impl From<std::io::Error> for MinerError {
    fn from(err: std::io::Error) -> Self {
        MinerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MinerError {
    fn from(err: serde_json::Error) -> Self {
        MinerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for MinerError {
    fn from(err: toml::de::Error) -> Self {
        MinerError::Config(err.to_string())
    }
}
