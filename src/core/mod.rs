//! Core block assembly functionality
//!
//! This module contains the transaction codec, the Merkle engine, witness
//! commitments, coinbase construction, template selection and the
//! proof-of-work search.

pub mod block;
pub mod coinbase;
pub mod merkle;
pub mod monetary;
pub mod proof_of_work;
pub mod template;
pub mod transaction;
pub mod witness;

pub use block::{AssemblyParams, Block, BlockCandidate, BlockHeader};
pub use coinbase::CoinbaseTxn;
pub use merkle::MerkleTree;
pub use monetary::{BLOCK_SUBSIDY, BLOCK_WEIGHT_RESERVE, DEFAULT_TARGET, MAX_BLOCK_WEIGHT};
pub use proof_of_work::{ProofOfWork, SearchState};
pub use template::{BlockTemplate, CapacityPolicy};
pub use transaction::{
    CandidateTxn, OutPoint, SerializationResult, TransactionRecord, TxInput, TxOutput,
};
pub use witness::witness_commitment;
