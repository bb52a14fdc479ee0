//! Test fixtures for miner testing
//!
//! This module provides known-answer vectors, sample transaction records
//! and throw-away mempool directories shared by the unit tests.

pub mod test_utils;

pub use test_utils::*;
