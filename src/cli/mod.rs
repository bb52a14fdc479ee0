//! Command-line interface
//!
//! Argument parsing for the `mine` and `inspect` commands.

pub mod commands;

pub use commands::{Command, Opt};
