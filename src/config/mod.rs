//! Configuration management
//!
//! Miner settings layered from defaults, an optional TOML file,
//! environment variables and command-line flags.

pub mod settings;

pub use settings::{Config, MinerSettings, GLOBAL_CONFIG};
