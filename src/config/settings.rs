use crate::core::monetary::{DEFAULT_BLOCK_HEIGHT, DEFAULT_TARGET, MAX_BLOCK_WEIGHT};
use crate::core::{AssemblyParams, CapacityPolicy};
use crate::error::{MinerError, Result};
use crate::utils::{decode_hex, encode_hex, Hash};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

static DEFAULT_MEMPOOL_DIR: &str = "./mempool";
static DEFAULT_PAYOUT_SCRIPT: &str = "76a91455ae51684c43435da751ac8d2173b2652eb6410588ac";
static DEFAULT_COINBASE_TAG: &str = "architect-miner";

const MEMPOOL_DIR_KEY: &str = "MEMPOOL_DIR";
const BLOCK_HEIGHT_KEY: &str = "BLOCK_HEIGHT";
const WORKERS_KEY: &str = "MINER_WORKERS";
const TIMESTAMP_KEY: &str = "MINER_TIMESTAMP";

// Keeps the coinbase unlocking script well under the 100-byte limit
const MAX_COINBASE_TAG_LEN: usize = 64;

/// Upper bound on nonce search threads
pub const MAX_WORKERS: usize = 256;

/// Everything the `mine` command can be configured with
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MinerSettings {
    pub mempool_dir: PathBuf,
    pub output_file: Option<PathBuf>,
    pub block_height: u64,
    pub workers: usize,
    /// Hex-encoded locking script receiving the block reward
    pub payout_script: String,
    pub coinbase_tag: String,
    /// Fixed header timestamp; wall clock when unset
    pub timestamp: Option<u32>,
    /// Big-endian hex target
    pub target: String,
    pub strict_capacity: bool,
}

impl Default for MinerSettings {
    fn default() -> Self {
        MinerSettings {
            mempool_dir: PathBuf::from(DEFAULT_MEMPOOL_DIR),
            output_file: None,
            block_height: DEFAULT_BLOCK_HEIGHT,
            workers: 1,
            payout_script: DEFAULT_PAYOUT_SCRIPT.to_string(),
            coinbase_tag: DEFAULT_COINBASE_TAG.to_string(),
            timestamp: None,
            target: encode_hex(&DEFAULT_TARGET),
            strict_capacity: false,
        }
    }
}

impl MinerSettings {
    pub fn from_toml_str(text: &str) -> Result<MinerSettings> {
        let settings: MinerSettings = toml::from_str(text)?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<MinerSettings> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            MinerError::Config(format!("Cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Override fields from a key lookup (the process environment in production)
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(MEMPOOL_DIR_KEY) {
            self.mempool_dir = PathBuf::from(dir);
        }
        if let Some(height) = lookup(BLOCK_HEIGHT_KEY) {
            self.block_height = parse_var(BLOCK_HEIGHT_KEY, &height)?;
        }
        if let Some(workers) = lookup(WORKERS_KEY) {
            self.workers = parse_var(WORKERS_KEY, &workers)?;
        }
        if let Some(timestamp) = lookup(TIMESTAMP_KEY) {
            self.timestamp = Some(parse_var(TIMESTAMP_KEY, &timestamp)?);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(MinerError::Config(format!(
                "workers must be between 1 and {MAX_WORKERS}, got {}",
                self.workers
            )));
        }
        if self.coinbase_tag.len() > MAX_COINBASE_TAG_LEN {
            return Err(MinerError::Config(format!(
                "coinbase tag is {} bytes, at most {MAX_COINBASE_TAG_LEN} allowed",
                self.coinbase_tag.len()
            )));
        }
        self.payout_script_bytes()?;
        self.target_bytes()?;
        Ok(())
    }

    pub fn payout_script_bytes(&self) -> Result<Vec<u8>> {
        let script = decode_hex(&self.payout_script)
            .map_err(|e| MinerError::Config(format!("payout_script: {e}")))?;
        if script.is_empty() {
            return Err(MinerError::Config("payout_script must not be empty".to_string()));
        }
        Ok(script)
    }

    pub fn target_bytes(&self) -> Result<Hash> {
        let bytes =
            decode_hex(&self.target).map_err(|e| MinerError::Config(format!("target: {e}")))?;
        bytes.as_slice().try_into().map_err(|_| {
            MinerError::Config(format!("target must be 32 bytes, got {}", bytes.len()))
        })
    }

    pub fn capacity_policy(&self) -> CapacityPolicy {
        if self.strict_capacity {
            CapacityPolicy::Strict
        } else {
            CapacityPolicy::ReserveOnly
        }
    }

    /// Block assembly inputs for a header stamped with `timestamp`
    pub fn assembly_params(&self, timestamp: u32) -> Result<AssemblyParams> {
        Ok(AssemblyParams {
            block_height: self.block_height,
            timestamp,
            payout_script: self.payout_script_bytes()?,
            coinbase_tag: self.coinbase_tag.as_bytes().to_vec(),
            capacity: MAX_BLOCK_WEIGHT,
            policy: self.capacity_policy(),
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| MinerError::Config(format!("Invalid value for {key}: {value}")))
}

pub struct Config {
    inner: RwLock<MinerSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Config {
        Config {
            inner: RwLock::new(MinerSettings::default()),
        }
    }

    /// Current settings, or those of `file` when given, overridden by the environment
    pub fn load(&self, file: Option<&Path>) -> Result<MinerSettings> {
        self.load_with(file, |key| env::var(key).ok())
    }

    /// Same layering as [`Config::load`] with a custom variable lookup.
    /// Any invalid override fails the whole load.
    pub fn load_with<F>(&self, file: Option<&Path>, lookup: F) -> Result<MinerSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match file {
            Some(path) => MinerSettings::from_file(path)?,
            None => self.get_settings(),
        };
        settings.apply_vars(lookup)?;
        Ok(settings)
    }

    pub fn get_settings(&self) -> MinerSettings {
        self.inner
            .read()
            .expect("Failed to acquire read lock on config - this should never happen")
            .clone()
    }
}
