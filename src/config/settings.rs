use crate::error::{BlockchainError, Result};
use crate::utils::{AccountId, Digest};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

static DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 2001;
const DEFAULT_BATCH_SIZE: usize = 50_000;
const DEFAULT_GENESIS_ACCOUNTS: usize = 100;
const DEFAULT_STARTING_BALANCE: u64 = 100_000;

/// Difficulty is a count of leading hex zeros in a 64-char digest
pub const MAX_DIFFICULTY: usize = 64;

/// Node settings. Loaded from defaults, then an optional TOML file, then the
/// command line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Peer ports ("2002") or full addresses ("10.0.0.2:2002")
    pub peers: Vec<String>,
    pub difficulty: usize,
    pub batch_size: usize,
    pub numcores: usize,
    pub mining_timeout_ms: Option<u64>,
    /// 64 hex chars; all zeros when unset
    pub miner_address: Option<String>,
    pub genesis_accounts: usize,
    pub starting_balance: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
            peers: Vec::new(),
            difficulty: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            numcores: 1,
            mining_timeout_ms: None,
            miner_address: None,
            genesis_accounts: DEFAULT_GENESIS_ACCOUNTS,
            starting_balance: DEFAULT_STARTING_BALANCE,
        }
    }
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    pub fn from_toml_str(text: &str) -> Result<Config> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            BlockchainError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Config::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(BlockchainError::Config(
                "batch size must be at least 1".to_string(),
            ));
        }
        if self.numcores == 0 {
            return Err(BlockchainError::Config(
                "numcores must be at least 1".to_string(),
            ));
        }
        if self.difficulty > MAX_DIFFICULTY {
            return Err(BlockchainError::Config(format!(
                "difficulty {} exceeds the {MAX_DIFFICULTY} hex digits of a digest",
                self.difficulty
            )));
        }
        self.miner_account()?;
        Ok(())
    }

    pub fn get_node_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Peers as socket address strings; bare ports are taken to be local
    pub fn peer_addrs(&self) -> Vec<String> {
        self.peers
            .iter()
            .map(|peer| peer.trim())
            .filter(|peer| !peer.is_empty())
            .map(|peer| {
                if peer.parse::<u16>().is_ok() {
                    format!("{DEFAULT_HOST}:{peer}")
                } else {
                    peer.to_string()
                }
            })
            .collect()
    }

    pub fn mining_timeout(&self) -> Option<Duration> {
        self.mining_timeout_ms.map(Duration::from_millis)
    }

    pub fn miner_account(&self) -> Result<AccountId> {
        match &self.miner_address {
            Some(hex) => Digest::from_hex(hex.trim())
                .map_err(|e| BlockchainError::Config(format!("invalid miner address: {e}"))),
            None => Ok(Digest::default()),
        }
    }
}
