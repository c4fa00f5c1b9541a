use crate::config::Config;
use crate::error::Result;
use crate::utils::{parse_account, AccountId};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// An account given on the command line, either a genesis index or 64 hex chars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountArg(pub AccountId);

impl FromStr for AccountArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        parse_account(s).map(AccountArg).map_err(|e| e.to_string())
    }
}

impl std::fmt::Display for AccountArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Parser)]
#[command(name = "nonce-chain")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "startnode", about = "Start a ledger node")]
    StartNode(NodeArgs),
    #[command(name = "send", about = "Send a transaction to a running node")]
    Send {
        #[arg(long, help = "Node address, e.g. 127.0.0.1:2001")]
        node: String,
        #[arg(long, help = "Sender: genesis index or 64-char hex id")]
        from: AccountArg,
        #[arg(long, help = "Receiver: genesis index or 64-char hex id")]
        to: AccountArg,
        #[arg(long)]
        amount: u128,
        #[arg(long, help = "Timestamp in milliseconds, defaults to now")]
        timestamp: Option<u128>,
    },
    #[command(name = "getblock", about = "Fetch a block by height from a running node")]
    GetBlock {
        #[arg(long)]
        node: String,
        #[arg(long, help = "1-based block height")]
        height: u64,
        #[arg(long, help = "Transactions per block on that node")]
        numtxinblock: usize,
    },
    #[command(name = "close", about = "Shut a running node down")]
    Close {
        #[arg(long)]
        node: String,
    },
}

/// Node settings given on the command line. Anything left unset falls back
/// to the config file, then to the defaults.
#[derive(Args, Debug, Default, Clone)]
pub struct NodeArgs {
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long, value_delimiter = ',', help = "Peer ports or addresses, comma separated")]
    pub peers: Vec<String>,
    #[arg(long, help = "Required leading hex zeros in a block hash")]
    pub difficulty: Option<usize>,
    #[arg(long, help = "Transactions per block")]
    pub numtxinblock: Option<usize>,
    #[arg(long, help = "Mining worker threads")]
    pub numcores: Option<usize>,
    #[arg(long)]
    pub mining_timeout_ms: Option<u64>,
    #[arg(long, help = "Miner address as 64 hex chars")]
    pub miner_address: Option<String>,
    #[arg(long, help = "TOML config file")]
    pub config: Option<PathBuf>,
}

impl NodeArgs {
    /// Layer these flags over the config file (or the defaults) and validate
    pub fn to_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::new(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if !self.peers.is_empty() {
            config.peers = self.peers.clone();
        }
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(batch_size) = self.numtxinblock {
            config.batch_size = batch_size;
        }
        if let Some(numcores) = self.numcores {
            config.numcores = numcores;
        }
        if self.mining_timeout_ms.is_some() {
            config.mining_timeout_ms = self.mining_timeout_ms;
        }
        if self.miner_address.is_some() {
            config.miner_address = self.miner_address.clone();
        }

        config.validate()?;
        Ok(config)
    }
}
