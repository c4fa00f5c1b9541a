//! # Nonce Chain - A Minimal Proof-of-Work Ledger Node
//!
//! A small node that keeps an account/balance ledger, batches accepted
//! transactions into blocks and mines each block with a parallel nonce search.
//! When I come back to this code, here's what I need to remember:
//!
//! ## What It Does
//! - **Ledger**: fixed genesis accounts, replay and balance checks, no partial writes
//! - **Blocks**: hash-linked chain starting from the `sha256("0")` genesis constant
//! - **Mining**: leading-zero hex difficulty, one worker per core on disjoint strides
//! - **Wire format**: opcode byte plus fixed-size payloads, relayed to static peers
//!
//! ## How the Code Is Organized
//! - `core/`: transactions, blocks, the chain, the miner and the ledger itself
//! - `storage/`: account balances and the pending transaction pool (in memory)
//! - `network/`: message framing, the TCP server, peer relays, client calls
//! - `config/`: node settings from defaults, a TOML file and the command line
//! - `utils/`: digests, SHA-256 and the fixed-width field encodings
//! - `cli/`: command-line parsing
//!
//! ## Where to Start Reading
//! 1. `main.rs` for the commands
//! 2. `core/ledger.rs` for transaction admission and block assembly
//! 3. `core/proof_of_work.rs` for the worker race
//! 4. `network/server.rs` for how frames reach the ledger

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod storage;
pub mod utils;

// Re-export commonly used types for convenience
pub use cli::{AccountArg, Command, NodeArgs, Opt};
pub use config::Config;
pub use core::{
    Block, BlockOutcome, Chain, Ledger, MinedBlock, Miner, ProofOfWork, SharedLedger, Transaction,
    TxOutcome,
};
pub use error::{BlockchainError, Result};
pub use network::{request_block, send_close, send_transaction, Message, Node, Nodes, Server};
pub use storage::{MemoryPool, UTXOSet};
pub use utils::{current_timestamp, genesis_account, sha256_digest, Digest};
