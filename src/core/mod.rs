//! Core ledger functionality
//!
//! This module contains the consensus and ledger engine: the wire codec for
//! transactions and blocks, the hash-linked chain, the parallel proof-of-work
//! miner and the ledger that ties them together.

pub mod block;
pub mod blockchain;
pub mod ledger;
pub mod proof_of_work;
pub mod transaction;

pub use block::{block_len, Block, BLOCK_HEADER_LEN, INITIAL_NONCE};
pub use blockchain::Chain;
pub use ledger::{BlockOutcome, Ledger, SharedLedger, TxOutcome};
pub use proof_of_work::{MinedBlock, Miner, ProofOfWork};
pub use transaction::{Transaction, TRANSACTION_LEN};
