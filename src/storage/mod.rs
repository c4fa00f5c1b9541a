//! In-memory ledger state
//!
//! This module holds the account balance table and the pool of pending
//! transactions. Nothing here is persisted across restarts.

pub mod memory_pool;
pub mod utxo_set;

pub use memory_pool::MemoryPool;
pub use utxo_set::UTXOSet;
