// The ledger is the only writer of balance state. It admits transactions,
// batches them, and when the pool reaches `batch_size` it mines the batch into
// a block and appends it to the chain before returning to the caller.

use crate::config::Config;
use crate::core::{Block, Chain, Miner, Transaction};
use crate::error::{BlockchainError, Result};
use crate::storage::{MemoryPool, UTXOSet};
use crate::utils::AccountId;
use log::{info, warn};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

/// Result of offering a transaction to the ledger
#[derive(Debug, Clone, PartialEq)]
pub enum TxOutcome {
    /// Applied. `pool_full` reports that this transaction completed a batch;
    /// `blocks` holds every block sealed before returning, oldest first.
    /// More than one means batches left over from a failed seal caught up.
    Accepted { pool_full: bool, blocks: Vec<Block> },
    /// Not applied. Balances and pool are untouched.
    Rejected(BlockchainError),
}

impl TxOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, TxOutcome::Accepted { .. })
    }

    /// What the node should relay: the transaction itself, and any finished blocks
    pub fn broadcast_decision(&self) -> (bool, &[Block]) {
        match self {
            TxOutcome::Accepted { blocks, .. } => (true, blocks),
            TxOutcome::Rejected(_) => (false, &[]),
        }
    }
}

/// Result of offering a peer's block to the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    Appended,
    AlreadyKnown,
}

pub struct Ledger {
    utxo_set: UTXOSet,
    pool: MemoryPool,
    chain: Chain,
    miner: Miner,
    batch_size: usize,
    miner_address: AccountId,
}

impl Ledger {
    pub fn new(
        utxo_set: UTXOSet,
        miner: Miner,
        batch_size: usize,
        miner_address: AccountId,
    ) -> Ledger {
        Ledger {
            utxo_set,
            pool: MemoryPool::new(),
            chain: Chain::new(),
            miner,
            batch_size: batch_size.max(1),
            miner_address,
        }
    }

    pub fn from_config(config: &Config) -> Result<Ledger> {
        config.validate()?;
        let utxo_set = UTXOSet::with_genesis_accounts(
            config.genesis_accounts,
            u128::from(config.starting_balance),
        );
        let miner =
            Miner::new(config.difficulty, config.numcores).with_timeout(config.mining_timeout());
        Ok(Ledger::new(
            utxo_set,
            miner,
            config.batch_size,
            config.miner_account()?,
        ))
    }

    /// Admit a transaction: replay check on the raw payload, then account
    /// existence, then balance. Seals a block when the pool fills up.
    pub fn apply_transaction(&mut self, tx: Transaction) -> TxOutcome {
        if self.pool.contains(tx.encode()) {
            let err = BlockchainError::DuplicateTransaction(tx.content_hash());
            warn!("Transaction rejected: {err}");
            return TxOutcome::Rejected(err);
        }
        if let Err(err) = self.utxo_set.apply_transfer(&tx) {
            warn!("Transaction rejected: {err}");
            return TxOutcome::Rejected(err);
        }
        self.pool.add(&tx);
        info!("Transaction accepted: {tx}");

        if self.pool.len() < self.batch_size {
            return TxOutcome::Accepted {
                pool_full: false,
                blocks: Vec::new(),
            };
        }

        info!("Pending pool reached {} transactions", self.batch_size);
        // a failed seal earlier can leave several full batches waiting
        let mut blocks = Vec::new();
        loop {
            match self.seal_pending_block() {
                Ok(Some(block)) => blocks.push(block),
                Ok(None) => break,
                Err(err) => {
                    warn!(
                        "{} transaction(s) stay pending: {err}",
                        self.pool.len()
                    );
                    break;
                }
            }
        }
        TxOutcome::Accepted {
            pool_full: true,
            blocks,
        }
    }

    /// Mine the oldest `batch_size` pending transactions into the next block.
    /// Returns `Ok(None)` while the pool is not yet full. On a mining failure
    /// the pool and chain are left as they were.
    pub fn seal_pending_block(&mut self) -> Result<Option<Block>> {
        if self.pool.len() < self.batch_size {
            return Ok(None);
        }

        let candidate = Block::new_candidate(
            self.chain.get_tip_hash(),
            self.chain.next_height(),
            self.miner_address,
            self.pool.peek_batch(self.batch_size),
        );
        let mined = self.miner.mine(&candidate)?;

        self.chain.append(mined.block.clone())?;
        self.pool.drain_batch(self.batch_size);
        Ok(Some(mined.block))
    }

    /// Link a block received from a peer. Peer blocks are trusted: the proof
    /// of work is not re-checked and balances are not replayed.
    pub fn accept_block(&mut self, block: Block) -> Result<BlockOutcome> {
        if self.chain.contains(&block) {
            return Ok(BlockOutcome::AlreadyKnown);
        }
        self.chain.append(block)?;
        Ok(BlockOutcome::Appended)
    }

    /// Block at a 1-based height
    pub fn lookup_block(&self, height: u64) -> Result<&Block> {
        self.chain.at(height)
    }

    pub fn get_balance(&self, account: &AccountId) -> Option<u128> {
        self.utxo_set.get_balance(account)
    }

    pub fn get_utxo_set(&self) -> &UTXOSet {
        &self.utxo_set
    }

    pub fn get_pool(&self) -> &MemoryPool {
        &self.pool
    }

    pub fn get_chain(&self) -> &Chain {
        &self.chain
    }

    pub fn get_batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn mining_cancel_handle(&self) -> Arc<AtomicBool> {
        self.miner.cancel_handle()
    }
}

/// A ledger shared between connection handlers. Every operation takes the
/// single lock, so admission and block assembly never interleave.
#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> SharedLedger {
        SharedLedger {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    pub fn with_ledger<R>(&self, f: impl FnOnce(&mut Ledger) -> R) -> Result<R> {
        let mut ledger = self
            .inner
            .lock()
            .map_err(|e| BlockchainError::Lock(format!("ledger lock poisoned: {e}")))?;
        Ok(f(&mut ledger))
    }

    pub fn apply_transaction(&self, tx: Transaction) -> Result<TxOutcome> {
        self.with_ledger(|ledger| ledger.apply_transaction(tx))
    }

    pub fn accept_block(&self, block: Block) -> Result<BlockOutcome> {
        self.with_ledger(|ledger| ledger.accept_block(block))?
    }

    pub fn lookup_block(&self, height: u64) -> Result<Block> {
        self.with_ledger(|ledger| ledger.lookup_block(height).cloned())?
    }

    pub fn get_batch_size(&self) -> Result<usize> {
        self.with_ledger(|ledger| ledger.get_batch_size())
    }
}
