use crate::core::Transaction;
use crate::error::{BlockchainError, Result};
use crate::utils::{genesis_account, AccountId};
use std::collections::HashMap;

/// Account balance table. Accounts are created once at start-up and never removed.
#[derive(Debug, Clone, Default)]
pub struct UTXOSet {
    balances: HashMap<AccountId, u128>,
}

impl UTXOSet {
    pub fn new() -> UTXOSet {
        UTXOSet {
            balances: HashMap::new(),
        }
    }

    /// `count` genesis accounts, each holding `starting_balance`
    pub fn with_genesis_accounts(count: usize, starting_balance: u128) -> UTXOSet {
        let mut utxo_set = UTXOSet::new();
        for index in 0..count {
            utxo_set.add_account(genesis_account(index), starting_balance);
        }
        utxo_set
    }

    pub fn add_account(&mut self, account: AccountId, balance: u128) {
        self.balances.insert(account, balance);
    }

    pub fn get_balance(&self, account: &AccountId) -> Option<u128> {
        self.balances.get(account).copied()
    }

    pub fn contains(&self, account: &AccountId) -> bool {
        self.balances.contains_key(account)
    }

    /// Both parties must exist and the sender must hold strictly more than the amount
    pub fn check_transfer(&self, tx: &Transaction) -> Result<()> {
        let available = self
            .get_balance(tx.get_sender())
            .ok_or(BlockchainError::UnknownAccount(*tx.get_sender()))?;
        if !self.contains(tx.get_receiver()) {
            return Err(BlockchainError::UnknownAccount(*tx.get_receiver()));
        }
        if available <= tx.get_amount() {
            return Err(BlockchainError::InsufficientBalance {
                required: tx.get_amount(),
                available,
            });
        }
        Ok(())
    }

    /// Debit the sender and credit the receiver. Nothing changes on error.
    pub fn apply_transfer(&mut self, tx: &Transaction) -> Result<()> {
        self.check_transfer(tx)?;
        let amount = tx.get_amount();

        // debit before credit so a self-transfer nets to zero
        if let Some(balance) = self.balances.get_mut(tx.get_sender()) {
            *balance -= amount;
        }
        if let Some(balance) = self.balances.get_mut(tx.get_receiver()) {
            *balance += amount;
        }
        Ok(())
    }

    pub fn total_supply(&self) -> u128 {
        self.balances.values().sum()
    }

    pub fn count_accounts(&self) -> usize {
        self.balances.len()
    }
}
