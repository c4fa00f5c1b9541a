// The chain is an append-only, in-memory list of mined blocks. Heights are
// 1-based: the block at height h lives at index h-1, and the implicit height 0
// predecessor is represented only by the genesis prior-hash constant.

use crate::core::Block;
use crate::error::{BlockchainError, Result};
use crate::utils::{Digest, GENESIS_PRIOR_HASH};
use log::info;

#[derive(Debug, Clone, Default)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    pub fn new() -> Chain {
        Chain { blocks: Vec::new() }
    }

    /// Hash the next block must carry as its prior hash
    pub fn get_tip_hash(&self) -> Digest {
        self.blocks
            .last()
            .map(|block| *block.get_hash())
            .unwrap_or(*GENESIS_PRIOR_HASH)
    }

    /// Number of blocks stored
    pub fn height(&self) -> u64 {
        self.blocks.len() as u64
    }

    pub fn next_height(&self) -> u64 {
        self.height() + 1
    }

    /// Append a block that extends the tip. The stored block is never mutated again.
    pub fn append(&mut self, block: Block) -> Result<()> {
        let expected = self.get_tip_hash();
        if *block.get_prior_hash() != expected {
            return Err(BlockchainError::ChainLinkage {
                expected,
                found: *block.get_prior_hash(),
            });
        }
        if block.get_height() != self.next_height() {
            return Err(BlockchainError::ChainHeight {
                expected: self.next_height(),
                found: block.get_height(),
            });
        }

        info!(
            "Appended block {} at height {}",
            block.get_hash(),
            block.get_height()
        );
        self.blocks.push(block);
        Ok(())
    }

    /// Block at a 1-based height
    pub fn at(&self, height: u64) -> Result<&Block> {
        if height == 0 || height > self.height() {
            return Err(BlockchainError::BlockNotFound(height));
        }
        Ok(&self.blocks[(height - 1) as usize])
    }

    /// Whether exactly this block is already stored at its height
    pub fn contains(&self, block: &Block) -> bool {
        self.at(block.get_height())
            .map(|stored| stored.get_hash() == block.get_hash())
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Recheck every link and every stored hash from height 1 to the tip
    pub fn verify_integrity(&self) -> bool {
        let mut prior = *GENESIS_PRIOR_HASH;
        for (index, block) in self.blocks.iter().enumerate() {
            if *block.get_prior_hash() != prior
                || block.get_height() != index as u64 + 1
                || !block.verify_hash()
            {
                return false;
            }
            prior = *block.get_hash();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Miner, Transaction};
    use crate::utils::genesis_account;

    fn mined_block(prior: Digest, height: u64, amount: u128) -> Block {
        let tx = Transaction::new(genesis_account(1), genesis_account(2), amount, 1).unwrap();
        let candidate = Block::new_candidate(prior, height, genesis_account(0), &[tx.encode()]);
        Miner::new(1, 1).mine(&candidate).unwrap().block
    }

    #[test]
    fn test_empty_chain() {
        let chain = Chain::new();
        assert_eq!(chain.height(), 0);
        assert_eq!(chain.get_tip_hash(), *GENESIS_PRIOR_HASH);
        assert!(matches!(chain.at(1), Err(BlockchainError::BlockNotFound(1))));
        assert!(chain.verify_integrity());
    }

    #[test]
    fn test_append_links_blocks() {
        let mut chain = Chain::new();
        let first = mined_block(*GENESIS_PRIOR_HASH, 1, 10);
        chain.append(first.clone()).unwrap();
        let second = mined_block(*first.get_hash(), 2, 20);
        chain.append(second.clone()).unwrap();

        assert_eq!(chain.height(), 2);
        assert_eq!(chain.get_tip_hash(), *second.get_hash());
        assert_eq!(chain.at(1).unwrap(), &first);
        assert_eq!(chain.at(2).unwrap(), &second);
        assert!(chain.contains(&first));
        assert!(chain.verify_integrity());
    }

    #[test]
    fn test_append_rejects_wrong_prior_hash() {
        let mut chain = Chain::new();
        let orphan = mined_block(genesis_account(7), 1, 10);

        let result = chain.append(orphan);
        assert!(matches!(result, Err(BlockchainError::ChainLinkage { .. })));
        assert_eq!(chain.height(), 0);
    }

    #[test]
    fn test_append_rejects_wrong_height() {
        let mut chain = Chain::new();
        let skipped = mined_block(*GENESIS_PRIOR_HASH, 5, 10);

        let err = chain.append(skipped).unwrap_err();
        assert_eq!(
            err,
            BlockchainError::ChainHeight {
                expected: 1,
                found: 5
            }
        );
        assert_eq!(
            err.to_string(),
            "Chain height error: expected block height 1, found 5"
        );
        assert_eq!(chain.height(), 0);
    }

    #[test]
    fn test_lookup_bounds() {
        let mut chain = Chain::new();
        chain.append(mined_block(*GENESIS_PRIOR_HASH, 1, 10)).unwrap();

        assert!(chain.at(0).is_err());
        assert!(chain.at(1).is_ok());
        assert!(matches!(chain.at(2), Err(BlockchainError::BlockNotFound(2))));
    }

    #[test]
    fn test_contains_distinguishes_competing_blocks() {
        let mut chain = Chain::new();
        chain.append(mined_block(*GENESIS_PRIOR_HASH, 1, 10)).unwrap();
        let competing = mined_block(*GENESIS_PRIOR_HASH, 1, 11);

        assert!(!chain.contains(&competing));
    }
}
