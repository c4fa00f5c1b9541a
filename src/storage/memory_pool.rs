use crate::core::Transaction;
use std::collections::HashSet;

/// Pending transaction payloads in arrival order, plus the set of every
/// payload ever accepted. The set is what makes replays detectable after a
/// batch has left the pool.
#[derive(Debug, Clone, Default)]
pub struct MemoryPool {
    pending: Vec<Vec<u8>>,
    accepted: HashSet<Vec<u8>>,
}

impl MemoryPool {
    pub fn new() -> MemoryPool {
        MemoryPool::default()
    }

    /// Whether this exact payload was accepted before
    pub fn contains(&self, payload: &[u8]) -> bool {
        self.accepted.contains(payload)
    }

    pub fn add(&mut self, tx: &Transaction) {
        let payload = tx.encode().to_vec();
        self.accepted.insert(payload.clone());
        self.pending.push(payload);
    }

    /// Oldest `count` pending payloads, or all of them if fewer are waiting
    pub fn peek_batch(&self, count: usize) -> &[Vec<u8>] {
        &self.pending[..count.min(self.pending.len())]
    }

    /// Remove the oldest `count` pending payloads once they are in a block
    pub fn drain_batch(&mut self, count: usize) -> Vec<Vec<u8>> {
        let count = count.min(self.pending.len());
        self.pending.drain(..count).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::genesis_account;

    fn tx(timestamp: u128) -> Transaction {
        Transaction::new(genesis_account(0), genesis_account(1), 5, timestamp).unwrap()
    }

    #[test]
    fn test_pool_keeps_arrival_order() {
        let mut pool = MemoryPool::new();
        pool.add(&tx(3));
        pool.add(&tx(1));
        pool.add(&tx(2));

        let batch = pool.peek_batch(2);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], tx(3).encode());
        assert_eq!(batch[1], tx(1).encode());
        assert_eq!(pool.peek_batch(10).len(), 3);
    }

    #[test]
    fn test_drain_keeps_accepted_set() {
        let mut pool = MemoryPool::new();
        pool.add(&tx(1));
        pool.add(&tx(2));
        pool.add(&tx(3));

        let drained = pool.drain_batch(2);
        assert_eq!(drained.len(), 2);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.peek_batch(1)[0], tx(3).encode());

        assert_eq!(pool.accepted_count(), 3);
        assert!(pool.contains(tx(1).encode()));
        assert!(!pool.contains(tx(4).encode()));
    }

    #[test]
    fn test_empty_pool() {
        let mut pool = MemoryPool::new();
        assert!(pool.is_empty());
        assert!(pool.peek_batch(5).is_empty());
        assert!(pool.drain_batch(5).is_empty());
    }
}
