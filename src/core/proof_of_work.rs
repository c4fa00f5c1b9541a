use crate::core::Block;
use crate::error::{BlockchainError, Result};
use crate::utils::{Digest, MAX_DIGIT_VALUE};
use log::{debug, info};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

// Largest nonce the 32-digit wire field can carry
const MAX_NONCE: u128 = MAX_DIGIT_VALUE;

// Workers only read the clock once per this many attempts
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

/// Difficulty check and nonce search for a single candidate block
pub struct ProofOfWork {
    suffix: String,
    start_nonce: u128,
    difficulty: usize,
}

/// A finished search: the sealed block and which worker won it
#[derive(Debug, Clone)]
pub struct MinedBlock {
    pub block: Block,
    pub worker: usize,
    pub attempts: u64,
}

enum Search {
    Found { nonce: u128, hash: Digest },
    Stopped,
    Exhausted,
}

impl ProofOfWork {
    pub fn new_proof_of_work(block: &Block, difficulty: usize) -> ProofOfWork {
        ProofOfWork {
            suffix: block.hash_suffix(),
            start_nonce: block.get_nonce(),
            difficulty,
        }
    }

    /// A block is mined when its stored hash is its content hash and meets the target
    pub fn validate(block: &Block, difficulty: usize) -> bool {
        block.verify_hash() && block.meets_difficulty(difficulty)
    }

    fn prepare_hash(&self, nonce: u128) -> Digest {
        Block::hash_with_suffix(nonce, &self.suffix)
    }

    /// Walk `start + stride, start + 2*stride, ...` until the target is met or
    /// a stop condition is observed.
    fn search(
        &self,
        stride: u128,
        stop: &AtomicBool,
        cancel: &AtomicBool,
        deadline: Option<Instant>,
        attempts: &AtomicU64,
    ) -> Search {
        let mut nonce = self.start_nonce;
        let mut local_attempts: u64 = 0;

        let outcome = loop {
            if stop.load(Ordering::Relaxed) || cancel.load(Ordering::Relaxed) {
                break Search::Stopped;
            }
            if local_attempts % DEADLINE_CHECK_INTERVAL == 0 {
                if let Some(deadline) = deadline {
                    if Instant::now() >= deadline {
                        break Search::Stopped;
                    }
                }
            }
            if MAX_NONCE - nonce < stride {
                break Search::Exhausted;
            }

            nonce += stride;
            local_attempts += 1;
            let hash = self.prepare_hash(nonce);
            if hash.leading_zero_nibbles() >= self.difficulty {
                break Search::Found { nonce, hash };
            }
        };

        attempts.fetch_add(local_attempts, Ordering::Relaxed);
        outcome
    }
}

/// Parallel nonce search. Worker `c` of `numcores` tries `start + k*c`.
#[derive(Clone)]
pub struct Miner {
    difficulty: usize,
    numcores: usize,
    timeout: Option<Duration>,
    cancel: Arc<AtomicBool>,
}

impl Miner {
    pub fn new(difficulty: usize, numcores: usize) -> Miner {
        Miner {
            difficulty,
            numcores: numcores.max(1),
            timeout: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Give up on a candidate once `timeout` has elapsed
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Miner {
        self.timeout = timeout;
        self
    }

    /// Setting the returned flag aborts any running and future searches
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn get_numcores(&self) -> usize {
        self.numcores
    }

    pub fn mine(&self, candidate: &Block) -> Result<MinedBlock> {
        let pow = ProofOfWork::new_proof_of_work(candidate, self.difficulty);
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        let attempts = AtomicU64::new(0);
        let started = Instant::now();

        info!(
            "Mining block at height {} with difficulty {} on {} worker(s)",
            candidate.get_height(),
            self.difficulty,
            self.numcores
        );

        let winner = if self.numcores == 1 {
            self.mine_sequential(&pow, deadline, &attempts)
        } else {
            self.mine_parallel(&pow, deadline, &attempts)
        };

        let attempts = attempts.load(Ordering::Relaxed);
        match winner {
            Some((worker, nonce, hash)) => {
                let mut block = candidate.clone();
                block.seal(nonce, hash);
                info!(
                    "Block mined by worker {worker}: {hash} (nonce {nonce}, {attempts} attempts, {:?})",
                    started.elapsed()
                );
                Ok(MinedBlock {
                    block,
                    worker,
                    attempts,
                })
            }
            None if self.cancel.load(Ordering::Relaxed) => Err(BlockchainError::MiningCancelled),
            None if deadline.is_some_and(|d| Instant::now() >= d) => {
                Err(BlockchainError::MiningTimedOut { attempts })
            }
            None => Err(BlockchainError::MiningExhausted),
        }
    }

    fn mine_sequential(
        &self,
        pow: &ProofOfWork,
        deadline: Option<Instant>,
        attempts: &AtomicU64,
    ) -> Option<(usize, u128, Digest)> {
        let stop = AtomicBool::new(false);
        match pow.search(1, &stop, &self.cancel, deadline, attempts) {
            Search::Found { nonce, hash } => Some((1, nonce, hash)),
            Search::Stopped | Search::Exhausted => None,
        }
    }

    fn mine_parallel(
        &self,
        pow: &ProofOfWork,
        deadline: Option<Instant>,
        attempts: &AtomicU64,
    ) -> Option<(usize, u128, Digest)> {
        let found = AtomicBool::new(false);
        let cancel = self.cancel.as_ref();

        thread::scope(|scope| {
            let (sender, receiver) = mpsc::channel();

            for core in 1..=self.numcores {
                let sender = sender.clone();
                let found = &found;
                scope.spawn(move || {
                    if let Search::Found { nonce, hash } =
                        pow.search(core as u128, found, cancel, deadline, attempts)
                    {
                        // first finder wins; later finders drop their result
                        if found
                            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                            .is_ok()
                        {
                            let _ = sender.send((core, nonce, hash));
                        }
                    }
                    debug!("Mining worker {core} finished");
                });
            }
            drop(sender);

            // Err means every worker stopped without a winner
            let winner = receiver.recv().ok();
            found.store(true, Ordering::Release);
            winner
        })
    }
}
