use crate::core::BlockHeader;
use crate::error::{MinerError, Result};
use crate::utils::{reversed, to_display_hex, Hash};
use log::{debug, info};
use num_bigint::BigUint;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

// Nonces handed to a worker at a time when the search is sharded
const CHUNK_SIZE: u64 = 1 << 16;

const NONCE_SPACE: u64 = u32::MAX as u64 + 1;

/// Where a sequential nonce search currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// Header fields fixed, `nonce` not yet hashed
    Building { nonce: u32 },
    /// `nonce` was hashed and missed the target
    Hashing { nonce: u32, hash: Hash },
    /// `nonce` produced a hash below the target
    Found { nonce: u32, hash: Hash },
    /// Every nonce was tried
    Exhausted,
}

pub struct ProofOfWork {
    header: BlockHeader,
    target: BigUint,
}

impl ProofOfWork {
    /// `target` is big-endian, compared against the byte-reversed header hash
    pub fn new_proof_of_work(header: BlockHeader, target: &Hash) -> ProofOfWork {
        ProofOfWork {
            header,
            target: BigUint::from_bytes_be(target),
        }
    }

    /// Validate proof-of-work for a finished header
    pub fn validate(header: &BlockHeader, target: &Hash) -> bool {
        let pow = ProofOfWork::new_proof_of_work(*header, target);
        pow.meets_target(&header.hash())
    }

    fn meets_target(&self, hash: &Hash) -> bool {
        let hash_int = BigUint::from_bytes_be(&reversed(hash));
        hash_int < self.target
    }

    fn hash_with_nonce(&self, nonce: u32) -> Hash {
        self.header.with_nonce(nonce).hash()
    }

    /// Advance the search by one transition
    pub fn step(&self, state: SearchState) -> SearchState {
        match state {
            SearchState::Building { nonce } => {
                let hash = self.hash_with_nonce(nonce);
                if self.meets_target(&hash) {
                    SearchState::Found { nonce, hash }
                } else {
                    SearchState::Hashing { nonce, hash }
                }
            }
            SearchState::Hashing { nonce, .. } => match nonce.checked_add(1) {
                Some(next) => SearchState::Building { nonce: next },
                None => SearchState::Exhausted,
            },
            terminal => terminal,
        }
    }

    /// Try nonces in ascending order from 0 until one meets the target
    pub fn run(&self) -> Result<(u32, Hash)> {
        info!("Mining the block");
        let mut state = SearchState::Building { nonce: 0 };
        loop {
            state = self.step(state);
            match state {
                SearchState::Found { nonce, hash } => {
                    info!("Found nonce {nonce} after {} attempts: {}", nonce as u64 + 1, to_display_hex(&hash));
                    return Ok((nonce, hash));
                }
                SearchState::Exhausted => {
                    return Err(MinerError::SearchExhausted {
                        timestamp: self.header.timestamp,
                    })
                }
                _ => {}
            }
        }
    }

    /// Shard the nonce space across `workers` threads.
    ///
    /// Chunks are handed out in ascending order and a worker only stops once no
    /// unclaimed chunk can hold a nonce below the best one found, so the result
    /// is the same lowest nonce the sequential search reports.
    ///
    /// `workers` is capped at the machine's available parallelism.
    pub fn run_parallel(&self, workers: usize) -> Result<(u32, Hash)> {
        let available = thread::available_parallelism().map_or(1, |n| n.get());
        let workers = workers.min(available);
        if workers <= 1 {
            return self.run();
        }

        info!("Mining the block with {workers} workers");
        let next_chunk = AtomicU64::new(0);
        let best = AtomicU64::new(u64::MAX);

        thread::scope(|scope| {
            for worker in 0..workers {
                let next_chunk = &next_chunk;
                let best = &best;
                scope.spawn(move || {
                    let mut tried = 0u64;
                    loop {
                        let start = next_chunk.fetch_add(1, Ordering::SeqCst) * CHUNK_SIZE;
                        if start >= NONCE_SPACE || start >= best.load(Ordering::SeqCst) {
                            break;
                        }
                        let end = (start + CHUNK_SIZE).min(NONCE_SPACE);
                        for nonce in start..end {
                            if nonce >= best.load(Ordering::Relaxed) {
                                break;
                            }
                            tried += 1;
                            if self.meets_target(&self.hash_with_nonce(nonce as u32)) {
                                best.fetch_min(nonce, Ordering::SeqCst);
                                break;
                            }
                        }
                    }
                    debug!("Worker {worker} stopped after {tried} attempts");
                });
            }
        });

        match best.into_inner() {
            u64::MAX => Err(MinerError::SearchExhausted {
                timestamp: self.header.timestamp,
            }),
            nonce => {
                let nonce = nonce as u32;
                let hash = self.hash_with_nonce(nonce);
                info!("Found nonce {nonce}: {}", to_display_hex(&hash));
                Ok((nonce, hash))
            }
        }
    }
}
