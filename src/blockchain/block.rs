use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::transaction::Transaction;

/// 2021-10-04T00:00:00Z, in milliseconds
pub const GENESIS_TIMESTAMP: i64 = 1_633_305_600_000;

/// Preceding hash carried by the genesis block
pub const GENESIS_PRECEDING_HASH: &str = "0";

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("Mining cancelled at nonce {nonce}")]
    MiningCancelled { nonce: u64 },
}

/// Represents a block in the blockchain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Creation time in milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Transactions sealed into this block
    pub transactions: Vec<Transaction>,

    /// Hash of the previous block
    pub preceding_hash: String,

    /// Proof of work counter
    pub nonce: u64,

    /// Hash of this block, recomputed whenever the nonce moves
    pub hash: String,
}

/// Field set covered by the block hash, in hashing order
#[derive(Serialize)]
struct HashedFields<'a> {
    preceding_hash: &'a str,
    timestamp: i64,
    transactions: &'a [Transaction],
    nonce: u64,
}

impl Block {
    /// Creates a candidate block with nonce 0 and its hash filled in
    pub fn new(timestamp: i64, transactions: Vec<Transaction>, preceding_hash: String) -> Self {
        let mut block = Block {
            timestamp,
            transactions,
            preceding_hash,
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// The fixed first block of every ledger
    pub fn genesis() -> Self {
        Block::new(GENESIS_TIMESTAMP, Vec::new(), GENESIS_PRECEDING_HASH.to_string())
    }

    /// Calculates the SHA-256 hash of the block as a hexadecimal string
    pub fn compute_hash(&self) -> String {
        let fields = HashedFields {
            preceding_hash: &self.preceding_hash,
            timestamp: self.timestamp,
            transactions: &self.transactions,
            nonce: self.nonce,
        };

        // Strings, integers and derived structs only; serialization cannot fail.
        let encoded = serde_json::to_vec(&fields).unwrap_or_default();

        format!("{:x}", Sha256::digest(&encoded))
    }

    /// Whether the stored hash starts with `difficulty` zero hex digits
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        self.hash.len() >= difficulty && self.hash.bytes().take(difficulty).all(|b| b == b'0')
    }

    /// Searches for a nonce satisfying `difficulty`. Returns the number of
    /// hashes evaluated.
    ///
    /// There is no iteration bound: expected cost is about 16^difficulty hashes.
    pub fn mine(&mut self, difficulty: usize) -> u64 {
        let mut attempts = 0;
        while !self.meets_difficulty(difficulty) {
            self.advance_nonce();
            attempts += 1;
        }
        attempts
    }

    /// Same search as [`Block::mine`], polling `should_stop` before each attempt.
    ///
    /// On cancellation the block keeps a hash consistent with its current nonce.
    pub fn mine_until<F>(&mut self, difficulty: usize, mut should_stop: F) -> Result<u64, BlockError>
    where
        F: FnMut() -> bool,
    {
        let mut attempts = 0;

        while !self.meets_difficulty(difficulty) {
            if should_stop() {
                return Err(BlockError::MiningCancelled { nonce: self.nonce });
            }
            self.advance_nonce();
            attempts += 1;
        }

        Ok(attempts)
    }

    fn advance_nonce(&mut self) {
        self.nonce = self.nonce.wrapping_add(1);
        self.hash = self.compute_hash();
    }

    /// True iff every transaction verifies; errors count as invalid
    pub fn has_valid_transactions(&self) -> bool {
        self.transactions
            .iter()
            .all(|tx| matches!(tx.is_valid(), Ok(true)))
    }
}

/// A cloneable cancellation flag for running [`Block::mine_until`] from another thread
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
