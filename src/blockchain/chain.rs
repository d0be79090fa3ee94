use chrono::Utc;
use log::{debug, info, warn};
use thiserror::Error;

use std::fmt;

use super::block::{Block, BlockError};
use super::config::LedgerConfig;
use super::crypto::Address;
use super::transaction::{Transaction, TransactionError};

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Transaction must include sender and recipient address")]
    MalformedTransaction,

    #[error("Cannot add transaction with an invalid signature to the chain")]
    InvalidSignature,

    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),

    #[error("Block error: {0}")]
    BlockError(#[from] BlockError),
}

/// The check a block failed during chain validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// At least one transaction does not verify
    InvalidTransactions,
    /// Stored hash differs from the recomputed one
    HashMismatch,
    /// Preceding hash does not match the previous block
    BrokenLink,
}

/// First block that failed chain validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainViolation {
    pub index: usize,
    pub kind: ViolationKind,
}

impl fmt::Display for ChainViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.kind {
            ViolationKind::InvalidTransactions => "contains invalid transactions",
            ViolationKind::HashMismatch => "has a stored hash that does not match its contents",
            ViolationKind::BrokenLink => "does not link to the previous block",
        };
        write!(f, "block {} {}", self.index, reason)
    }
}

impl std::error::Error for ChainViolation {}

/// Single-writer chain manager: blocks, pending pool and mining parameters
#[derive(Debug, Clone)]
pub struct Ledger {
    /// The chain of blocks, genesis first
    blocks: Vec<Block>,

    /// Transactions waiting for the next mined block
    pending_transactions: Vec<Transaction>,

    /// Mining difficulty (number of leading zeros required in hash)
    difficulty: usize,

    /// Mining reward
    mining_reward: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Creates a ledger holding only the genesis block, with default parameters
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        Ledger {
            blocks: vec![Block::genesis()],
            pending_transactions: Vec::new(),
            difficulty: config.difficulty,
            mining_reward: config.mining_reward,
        }
    }

    pub fn latest_block(&self) -> &Block {
        // `blocks` always starts with the genesis block.
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false; kept alongside `len` for API symmetry
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn mining_reward(&self) -> u64 {
        self.mining_reward
    }

    /// Queues a signed transfer for the next block.
    ///
    /// Rewards cannot enter through here; they have no sender.
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<(), LedgerError> {
        if transaction.sender().is_empty() || transaction.recipient().is_empty() {
            warn!("Rejected transaction without sender or recipient");
            return Err(LedgerError::MalformedTransaction);
        }

        if !transaction.is_valid()? {
            warn!(
                "Rejected transaction from {} with an invalid signature",
                transaction.sender()
            );
            return Err(LedgerError::InvalidSignature);
        }

        debug!(
            "Queued transfer of {} from {} to {}",
            transaction.amount(),
            transaction.sender(),
            transaction.recipient()
        );
        self.pending_transactions.push(transaction);

        Ok(())
    }

    /// Internal issuance path for sender-less transactions
    pub(crate) fn add_reward(&mut self, recipient: Address, amount: u64) {
        self.pending_transactions
            .push(Transaction::reward(recipient, amount));
    }

    /// Seals the whole pending pool into a new block and queues the miner's reward.
    ///
    /// Mines even when the pool is empty.
    pub fn mine_pending_transactions(&mut self, miner_address: &Address) -> &Block {
        let mut block = self.candidate_block();
        let attempts = block.mine(self.difficulty);
        self.append_mined(block, attempts, miner_address)
    }

    /// Cancellable variant of [`Ledger::mine_pending_transactions`].
    ///
    /// When `should_stop` ends the search, nothing is appended and the pending
    /// pool is left as it was.
    pub fn mine_pending_transactions_until<F>(
        &mut self,
        miner_address: &Address,
        should_stop: F,
    ) -> Result<&Block, LedgerError>
    where
        F: FnMut() -> bool,
    {
        let mut block = self.candidate_block();

        match block.mine_until(self.difficulty, should_stop) {
            Ok(attempts) => Ok(self.append_mined(block, attempts, miner_address)),
            Err(err) => {
                warn!("Mining interrupted: {}", err);
                self.pending_transactions = block.transactions;
                Err(err.into())
            }
        }
    }

    fn candidate_block(&mut self) -> Block {
        let transactions = std::mem::take(&mut self.pending_transactions);
        let preceding_hash = self.latest_block().hash.clone();

        Block::new(Utc::now().timestamp_millis(), transactions, preceding_hash)
    }

    fn append_mined(&mut self, block: Block, attempts: u64, miner_address: &Address) -> &Block {
        info!(
            "Block {} mined after {} attempts: {} ({} transactions)",
            self.blocks.len(),
            attempts,
            block.hash,
            block.transactions.len()
        );

        self.blocks.push(block);
        self.add_reward(miner_address.clone(), self.mining_reward);

        self.latest_block()
    }

    /// Replays every transfer since genesis
    pub fn balance_of(&self, address: &Address) -> i128 {
        let mut balance: i128 = 0;

        for transaction in self.blocks.iter().flat_map(|block| &block.transactions) {
            if transaction.sender() == address {
                balance -= i128::from(transaction.amount());
            }
            if transaction.recipient() == address {
                balance += i128::from(transaction.amount());
            }
        }

        balance
    }

    /// Walks every block after genesis and reports the first failed check
    pub fn validate_chain(&self) -> Result<(), ChainViolation> {
        for (index, pair) in self.blocks.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            let index = index + 1;

            let kind = if !current.has_valid_transactions() {
                Some(ViolationKind::InvalidTransactions)
            } else if current.hash != current.compute_hash() {
                Some(ViolationKind::HashMismatch)
            } else if current.preceding_hash != previous.hash {
                Some(ViolationKind::BrokenLink)
            } else {
                None
            };

            if let Some(kind) = kind {
                let violation = ChainViolation { index, kind };
                warn!("Chain is invalid: {}", violation);
                return Err(violation);
            }
        }

        Ok(())
    }

    pub fn is_chain_valid(&self) -> bool {
        self.validate_chain().is_ok()
    }

    #[cfg(test)]
    pub(crate) fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }
}
