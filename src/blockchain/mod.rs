// Blockchain module
//
// Core ledger implementation:
// - Transaction signing and verification
// - Block hashing and proof of work
// - Ledger: pending pool, mining, balances, chain validation
// - Key pairs and addresses
// - Ledger configuration

pub mod block;
pub mod chain;
pub mod config;
pub mod crypto;
pub mod transaction;

// Re-export main components for easier access
pub use block::{Block, BlockError, StopFlag};
pub use chain::{ChainViolation, Ledger, LedgerError, ViolationKind};
pub use config::{ConfigError, LedgerConfig};
pub use crypto::{Address, CryptoError, DigitalSignature, KeyPair};
pub use transaction::{Transaction, TransactionError};
