//! A minimal tamper-evident ledger: signed transfers, proof-of-work blocks and
//! whole-chain validation, driven directly through library calls.

pub mod blockchain;

pub use blockchain::{
    Address, Block, BlockError, ChainViolation, KeyPair, Ledger, LedgerConfig, LedgerError,
    StopFlag, Transaction, TransactionError,
};
