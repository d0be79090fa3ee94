use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::crypto::{verify_signature, Address, CryptoError, DigitalSignature, KeyPair};

/// Errors that can occur during transaction operations
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Cannot sign a transaction for another address: key belongs to {signer}, sender is {sender}")]
    Authorization { signer: Address, sender: Address },

    #[error("No signature found in this transaction")]
    MissingSignature,

    #[error("Crypto error: {0}")]
    CryptoError(#[from] CryptoError),
}

/// An intent to move `amount` from `sender` to `recipient`.
///
/// Content is fixed at construction; `sign` only attaches a signature, so a
/// signed transaction cannot be altered through this API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    sender: Address,
    recipient: Address,
    amount: u64,
    #[serde(default)]
    signature: Option<DigitalSignature>,
}

/// The canonical, signature-free view of a transaction that gets hashed
#[derive(Serialize)]
struct TransactionContent<'a> {
    sender: &'a str,
    recipient: &'a str,
    amount: u64,
}

impl Transaction {
    /// Creates a new unsigned transaction
    pub fn new(sender: Address, recipient: Address, amount: u64) -> Self {
        Transaction {
            sender,
            recipient,
            amount,
            signature: None,
        }
    }

    /// Creates a sender-less mining reward
    pub fn reward(recipient: Address, amount: u64) -> Self {
        Self::new(Address::empty(), recipient, amount)
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }

    pub fn recipient(&self) -> &Address {
        &self.recipient
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn signature(&self) -> Option<&DigitalSignature> {
        self.signature.as_ref()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Reward transactions carry no sender
    pub fn is_reward(&self) -> bool {
        self.sender.is_empty()
    }

    /// SHA-256 of the canonical (sender, recipient, amount) encoding, as hex.
    pub fn content_hash(&self) -> String {
        hex::encode(self.content_digest())
    }

    fn content_digest(&self) -> [u8; 32] {
        let content = TransactionContent {
            sender: self.sender.as_str(),
            recipient: self.recipient.as_str(),
            amount: self.amount,
        };

        // A struct of two strings and an integer always serializes.
        let encoded = serde_json::to_vec(&content).unwrap_or_default();

        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Sha256::digest(&encoded));
        digest
    }

    /// Signs the transaction's content hash with the sender's key.
    ///
    /// Signing again replaces the previous signature.
    pub fn sign(&mut self, keys: &KeyPair) -> Result<(), TransactionError> {
        if keys.address() != &self.sender {
            return Err(TransactionError::Authorization {
                signer: keys.address().clone(),
                sender: self.sender.clone(),
            });
        }

        self.signature = Some(keys.sign(&self.content_digest()));

        Ok(())
    }

    /// Checks the signature against the sender's public key.
    ///
    /// Rewards are always valid. A missing signature or an undecodable key is an
    /// error; a signature that simply does not verify is `Ok(false)`.
    pub fn is_valid(&self) -> Result<bool, TransactionError> {
        if self.is_reward() {
            return Ok(true);
        }

        let signature = self
            .signature
            .as_ref()
            .ok_or(TransactionError::MissingSignature)?;

        let public_key = self.sender.to_public_key()?;

        Ok(verify_signature(&self.content_digest(), signature, &public_key)?)
    }

    #[cfg(test)]
    pub(crate) fn set_amount(&mut self, amount: u64) {
        self.amount = amount;
    }
}
