use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH, SIGNATURE_LENGTH};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::fmt;
use std::str::FromStr;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// Identity token of a ledger participant: the hex-encoded ed25519 public key.
///
/// The empty address stands for "no sender" and is only carried by reward
/// transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    /// The "no sender" sentinel
    pub fn empty() -> Self {
        Address(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Creates a new address from a public key
    pub fn from_public_key(public_key: &VerifyingKey) -> Self {
        Address(hex::encode(public_key.as_bytes()))
    }

    /// Recovers the public key this address encodes
    pub fn to_public_key(&self) -> Result<VerifyingKey, CryptoError> {
        let bytes = hex::decode(&self.0).map_err(|e| CryptoError::DecodingError(e.to_string()))?;

        let key_bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidPublicKey("Invalid public key length".to_string())
        })?;

        VerifyingKey::from_bytes(&key_bytes)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode(s).map_err(|e| CryptoError::DecodingError(e.to_string()))?;

        Ok(Address(s.to_lowercase()))
    }
}

/// Hex-encoded ed25519 signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DigitalSignature(pub String);

impl DigitalSignature {
    pub fn from_signature(signature: &ed25519_dalek::Signature) -> Self {
        DigitalSignature(hex::encode(signature.to_bytes()))
    }

    pub fn to_signature(&self) -> Result<ed25519_dalek::Signature, CryptoError> {
        let bytes = hex::decode(&self.0).map_err(|e| CryptoError::DecodingError(e.to_string()))?;

        let signature_bytes: [u8; SIGNATURE_LENGTH] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidSignature("Invalid signature length".to_string())
        })?;

        Ok(ed25519_dalek::Signature::from_bytes(&signature_bytes))
    }
}

/// An ed25519 key pair. Holds the private half used for signing transactions.
#[derive(Debug, Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    address: Address,
}

impl KeyPair {
    /// Creates a key pair from the operating system's RNG
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(signing_key)
    }

    /// Rebuilds a key pair from its 32 secret bytes
    pub fn from_secret_key(secret_key_bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes_array: [u8; SECRET_KEY_LENGTH] = secret_key_bytes.try_into().map_err(|_| {
            CryptoError::InvalidPrivateKey("Invalid private key length".to_string())
        })?;

        Ok(Self::from_signing_key(SigningKey::from_bytes(&bytes_array)))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = Address::from_public_key(&signing_key.verifying_key());
        KeyPair { signing_key, address }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Signs a message with the private key
    pub fn sign(&self, message: &[u8]) -> DigitalSignature {
        DigitalSignature::from_signature(&self.signing_key.sign(message))
    }

    pub fn export_secret_key(&self) -> Vec<u8> {
        self.signing_key.to_bytes().to_vec()
    }
}

/// Verifies a signature against a message and public key.
///
/// A well-formed signature that does not match yields `Ok(false)`; only an
/// undecodable signature is an error.
pub fn verify_signature(
    message: &[u8],
    signature: &DigitalSignature,
    public_key: &VerifyingKey,
) -> Result<bool, CryptoError> {
    let signature = signature.to_signature()?;

    Ok(public_key.verify(message, &signature).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pair_creation() {
        let keys = KeyPair::generate();
        assert_eq!(keys.address().as_str().len(), PUBLIC_KEY_LENGTH * 2);
        assert!(!keys.address().is_empty());
    }

    #[test]
    fn test_signing_and_verification() {
        let keys = KeyPair::generate();
        let message = b"Hello, world!";

        let signature = keys.sign(message);

        let result = verify_signature(message, &signature, &keys.public_key()).unwrap();
        assert!(result);

        // Wrong message
        let result = verify_signature(b"Wrong message", &signature, &keys.public_key()).unwrap();
        assert!(!result);

        // Wrong key
        let other = KeyPair::generate();
        let result = verify_signature(message, &signature, &other.public_key()).unwrap();
        assert!(!result);
    }

    #[test]
    fn test_address_conversion() {
        let keys = KeyPair::generate();

        let public_key = keys.address().to_public_key().unwrap();
        assert_eq!(public_key.as_bytes(), keys.public_key().as_bytes());
    }

    #[test]
    fn test_secret_key_round_trip() {
        let keys = KeyPair::generate();
        let restored = KeyPair::from_secret_key(&keys.export_secret_key()).unwrap();
        assert_eq!(restored.address(), keys.address());

        assert!(matches!(
            KeyPair::from_secret_key(&[1, 2, 3]),
            Err(CryptoError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(Address("not hex".to_string()).to_public_key().is_err());
        assert!(Address("abcd".to_string()).to_public_key().is_err());
        assert!("zz".parse::<Address>().is_err());
        assert!(DigitalSignature("00ff".to_string()).to_signature().is_err());
    }
}
