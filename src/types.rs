//! Type definitions and protocol constants for the ADAMANT client.

use thiserror::Error;

/// Protocol epoch (2017-09-02T17:00:00Z) in Unix milliseconds.
pub const EPOCH_MILLIS: u64 = 1_504_371_600_000;

/// Number of smallest units in one ADM.
pub const SATS_PER_ADM: u64 = 100_000_000;

/// Size of an Ed25519 public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of a libsodium-style private key (seed followed by public key).
pub const PRIVATE_KEY_SIZE: usize = 64;

/// Size of an Ed25519 signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// Size of the NaCl box / secretbox nonce in bytes.
pub const NONCE_SIZE: usize = 24;

/// Number of active (forging) delegates.
pub const ACTIVE_DELEGATES: u32 = 101;

/// Error text the node returns for an account it has never seen.
pub const ADDRESS_NOT_FOUND: &str = "Address not found";

/// Errors that can occur during ADAMANT client operations.
#[derive(Error, Debug)]
pub enum AdamantError {
    // Session Errors
    /// An operation was attempted before `unlock`.
    #[error("Client is not ready: unlock with a passphrase first")]
    NotReady,

    /// Could not derive the keypair from the passphrase.
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // Encryption Errors
    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    /// Decryption failed.
    #[error("Decryption failed: {0}")]
    DecryptionError(String),

    /// Failed to encode or decode a payload.
    #[error("Encoding failed: {0}")]
    EncodingError(String),

    /// Decrypted KVS value did not carry a JSON payload.
    #[error("Invalid stored value: {0}")]
    InvalidValue(String),

    /// Invalid public key format.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid ADAMANT address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid token amount.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // Network Errors
    /// The node answered with `success: false`.
    #[error("Node error: {0}")]
    Node(String),

    /// The transport could not complete the request.
    #[error("Transport failed: {0}")]
    Transport(String),

    /// The node answered with something we could not interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<serde_json::Error> for AdamantError {
    fn from(e: serde_json::Error) -> Self {
        AdamantError::EncodingError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AdamantError>;
