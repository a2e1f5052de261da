//! Key derivation and address handling for ADAMANT accounts.

use std::fmt;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use hmac::Hmac;
use sha2::{Digest, Sha256, Sha512};
use unicode_normalization::UnicodeNormalization;

use crate::types::{AdamantError, Result, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};

/// BIP39 seed salt (with an empty mnemonic password).
const MNEMONIC_SALT: &[u8] = b"mnemonic";

/// BIP39 PBKDF2 iteration count.
const MNEMONIC_ROUNDS: u32 = 2048;

/// Hash a passphrase into the 32-byte seed used for the account keypair.
///
/// The passphrase is NFKD-normalized and run through the BIP39 seed
/// function (PBKDF2-HMAC-SHA512, 2048 rounds, 64 bytes); the seed is then
/// hashed with SHA-256. Any string is accepted; it is not checked against a
/// wordlist.
pub fn create_passphrase_hash(passphrase: &str) -> Result<[u8; 32]> {
    let normalized: String = passphrase.nfkd().collect();
    let mut seed = [0u8; 64];
    pbkdf2::pbkdf2::<Hmac<Sha512>>(
        normalized.as_bytes(),
        MNEMONIC_SALT,
        MNEMONIC_ROUNDS,
        &mut seed,
    )
    .map_err(|e| AdamantError::KeyDerivationFailed(format!("PBKDF2-HMAC-SHA512 failed: {}", e)))?;

    Ok(Sha256::digest(seed).into())
}

/// Derive the account address from an Ed25519 public key.
///
/// The address is `U` followed by the first 8 bytes of `SHA-256(public_key)`
/// read as a little-endian `u64`.
pub fn address_from_public_key(public_key: &[u8]) -> String {
    let hash = Sha256::digest(public_key);
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash[..8]);
    format!("U{}", u64::from_le_bytes(head))
}

/// Parse the numeric part of an address.
pub fn parse_address(address: &str) -> Result<u64> {
    address
        .strip_prefix('U')
        .and_then(|digits| digits.parse::<u64>().ok())
        .ok_or_else(|| AdamantError::InvalidAddress(address.to_string()))
}

/// Convert an Ed25519 public key to its Curve25519 (X25519) form.
pub fn convert_public_key(ed25519_public_key: &[u8]) -> Result<[u8; 32]> {
    let bytes: [u8; PUBLIC_KEY_SIZE] = ed25519_public_key.try_into().map_err(|_| {
        AdamantError::InvalidPublicKey(format!(
            "expected {} bytes, got {}",
            PUBLIC_KEY_SIZE,
            ed25519_public_key.len()
        ))
    })?;

    let verifying_key = VerifyingKey::from_bytes(&bytes)
        .map_err(|e| AdamantError::InvalidPublicKey(format!("Invalid Ed25519 public key: {}", e)))?;

    Ok(verifying_key.to_montgomery().to_bytes())
}

/// Convert an Ed25519 seed to a clamped Curve25519 scalar.
pub fn convert_secret_key(seed: &[u8; 32]) -> [u8; 32] {
    let digest = Sha512::digest(seed);
    let mut scalar = [0u8; 32];
    scalar.copy_from_slice(&digest[..32]);
    scalar[0] &= 248;
    scalar[31] &= 127;
    scalar[31] |= 64;
    scalar
}

/// Decode a hex public key as sent by the node.
pub fn decode_public_key_hex(public_key: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(public_key)
        .map_err(|e| AdamantError::InvalidPublicKey(format!("{}: {}", public_key, e)))?;
    bytes.as_slice().try_into().map_err(|_| {
        AdamantError::InvalidPublicKey(format!(
            "expected {} bytes, got {}",
            PUBLIC_KEY_SIZE,
            bytes.len()
        ))
    })
}

/// Ed25519 account keypair.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Build the keypair from a 32-byte passphrase hash.
    pub fn from_hash(hash: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(hash),
        }
    }

    /// Derive the keypair for a passphrase.
    pub fn from_passphrase(passphrase: &str) -> Result<Self> {
        let hash = create_passphrase_hash(passphrase)?;
        Ok(Self::from_hash(&hash))
    }

    /// Returns the Ed25519 public key.
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Returns the public key as lowercase hex, as used in transactions.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key())
    }

    /// Returns the private key in libsodium layout (seed followed by public key).
    pub fn private_key(&self) -> [u8; PRIVATE_KEY_SIZE] {
        self.signing_key.to_keypair_bytes()
    }

    /// Returns the address derived from the public key.
    pub fn address(&self) -> String {
        address_from_public_key(&self.public_key())
    }

    /// Detached Ed25519 signature over `message`.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Curve25519 secret for NaCl box operations.
    pub(crate) fn curve_secret_key(&self) -> [u8; 32] {
        convert_secret_key(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}
