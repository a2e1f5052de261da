//! Encryption and decryption for ADAMANT messages and stored values.
//!
//! Chat messages use NaCl `box` (X25519 + XSalsa20-Poly1305) with the
//! Ed25519 account keys converted to Curve25519. KVS values are encrypted
//! to the owner alone with NaCl `secretbox` under a key derived from the
//! owner's private key.

use crypto_box::aead::generic_array::GenericArray;
use crypto_box::aead::Aead;
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use crypto_secretbox::aead::KeyInit;
use crypto_secretbox::XSalsa20Poly1305;
use rand::{Rng, RngCore};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::envelope::{decode_ciphertext, decode_nonce, Envelope};
use crate::keys::{convert_public_key, convert_secret_key, Keypair};
use crate::types::{AdamantError, Result, NONCE_SIZE};

/// Maximum length of the random padding around encrypted values.
const MAX_VALUE_PADDING: usize = 10;

fn random_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

fn salsa_box(counterpart_public_key: &[u8], keypair: &Keypair) -> Result<SalsaBox> {
    let their_public = PublicKey::from(convert_public_key(counterpart_public_key)?);
    let our_secret = SecretKey::from(keypair.curve_secret_key());
    Ok(SalsaBox::new(&their_public, &our_secret))
}

/// Encrypt a chat message for a recipient.
///
/// # Arguments
/// * `text` - Message to encrypt
/// * `recipient_public_key` - Recipient's Ed25519 public key
/// * `keypair` - Sender's account keypair
///
/// # Returns
/// Envelope holding the hex ciphertext and nonce
pub fn encode_message(text: &str, recipient_public_key: &[u8], keypair: &Keypair) -> Result<Envelope> {
    let cipher = salsa_box(recipient_public_key, keypair)?;
    let nonce = random_nonce();

    let ciphertext = cipher
        .encrypt(GenericArray::from_slice(&nonce), text.as_bytes())
        .map_err(|e| AdamantError::EncryptionError(format!("Box encryption failed: {}", e)))?;

    Ok(Envelope::new(&ciphertext, &nonce))
}

/// Decrypt a chat message.
///
/// Works for both directions: the counterpart key is the sender's when we
/// received the message and the recipient's when we sent it.
pub fn decode_message(
    ciphertext_hex: &str,
    counterpart_public_key: &[u8],
    keypair: &Keypair,
    nonce_hex: &str,
) -> Result<String> {
    let ciphertext = decode_ciphertext(ciphertext_hex)?;
    let nonce = decode_nonce(nonce_hex)?;
    let cipher = salsa_box(counterpart_public_key, keypair)?;

    let plaintext = cipher
        .decrypt(GenericArray::from_slice(&nonce), ciphertext.as_slice())
        .map_err(|e| AdamantError::DecryptionError(format!("Box decryption failed: {}", e)))?;

    String::from_utf8(plaintext)
        .map_err(|e| AdamantError::DecryptionError(format!("Invalid UTF-8: {}", e)))
}

fn value_cipher(keypair: &Keypair) -> Result<XSalsa20Poly1305> {
    let hashed: [u8; 32] = Sha256::digest(keypair.private_key()).into();
    let key = convert_secret_key(&hashed);
    XSalsa20Poly1305::new_from_slice(&key)
        .map_err(|e| AdamantError::EncryptionError(format!("Cipher init failed: {}", e)))
}

fn random_padding() -> String {
    let mut rng = rand::thread_rng();
    let len = rng.gen_range(0..=MAX_VALUE_PADDING);
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

/// Encrypt a value so that only the owner of `keypair` can read it.
///
/// The plaintext is `{"payload": value}` wrapped in random lowercase
/// padding on both sides.
pub fn encode_value(value: &Value, keypair: &Keypair) -> Result<Envelope> {
    let body = serde_json::to_string(&json!({ "payload": value }))?;
    let padded = format!("{}{}{}", random_padding(), body, random_padding());

    let cipher = value_cipher(keypair)?;
    let nonce = random_nonce();
    let ciphertext = cipher
        .encrypt(GenericArray::from_slice(&nonce), padded.as_bytes())
        .map_err(|e| AdamantError::EncryptionError(format!("Secretbox encryption failed: {}", e)))?;

    Ok(Envelope::new(&ciphertext, &nonce))
}

/// Decrypt a value produced by [`encode_value`] and return its payload.
///
/// An empty plaintext decodes to `null`.
pub fn decode_value(ciphertext_hex: &str, keypair: &Keypair, nonce_hex: &str) -> Result<Value> {
    let ciphertext = decode_ciphertext(ciphertext_hex)?;
    let nonce = decode_nonce(nonce_hex)?;

    let cipher = value_cipher(keypair)?;
    let plaintext = cipher
        .decrypt(GenericArray::from_slice(&nonce), ciphertext.as_slice())
        .map_err(|e| AdamantError::DecryptionError(format!("Secretbox decryption failed: {}", e)))?;

    let text = String::from_utf8(plaintext)
        .map_err(|e| AdamantError::DecryptionError(format!("Invalid UTF-8: {}", e)))?;
    if text.is_empty() {
        return Ok(Value::Null);
    }

    let (from, to) = match (text.find('{'), text.rfind('}')) {
        (Some(from), Some(to)) if from < to => (from, to),
        _ => {
            return Err(AdamantError::InvalidValue(
                "Could not determine JSON boundaries in the encoded value".to_string(),
            ))
        }
    };

    let wrapped: Value = serde_json::from_str(&text[from..=to])?;
    Ok(wrapped.get("payload").cloned().unwrap_or(Value::Null))
}
