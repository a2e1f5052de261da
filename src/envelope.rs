//! Encrypted envelope shared by chat messages and KVS values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{AdamantError, Result, NONCE_SIZE};

/// Ciphertext and nonce, both hex encoded.
///
/// Chat transactions carry these as `asset.chat.message` and
/// `asset.chat.own_message`; encrypted KVS values store the JSON form of
/// the envelope itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Hex ciphertext (Poly1305 tag followed by the encrypted bytes).
    pub message: String,
    /// Hex nonce (24 bytes).
    pub nonce: String,
}

impl Envelope {
    /// Creates an envelope from raw ciphertext and nonce bytes.
    pub fn new(ciphertext: &[u8], nonce: &[u8; NONCE_SIZE]) -> Self {
        Self {
            message: hex::encode(ciphertext),
            nonce: hex::encode(nonce),
        }
    }

    /// Serializes the envelope as stored in the KVS.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Decode a hex ciphertext.
pub(crate) fn decode_ciphertext(ciphertext: &str) -> Result<Vec<u8>> {
    hex::decode(ciphertext)
        .map_err(|e| AdamantError::DecryptionError(format!("Invalid ciphertext hex: {}", e)))
}

/// Decode a hex nonce into its fixed-size form.
pub(crate) fn decode_nonce(nonce: &str) -> Result<[u8; NONCE_SIZE]> {
    let bytes = hex::decode(nonce)
        .map_err(|e| AdamantError::DecryptionError(format!("Invalid nonce hex: {}", e)))?;
    bytes.as_slice().try_into().map_err(|_| {
        AdamantError::DecryptionError(format!(
            "Nonce must be {} bytes, got {}",
            NONCE_SIZE,
            bytes.len()
        ))
    })
}

/// Returns the nonce if a parsed KVS value looks like an encrypted envelope.
///
/// Only JSON objects with a non-empty string `nonce` qualify; anything else
/// is a plain stored value.
pub fn envelope_nonce(value: &Value) -> Option<&str> {
    value
        .get("nonce")
        .and_then(Value::as_str)
        .filter(|nonce| !nonce.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_json_shape() {
        let envelope = Envelope::new(&[0xab, 0xcd], &[1u8; NONCE_SIZE]);
        let value: Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(value["message"], "abcd");
        assert_eq!(value["nonce"], "01".repeat(NONCE_SIZE));
        assert_eq!(decode_nonce(&envelope.nonce).unwrap(), [1u8; NONCE_SIZE]);
        assert_eq!(decode_ciphertext(&envelope.message).unwrap(), vec![0xab, 0xcd]);
    }

    #[test]
    fn test_envelope_nonce_detection() {
        assert_eq!(envelope_nonce(&json!({"message": "aa", "nonce": "bb"})), Some("bb"));
        assert_eq!(envelope_nonce(&json!({"message": "aa", "nonce": ""})), None);
        assert_eq!(envelope_nonce(&json!({"theme": "dark"})), None);
        assert_eq!(envelope_nonce(&json!(42)), None);
        assert_eq!(envelope_nonce(&json!("nonce")), None);
    }

    #[test]
    fn test_decode_ciphertext_rejects_bad_hex() {
        let result = decode_ciphertext("not hex");
        assert!(matches!(result, Err(AdamantError::DecryptionError(_))));
    }

    #[test]
    fn test_decode_nonce_wrong_length() {
        let result = decode_nonce("0102");
        assert!(matches!(result, Err(AdamantError::DecryptionError(_))));
    }
}
