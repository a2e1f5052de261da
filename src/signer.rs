//! Transaction signing and verification.
//!
//! Signing is split in two phases. A write path first *prepares* its
//! transaction (capturing the keypair), then hands it to the node client,
//! which *finalizes* it once the clock delta for that request is known.
//! Finalizing stamps the timestamp and computes the signature at the last
//! possible moment so the node accepts the timestamp.

use std::sync::Arc;

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde_json::{json, Value};

use crate::blockchain::{ClockDelta, RequestBody};
use crate::keys::{decode_public_key_hex, Keypair};
use crate::transaction::{epoch_time, Transaction};
use crate::types::{AdamantError, Result, SIGNATURE_SIZE};

/// Stamps `transaction` with a corrected timestamp and signs it.
///
/// Any previous signature is dropped first: a present signature is part of
/// the signed bytes, so keeping it would sign over a stale value.
///
/// # Arguments
/// * `transaction` - Transaction to sign (mutated in place)
/// * `keypair` - Sender's keypair
/// * `time_delta` - Local clock minus node clock
pub fn sign_transaction<'a>(
    transaction: &'a mut Transaction,
    keypair: &Keypair,
    time_delta: ClockDelta,
) -> Result<&'a mut Transaction> {
    sign_transaction_at(transaction, keypair, epoch_time(), time_delta)
}

pub(crate) fn sign_transaction_at<'a>(
    transaction: &'a mut Transaction,
    keypair: &Keypair,
    now: i64,
    time_delta: ClockDelta,
) -> Result<&'a mut Transaction> {
    transaction.signature = None;
    transaction.timestamp = Some(now - time_delta.seconds());

    let hash = transaction.hash()?;
    transaction.signature = Some(hex::encode(keypair.sign(&hash)));

    Ok(transaction)
}

/// Verifies a transaction signature against its embedded sender public key.
///
/// Returns `Ok(false)` for unsigned transactions or a signature that does
/// not match.
pub fn verify_transaction(transaction: &Transaction) -> Result<bool> {
    let signature_hex = match &transaction.signature {
        Some(signature) => signature,
        None => return Ok(false),
    };

    let signature_bytes: [u8; SIGNATURE_SIZE] = hex::decode(signature_hex)
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| {
            AdamantError::EncodingError(format!("Signature must be {} hex bytes", SIGNATURE_SIZE))
        })?;

    let key_bytes = decode_public_key_hex(&transaction.sender_public_key)?;
    let verifying_key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| AdamantError::InvalidPublicKey(format!("Invalid Ed25519 public key: {}", e)))?;

    let mut unsigned = transaction.clone();
    unsigned.signature = None;
    let hash = unsigned.hash()?;

    Ok(verifying_key
        .verify(&hash, &Signature::from_bytes(&signature_bytes))
        .is_ok())
}

/// A transaction waiting for its per-request clock delta.
#[derive(Debug)]
pub struct UnsignedTransaction {
    transaction: Transaction,
    keypair: Arc<Keypair>,
}

impl UnsignedTransaction {
    /// Prepares `transaction` for deferred signing with `keypair`.
    pub fn new(transaction: Transaction, keypair: Arc<Keypair>) -> Self {
        Self {
            transaction,
            keypair,
        }
    }

    /// The transaction as it will be signed.
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    /// Timestamps and signs the transaction.
    pub fn finalize(self, time_delta: ClockDelta) -> Result<Transaction> {
        let Self {
            mut transaction,
            keypair,
        } = self;
        sign_transaction(&mut transaction, &keypair, time_delta)?;
        Ok(transaction)
    }

    /// Deferred body of the form `{"transaction": <signed>}`.
    pub fn into_request(self) -> RequestBody {
        RequestBody::deferred(move |delta| {
            let signed = self.finalize(delta)?;
            Ok(json!({ "transaction": signed }))
        })
    }

    /// Deferred body consisting of the signed transaction itself.
    pub fn into_bare_request(self) -> RequestBody {
        RequestBody::deferred(move |delta| {
            let signed = self.finalize(delta)?;
            Ok(serde_json::to_value(signed)?)
        })
    }
}

/// Extracts the signed transaction from a finalized `{"transaction": ..}` body.
pub fn transaction_from_body(body: &Value) -> Result<Transaction> {
    let raw = body.get("transaction").unwrap_or(body);
    Ok(serde_json::from_value(raw.clone())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Asset, TransactionType};

    fn keypair() -> Keypair {
        Keypair::from_hash(&[5u8; 32])
    }

    fn skeleton(keypair: &Keypair) -> Transaction {
        Transaction {
            kind: TransactionType::Send,
            amount: 42,
            sender_id: keypair.address(),
            sender_public_key: keypair.public_key_hex(),
            recipient_id: Some("U12345".to_string()),
            asset: Asset::default(),
            timestamp: None,
            signature: None,
            id: None,
            height: None,
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = keypair();
        let mut tx = skeleton(&keypair);
        sign_transaction(&mut tx, &keypair, ClockDelta::default()).unwrap();

        assert_eq!(tx.signature.as_ref().unwrap().len(), SIGNATURE_SIZE * 2);
        assert!(verify_transaction(&tx).unwrap());
    }

    #[test]
    fn test_mutation_invalidates_signature() {
        let keypair = keypair();
        let mut tx = skeleton(&keypair);
        sign_transaction_at(&mut tx, &keypair, 1000, ClockDelta::default()).unwrap();
        let first = tx.signature.clone().unwrap();

        tx.amount += 1;
        assert!(!verify_transaction(&tx).unwrap());

        sign_transaction_at(&mut tx, &keypair, 1000, ClockDelta::default()).unwrap();
        let second = tx.signature.clone().unwrap();
        assert_ne!(first, second);
        assert!(verify_transaction(&tx).unwrap());
    }

    #[test]
    fn test_resigning_ignores_stale_signature() {
        let keypair = keypair();
        let mut fresh = skeleton(&keypair);
        let mut stale = skeleton(&keypair);
        stale.signature = Some("00".repeat(SIGNATURE_SIZE));

        sign_transaction_at(&mut fresh, &keypair, 1000, ClockDelta::default()).unwrap();
        sign_transaction_at(&mut stale, &keypair, 1000, ClockDelta::default()).unwrap();
        assert_eq!(fresh.signature, stale.signature);
    }

    #[test]
    fn test_timestamp_correction() {
        let keypair = keypair();
        let mut early = skeleton(&keypair);
        let mut late = skeleton(&keypair);

        sign_transaction_at(&mut early, &keypair, 5000, ClockDelta::from_seconds(3)).unwrap();
        sign_transaction_at(&mut late, &keypair, 5000, ClockDelta::from_seconds(-7)).unwrap();

        assert_eq!(early.timestamp, Some(4997));
        assert_eq!(late.timestamp, Some(5007));
        assert_eq!(late.timestamp.unwrap() - early.timestamp.unwrap(), 3 - (-7));
    }

    #[test]
    fn test_unsigned_transaction_finalize() {
        let keypair = Arc::new(keypair());
        let unsigned = UnsignedTransaction::new(skeleton(&keypair), keypair.clone());
        assert!(unsigned.transaction().signature.is_none());

        let body = unsigned.into_request().resolve(ClockDelta::default()).unwrap();
        let signed = transaction_from_body(&body).unwrap();
        assert!(verify_transaction(&signed).unwrap());
    }

    #[test]
    fn test_unsigned_is_not_verified() {
        let keypair = keypair();
        assert!(!verify_transaction(&skeleton(&keypair)).unwrap());
    }
}
