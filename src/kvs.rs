//! Ledger key-value store.
//!
//! Values live in STATE transactions keyed by (owner address, key); the
//! newest one wins. A value is either plain text or the JSON of an
//! [`Envelope`](crate::envelope::Envelope) encrypted to the owner.

use serde_json::Value;

use crate::adamant::AdamantClient;
use crate::blockchain::{ensure_success, transaction_id, NodeClient};
use crate::crypto::{decode_value, encode_value};
use crate::envelope::envelope_nonce;
use crate::keys::Keypair;
use crate::markdown::MarkdownRenderer;
use crate::transaction::{StateAsset, TransactionType};
use crate::types::Result;

impl<N, R> AdamantClient<N, R>
where
    N: NodeClient,
    R: MarkdownRenderer,
{
    /// Stores `value` under `key`, optionally encrypted to ourselves.
    ///
    /// Unencrypted string values are stored verbatim, any other JSON value
    /// as its JSON text. Returns the transaction ID.
    pub async fn store_value(&self, key: &str, value: &Value, encode: bool) -> Result<String> {
        let stored = if encode {
            encode_value(value, self.session.keypair()?)?.to_json()?
        } else {
            match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            }
        };

        let mut transaction = self.session.new_transaction(TransactionType::State)?;
        transaction.asset.state = Some(StateAsset {
            key: key.to_string(),
            value: stored,
            kind: 0,
        });

        let body = self.session.prepare(transaction)?.into_request();
        let response = self.node.post("/api/states/store", body).await?;
        transaction_id(&ensure_success(response)?)
    }

    /// Reads the newest value stored under `key` by `owner` (ourselves by default).
    ///
    /// Returns `Ok(None)` if nothing was ever stored.
    pub async fn get_stored(&self, key: &str, owner: Option<&str>) -> Result<Option<Value>> {
        let owner = match owner {
            Some(owner) => owner.to_string(),
            None => self.session.address()?.to_string(),
        };
        let keypair = self.session.keypair()?;

        let query = [
            ("senderId", owner),
            ("key", key.to_string()),
            ("orderBy", "timestamp:desc".to_string()),
            ("limit", "1".to_string()),
        ];
        let response = ensure_success(self.node.get("/api/states/get", &query).await?)?;

        let raw = response
            .get("transactions")
            .and_then(Value::as_array)
            .and_then(|transactions| transactions.first())
            .and_then(|tx| tx.pointer("/asset/state/value"))
            .and_then(Value::as_str);

        match raw {
            Some(raw) => decode_stored_value(raw, keypair).map(Some),
            None => Ok(None),
        }
    }
}

/// Decodes a raw KVS value.
///
/// - not JSON: the raw text, unchanged
/// - JSON with a nonce: decrypted with our keypair (failures are errors)
/// - other JSON: the parsed value
///
/// A legacy plain value that happens to be valid JSON is returned parsed.
pub fn decode_stored_value(raw: &str, keypair: &Keypair) -> Result<Value> {
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(parsed) => parsed,
        Err(_) => return Ok(Value::String(raw.to_string())),
    };

    let nonce = match envelope_nonce(&parsed) {
        Some(nonce) => nonce,
        None => return Ok(parsed),
    };

    let message = parsed.get("message").and_then(Value::as_str).unwrap_or_default();
    decode_value(message, keypair, nonce).map_err(|e| {
        tracing::warn!(error = %e, "failed to decode encrypted value");
        e
    })
}
