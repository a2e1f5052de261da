//! Ledger transaction records and their canonical byte layout.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::keys::parse_address;
use crate::types::{AdamantError, Result, EPOCH_MILLIS, SATS_PER_ADM};

/// Transaction types understood by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TransactionType {
    Send,
    Signature,
    Delegate,
    Vote,
    Multi,
    Dapp,
    InTransfer,
    OutTransfer,
    ChatMessage,
    State,
}

impl From<TransactionType> for u8 {
    fn from(kind: TransactionType) -> u8 {
        match kind {
            TransactionType::Send => 0,
            TransactionType::Signature => 1,
            TransactionType::Delegate => 2,
            TransactionType::Vote => 3,
            TransactionType::Multi => 4,
            TransactionType::Dapp => 5,
            TransactionType::InTransfer => 6,
            TransactionType::OutTransfer => 7,
            TransactionType::ChatMessage => 8,
            TransactionType::State => 9,
        }
    }
}

impl TryFrom<u8> for TransactionType {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Ok(match value {
            0 => TransactionType::Send,
            1 => TransactionType::Signature,
            2 => TransactionType::Delegate,
            3 => TransactionType::Vote,
            4 => TransactionType::Multi,
            5 => TransactionType::Dapp,
            6 => TransactionType::InTransfer,
            7 => TransactionType::OutTransfer,
            8 => TransactionType::ChatMessage,
            9 => TransactionType::State,
            other => return Err(format!("unknown transaction type {}", other)),
        })
    }
}

/// Kind of payload carried by a chat transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum ChatType {
    /// Plain text, rendered as markdown.
    Basic,
    /// Structured JSON payload (transfers, signals).
    Rich,
    /// Any other value; decoded as text.
    Other(u32),
}

impl From<u32> for ChatType {
    fn from(value: u32) -> Self {
        match value {
            1 => ChatType::Basic,
            2 => ChatType::Rich,
            other => ChatType::Other(other),
        }
    }
}

impl From<ChatType> for u32 {
    fn from(kind: ChatType) -> u32 {
        match kind {
            ChatType::Basic => 1,
            ChatType::Rich => 2,
            ChatType::Other(other) => other,
        }
    }
}

/// Encrypted chat payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAsset {
    /// Hex ciphertext.
    pub message: String,
    /// Hex nonce.
    pub own_message: String,
    /// Payload kind.
    #[serde(rename = "type")]
    pub kind: ChatType,
}

/// Key-value store entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateAsset {
    pub key: String,
    pub value: String,
    #[serde(rename = "type", default)]
    pub kind: u32,
}

/// Type-specific transaction payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<ChatAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StateAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<Vec<String>>,
}

/// A ledger transaction as submitted to and returned by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Amount in smallest units.
    #[serde(default)]
    pub amount: u64,
    pub sender_id: String,
    /// Hex Ed25519 public key of the sender.
    pub sender_public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub asset: Asset,
    /// Seconds since the protocol epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Hex Ed25519 signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Transaction ID (assigned by the node).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Block height (confirmed transactions only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
}

impl Transaction {
    /// Serialize the transaction into the byte layout the ledger signs.
    ///
    /// Layout (little-endian):
    /// - type (1 byte)
    /// - timestamp (4 bytes)
    /// - sender public key (32 bytes)
    /// - recipient (8 bytes, big-endian address number, zeros if absent)
    /// - amount (8 bytes)
    /// - asset bytes (type specific)
    /// - signature (64 bytes, only if present)
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let sender_public_key = hex::decode(&self.sender_public_key).map_err(|e| {
            AdamantError::InvalidPublicKey(format!("{}: {}", self.sender_public_key, e))
        })?;
        let asset_bytes = self.asset_bytes()?;

        let mut data = Vec::with_capacity(1 + 4 + 32 + 8 + 8 + asset_bytes.len() + 64);
        data.push(u8::from(self.kind));
        data.extend_from_slice(&(self.timestamp.unwrap_or(0) as i32).to_le_bytes());
        data.extend_from_slice(&sender_public_key);

        match &self.recipient_id {
            Some(recipient) => data.extend_from_slice(&parse_address(recipient)?.to_be_bytes()),
            None => data.extend_from_slice(&[0u8; 8]),
        }

        data.extend_from_slice(&(self.amount as i64).to_le_bytes());
        data.extend_from_slice(&asset_bytes);

        if let Some(signature) = &self.signature {
            let signature = hex::decode(signature)
                .map_err(|e| AdamantError::EncodingError(format!("Invalid signature hex: {}", e)))?;
            data.extend_from_slice(&signature);
        }

        Ok(data)
    }

    /// SHA-256 of [`Transaction::to_bytes`].
    pub fn hash(&self) -> Result<[u8; 32]> {
        Ok(Sha256::digest(self.to_bytes()?).into())
    }

    fn asset_bytes(&self) -> Result<Vec<u8>> {
        let mut data = Vec::new();

        match self.kind {
            TransactionType::ChatMessage => {
                if let Some(chat) = &self.asset.chat {
                    data.extend(hex::decode(&chat.message).map_err(|e| {
                        AdamantError::EncodingError(format!("Invalid chat message hex: {}", e))
                    })?);
                    data.extend(hex::decode(&chat.own_message).map_err(|e| {
                        AdamantError::EncodingError(format!("Invalid chat nonce hex: {}", e))
                    })?);
                    data.extend_from_slice(&(u32::from(chat.kind) as i32).to_le_bytes());
                }
            }
            TransactionType::State => {
                if let Some(state) = &self.asset.state {
                    data.extend_from_slice(state.value.as_bytes());
                    data.extend_from_slice(state.key.as_bytes());
                    data.extend_from_slice(&(state.kind as i32).to_le_bytes());
                }
            }
            TransactionType::Vote => {
                if let Some(votes) = &self.asset.votes {
                    data.extend_from_slice(votes.concat().as_bytes());
                }
            }
            _ => {}
        }

        Ok(data)
    }
}

/// Current time in whole seconds since the protocol epoch.
pub fn epoch_time() -> i64 {
    let now_millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);
    (now_millis - EPOCH_MILLIS as i64).div_euclid(1000)
}

/// Convert an ADM amount into smallest units.
pub fn prepare_amount(amount: f64) -> Result<u64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AdamantError::InvalidAmount(amount.to_string()));
    }
    let sats = (amount * SATS_PER_ADM as f64).round();
    if sats > u64::MAX as f64 {
        return Err(AdamantError::InvalidAmount(amount.to_string()));
    }
    Ok(sats as u64)
}

/// Convert smallest units into ADM.
pub fn to_adm(sats: u64) -> f64 {
    sats as f64 / SATS_PER_ADM as f64
}
