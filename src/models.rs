//! Data models for the ADAMANT client.
//!
//! This module defines the decoded chat structures, outgoing message
//! parameters, send receipts and account details used throughout the
//! library.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transaction::{ChatType, Transaction, TransactionType};

/// Decoded content of a chat transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatContent {
    /// Plain text after markdown rendering.
    Rendered(String),
    /// Legacy auto-generated message, identified by its i18n key.
    I18n(String),
    /// Structured payload of a rich (type 2) message.
    Rich(Value),
}

/// A chat record together with its decoded message.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedChat {
    /// The record as returned by the node.
    pub raw: Value,
    /// The parsed transaction, or `None` if the record is malformed.
    pub transaction: Option<Transaction>,
    /// Decoded message, or `None` if decoding failed.
    pub message: Option<ChatContent>,
}

impl DecodedChat {
    /// The transaction ID, read from the raw record if it did not parse.
    pub fn id(&self) -> Option<&str> {
        match &self.transaction {
            Some(transaction) => transaction.id.as_deref(),
            None => self.raw.get("id").and_then(Value::as_str),
        }
    }

    /// Whether this is a legacy i18n auto-message.
    pub fn is_i18n(&self) -> bool {
        matches!(self.message, Some(ChatContent::I18n(_)))
    }

    /// Whether decoding succeeded.
    pub fn is_decoded(&self) -> bool {
        self.message.is_some()
    }
}

/// One page of chat history.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPage {
    /// Total number of chat transactions the node knows for this account.
    pub count: u64,
    /// Transactions of this page, in node order.
    pub transactions: Vec<DecodedChat>,
}

/// Payload of an outgoing message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePayload {
    /// Sent verbatim.
    Text(String),
    /// Sent as its JSON text.
    Structured(Value),
}

impl MessagePayload {
    /// The text that gets encrypted.
    pub fn to_text(&self) -> String {
        match self {
            MessagePayload::Text(text) => text.clone(),
            MessagePayload::Structured(value) => value.to_string(),
        }
    }
}

impl From<&str> for MessagePayload {
    fn from(text: &str) -> Self {
        MessagePayload::Text(text.to_string())
    }
}

impl From<String> for MessagePayload {
    fn from(text: String) -> Self {
        MessagePayload::Text(text)
    }
}

impl From<Value> for MessagePayload {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => MessagePayload::Text(text),
            other => MessagePayload::Structured(other),
        }
    }
}

/// Parameters of an outgoing chat message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageParams {
    /// Recipient address.
    pub to: String,
    /// Message payload.
    pub message: MessagePayload,
    /// Payload kind (basic text unless stated otherwise).
    pub kind: ChatType,
    /// ADM to transfer along with the message.
    pub amount: Option<f64>,
}

impl MessageParams {
    /// A basic text message without a transfer.
    pub fn new(to: impl Into<String>, message: impl Into<MessagePayload>) -> Self {
        Self {
            to: to.into(),
            message: message.into(),
            kind: ChatType::Basic,
            amount: None,
        }
    }

    /// Marks the message as a rich (structured) one.
    pub fn rich(mut self) -> Self {
        self.kind = ChatType::Rich;
        self
    }

    /// Attaches an ADM transfer.
    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }
}

/// Outcome of sending a chat message.
///
/// Sending never returns an error: a failure anywhere in the chain is
/// reported as [`MessageReceipt::Rejected`] so callers inspect the outcome
/// rather than an error channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageReceipt {
    /// The node accepted the transaction.
    Accepted { transaction_id: String },
    /// Something failed; `reason` describes what.
    Rejected { reason: String },
}

impl MessageReceipt {
    pub fn is_accepted(&self) -> bool {
        matches!(self, MessageReceipt::Accepted { .. })
    }

    /// The transaction ID if accepted.
    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            MessageReceipt::Accepted { transaction_id } => Some(transaction_id),
            MessageReceipt::Rejected { .. } => None,
        }
    }
}

/// Account details with balances in ADM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub address: String,
    pub balance: f64,
    pub unconfirmed_balance: f64,
    /// Hex public key.
    pub public_key: String,
    /// Set when the account was created by this lookup.
    pub is_new: bool,
}

/// Filter for [`crate::AdamantClient::get_transactions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionQuery {
    /// Transaction type (transfers if unset).
    pub kind: Option<TransactionType>,
    /// Lowest block height.
    pub from_height: Option<u64>,
    /// Highest block height.
    pub to_height: Option<u64>,
}
