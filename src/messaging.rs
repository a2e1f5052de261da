//! Sending and decoding encrypted chat messages.

use serde_json::Value;

use crate::adamant::AdamantClient;
use crate::blockchain::{ensure_success, transaction_id, NodeClient};
use crate::crypto::{decode_message, encode_message};
use crate::i18n::legacy_i18n_key;
use crate::keys::decode_public_key_hex;
use crate::markdown::MarkdownRenderer;
use crate::models::{ChatContent, DecodedChat, MessageParams, MessageReceipt};
use crate::transaction::{prepare_amount, ChatAsset, ChatType, Transaction, TransactionType};
use crate::types::{AdamantError, Result};

impl<N, R> AdamantClient<N, R>
where
    N: NodeClient,
    R: MarkdownRenderer,
{
    /// Encrypts and sends a chat message.
    ///
    /// Never fails: any error on the way (key lookup, encryption, node
    /// rejection, transport) comes back as [`MessageReceipt::Rejected`].
    pub async fn send_message(&self, params: MessageParams) -> MessageReceipt {
        let recipient = params.to.clone();
        match self.try_send_message(params).await {
            Ok(transaction_id) => {
                tracing::debug!(%recipient, %transaction_id, "message sent");
                MessageReceipt::Accepted { transaction_id }
            }
            Err(e) => {
                tracing::warn!(%recipient, error = %e, "message rejected");
                MessageReceipt::Rejected {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Sends a rich (type 2) message carrying `payload`.
    pub async fn send_special_message(&self, to: &str, payload: Value) -> MessageReceipt {
        self.send_message(MessageParams::new(to, payload).rich()).await
    }

    async fn try_send_message(&self, params: MessageParams) -> Result<String> {
        let recipient_key = self.get_public_key(&params.to).await?;
        let keypair = self.session.keypair()?;

        let envelope = encode_message(
            &params.message.to_text(),
            &decode_public_key_hex(&recipient_key)?,
            keypair,
        )?;

        let mut transaction = self.session.new_transaction(TransactionType::ChatMessage)?;
        transaction.amount = params.amount.map(prepare_amount).transpose()?.unwrap_or(0);
        transaction.recipient_id = Some(params.to);
        transaction.asset.chat = Some(ChatAsset {
            message: envelope.message,
            own_message: envelope.nonce,
            kind: params.kind,
        });

        let body = self.session.prepare(transaction)?.into_request();
        let response = self.node.post("/api/chats/process", body).await?;
        transaction_id(&ensure_success(response)?)
    }

    /// Decodes a received chat transaction.
    ///
    /// `counterpart_public_key` is the hex key of the other party: the
    /// sender for incoming messages, the recipient for our own.
    pub fn decode_chat(
        &self,
        transaction: Transaction,
        counterpart_public_key: &str,
    ) -> Result<DecodedChat> {
        let content = self.decode_chat_content(&transaction, counterpart_public_key)?;
        Ok(DecodedChat {
            raw: serde_json::to_value(&transaction)?,
            transaction: Some(transaction),
            message: Some(content),
        })
    }

    pub(crate) fn decode_chat_content(
        &self,
        transaction: &Transaction,
        counterpart_public_key: &str,
    ) -> Result<ChatContent> {
        let keypair = self.session.keypair()?;
        let chat = transaction
            .asset
            .chat
            .as_ref()
            .ok_or_else(|| AdamantError::DecryptionError("not a chat transaction".to_string()))?;

        let text = decode_message(
            &chat.message,
            &decode_public_key_hex(counterpart_public_key)?,
            keypair,
            &chat.own_message,
        )?;

        if chat.kind == ChatType::Rich {
            return Ok(ChatContent::Rich(serde_json::from_str(&text)?));
        }

        Ok(match legacy_i18n_key(&text, &transaction.sender_id) {
            Some(key) => ChatContent::I18n(key.to_string()),
            None => ChatContent::Rendered(self.renderer.render(&text)),
        })
    }
}
