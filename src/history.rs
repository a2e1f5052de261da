//! Chat history retrieval.

use futures::future::join_all;
use serde_json::Value;

use crate::adamant::AdamantClient;
use crate::blockchain::{ensure_success, u64_field, NodeClient};
use crate::markdown::MarkdownRenderer;
use crate::models::{ChatPage, DecodedChat};
use crate::transaction::Transaction;
use crate::types::{AdamantError, Result};

impl<N, R> AdamantClient<N, R>
where
    N: NodeClient,
    R: MarkdownRenderer,
{
    /// Fetches and decodes a page of chat transactions, newest first.
    ///
    /// `from` is the lowest block height and `offset` skips that many
    /// transactions; zero means unset for both.
    ///
    /// For messages we sent, the recipient's public key has to be looked up.
    /// Those lookups go through a queue one at a time; everything else
    /// decodes concurrently. A record that fails to parse or decode stays in
    /// the page with `message: None`, so the page has one entry per record.
    pub async fn get_chats(&self, from: u64, offset: u64) -> Result<ChatPage> {
        let address = self.session.address()?.to_string();

        let mut query = vec![
            ("isIn", address.clone()),
            ("orderBy", "timestamp:desc".to_string()),
        ];
        if from != 0 {
            query.push(("fromHeight", from.to_string()));
        }
        if offset != 0 {
            query.push(("offset", offset.to_string()));
        }
        if let Some(limit) = self.config.chat_page_size {
            query.push(("limit", limit.to_string()));
        }

        let response = ensure_success(self.node.get("/api/chats/get/", &query).await?)?;

        let records = response
            .get("transactions")
            .and_then(Value::as_array)
            .ok_or_else(|| AdamantError::InvalidResponse("missing transactions".to_string()))?;
        let count = response
            .get("count")
            .and_then(u64_field)
            .unwrap_or(records.len() as u64);

        let decodes = records
            .iter()
            .map(|raw| self.decode_history_item(&address, raw.clone()));
        let transactions = join_all(decodes).await;

        tracing::debug!(
            count,
            page = transactions.len(),
            failed = transactions.iter().filter(|t| !t.is_decoded()).count(),
            "chat page decoded"
        );

        Ok(ChatPage {
            count,
            transactions,
        })
    }

    async fn decode_history_item(&self, address: &str, raw: Value) -> DecodedChat {
        let transaction = match serde_json::from_value::<Transaction>(raw.clone()) {
            Ok(transaction) => transaction,
            Err(e) => {
                tracing::warn!(id = ?raw.get("id"), error = %e, "malformed chat transaction");
                return DecodedChat {
                    raw,
                    transaction: None,
                    message: None,
                };
            }
        };

        let key = if transaction.recipient_id.as_deref() == Some(address) {
            Ok(transaction.sender_public_key.clone())
        } else {
            let recipient = transaction.recipient_id.clone().unwrap_or_default();
            self.resolve_queue
                .run(self.get_public_key(&recipient))
                .await
        };

        let message = match key.and_then(|key| self.decode_chat_content(&transaction, &key)) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::warn!(id = ?transaction.id, error = %e, "failed to decode chat message");
                None
            }
        };

        DecodedChat {
            raw,
            transaction: Some(transaction),
            message,
        }
    }
}
