//! Main ADAMANT client.
//!
//! This module provides the primary interface for account, transfer,
//! delegate and public key operations. Messaging, KVS and chat history
//! live in their own modules as further `impl` blocks on [`AdamantClient`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::blockchain::{
    ensure_success, error_text, transaction_id, u64_field, NodeClient, NodeConfig, RequestBody,
};
use crate::markdown::{EscapingRenderer, MarkdownRenderer};
use crate::models::{AccountInfo, TransactionQuery};
use crate::queue::SerialQueue;
use crate::session::Session;
use crate::storage::PublicKeyCache;
use crate::transaction::{prepare_amount, to_adm, Transaction, TransactionType};
use crate::types::{AdamantError, Result, ACTIVE_DELEGATES, ADDRESS_NOT_FOUND};

/// Configuration for the ADAMANT client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Node network configuration.
    pub network: NodeConfig,
    /// Page size for chat history requests (node default if unset).
    #[serde(default)]
    pub chat_page_size: Option<u32>,
}

impl ClientConfig {
    /// Creates a new configuration with the given network settings.
    pub fn new(network: NodeConfig) -> Self {
        Self {
            network,
            chat_page_size: None,
        }
    }

    /// Creates a configuration for a local node.
    pub fn localnet() -> Self {
        Self::new(NodeConfig::localnet())
    }

    /// Creates a configuration for the test network.
    pub fn testnet() -> Self {
        Self::new(NodeConfig::testnet())
    }

    /// Creates a configuration for the main network.
    pub fn mainnet() -> Self {
        Self::new(NodeConfig::mainnet())
    }

    /// Sets the chat history page size.
    pub fn with_chat_page_size(mut self, size: u32) -> Self {
        self.chat_page_size = Some(size);
        self
    }
}

/// The ADAMANT protocol client.
///
/// Owns everything the protocol operations share: the session, the public
/// key cache, the key resolution queue, the node client and the markdown
/// renderer. Unlock once, then share it (e.g. behind an `Arc`); all
/// operations take `&self`.
pub struct AdamantClient<N, R = EscapingRenderer>
where
    N: NodeClient,
    R: MarkdownRenderer,
{
    pub(crate) config: ClientConfig,
    pub(crate) node: N,
    pub(crate) renderer: R,
    pub(crate) session: Session,
    pub(crate) public_key_cache: PublicKeyCache,
    /// Serializes public key lookups made while decoding chat history.
    pub(crate) resolve_queue: SerialQueue,
}

impl<N> AdamantClient<N, EscapingRenderer>
where
    N: NodeClient,
{
    /// Creates a locked client with the default renderer.
    pub fn new(config: ClientConfig, node: N) -> Self {
        Self::with_renderer(config, node, EscapingRenderer)
    }
}

impl<N, R> AdamantClient<N, R>
where
    N: NodeClient,
    R: MarkdownRenderer,
{
    /// Creates a locked client with a custom markdown renderer.
    pub fn with_renderer(config: ClientConfig, node: N, renderer: R) -> Self {
        Self {
            config,
            node,
            renderer,
            session: Session::new(),
            public_key_cache: PublicKeyCache::new(),
            resolve_queue: SerialQueue::new(),
        }
    }

    /// Derives the account from `passphrase` and returns its address.
    pub fn unlock(&mut self, passphrase: &str) -> Result<&str> {
        self.session.unlock(passphrase)
    }

    /// Returns true once the client is unlocked.
    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    /// Returns the unlocked address.
    pub fn address(&self) -> Result<&str> {
        self.session.address()
    }

    /// Returns the session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the node client.
    pub fn node(&self) -> &N {
        &self.node
    }

    /// Returns the public key cache.
    pub fn public_key_cache(&self) -> &PublicKeyCache {
        &self.public_key_cache
    }

    pub(crate) fn ensure_ready(&self) -> Result<()> {
        if self.session.is_ready() {
            Ok(())
        } else {
            Err(AdamantError::NotReady)
        }
    }

    /// Resolves the public key (hex) of an address.
    ///
    /// Keys are cached for the lifetime of the client. Concurrent lookups of
    /// the same unknown address are not merged; they all hit the node.
    pub async fn get_public_key(&self, address: &str) -> Result<String> {
        self.ensure_ready()?;

        if let Some(key) = self.public_key_cache.retrieve(address).await {
            tracing::debug!(%address, "public key cache hit");
            return Ok(key);
        }

        tracing::debug!(%address, "resolving public key");
        let response = self
            .node
            .get("/api/accounts/getPublicKey", &[("address", address.to_string())])
            .await?;
        let response = ensure_success(response)?;

        let key = response
            .get("publicKey")
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AdamantError::InvalidResponse(format!("no public key for {}", address)))?
            .to_string();

        self.public_key_cache.store(address, &key).await;
        Ok(key)
    }

    /// Retrieves the current account, creating it on the node if needed.
    pub async fn get_current_account(&self) -> Result<AccountInfo> {
        let public_key = self.session.keypair()?.public_key_hex();

        let response = self
            .node
            .get("/api/accounts", &[("publicKey", public_key.clone())])
            .await?;

        let (account, is_new) = if response.get("success").and_then(Value::as_bool) == Some(true) {
            (response.get("account").cloned(), false)
        } else if error_text(&response) == ADDRESS_NOT_FOUND {
            let created = self
                .node
                .post(
                    "/api/accounts/new",
                    RequestBody::Json(serde_json::json!({ "publicKey": public_key })),
                )
                .await?;
            if created.get("error").is_some() {
                return Err(AdamantError::Node(error_text(&created)));
            }
            tracing::info!(address = ?self.session.address().ok(), "account created");
            (created.get("account").cloned(), true)
        } else {
            return Err(AdamantError::Node(error_text(&response)));
        };

        let account =
            account.ok_or_else(|| AdamantError::InvalidResponse("missing account".to_string()))?;

        Ok(AccountInfo {
            address: account
                .get("address")
                .and_then(Value::as_str)
                .unwrap_or(self.session.address()?)
                .to_string(),
            balance: to_adm(account.get("balance").and_then(u64_field).unwrap_or(0)),
            unconfirmed_balance: to_adm(
                account
                    .get("unconfirmedBalance")
                    .and_then(u64_field)
                    .unwrap_or(0),
            ),
            public_key,
            is_new,
        })
    }

    /// Sends `amount` ADM to `to` and returns the transaction ID.
    pub async fn send_tokens(&self, to: &str, amount: f64) -> Result<String> {
        let mut transaction = self.session.new_transaction(TransactionType::Send)?;
        transaction.amount = prepare_amount(amount)?;
        transaction.recipient_id = Some(to.to_string());

        let body = self.session.prepare(transaction)?.into_request();
        let response = self.node.post("/api/transactions/process", body).await?;
        transaction_id(&ensure_success(response)?)
    }

    /// Votes for (`+<publicKey>`) or against (`-<publicKey>`) delegates.
    pub async fn vote_for_delegates(&self, votes: Vec<String>) -> Result<Value> {
        let mut transaction = self.session.new_transaction(TransactionType::Vote)?;
        transaction.recipient_id = Some(self.session.address()?.to_string());
        transaction.asset.votes = Some(votes);

        let body = self.session.prepare(transaction)?.into_bare_request();
        let response = self.node.post("/api/accounts/delegates", body).await?;
        ensure_success(response)
    }

    /// Lists registered delegates.
    pub async fn get_delegates(&self, limit: u32, offset: u32) -> Result<Value> {
        self.read(
            "/api/delegates",
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
        )
        .await
    }

    /// Lists the delegates `address` voted for.
    pub async fn get_delegates_with_votes(&self, address: &str) -> Result<Value> {
        self.read("/api/accounts/delegates", &[("address", address.to_string())])
            .await
    }

    /// Number of registered delegates.
    pub async fn get_delegates_count(&self) -> Result<Value> {
        self.read("/api/delegates/count", &[]).await
    }

    /// Transactions waiting in the node's pool.
    pub async fn check_unconfirmed_transactions(&self) -> Result<Value> {
        self.read("/api/transactions/unconfirmed", &[]).await
    }

    /// Upcoming forgers among the active delegates.
    pub async fn get_next_forgers(&self) -> Result<Value> {
        self.read(
            "/api/delegates/getNextForgers",
            &[("limit", ACTIVE_DELEGATES.to_string())],
        )
        .await
    }

    /// The latest 100 blocks.
    pub async fn get_blocks(&self) -> Result<Value> {
        self.read(
            "/api/blocks",
            &[("orderBy", "height:desc".to_string()), ("limit", "100".to_string())],
        )
        .await
    }

    /// Forging statistics for a delegate public key.
    pub async fn get_forged_by_account(&self, public_key: &str) -> Result<Value> {
        self.read(
            "/api/delegates/forging/getForgedByAccount",
            &[("generatorPublicKey", public_key.to_string())],
        )
        .await
    }

    /// Lists transactions involving the current account.
    pub async fn get_transactions(&self, query: TransactionQuery) -> Result<Value> {
        let kind = query.kind.unwrap_or(TransactionType::Send);
        let mut params = vec![
            ("inId", self.session.address()?.to_string()),
            ("and:type", u8::from(kind).to_string()),
            ("orderBy", "timestamp:desc".to_string()),
        ];
        if let Some(to) = query.to_height {
            params.push(("and:toHeight", to.to_string()));
        }
        if let Some(from) = query.from_height {
            params.push(("and:fromHeight", from.to_string()));
        }

        self.read("/api/transactions", &params).await
    }

    /// Looks a transaction up, falling back to the unconfirmed pool.
    pub async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>> {
        self.ensure_ready()?;
        let query = [("id", id.to_string())];

        let mut response = self.node.get("/api/transactions/get", &query).await?;
        if response.get("success").and_then(Value::as_bool) != Some(true) {
            tracing::debug!(%id, "transaction not confirmed, checking pool");
            response = self
                .node
                .get("/api/transactions/unconfirmed/get", &query)
                .await?;
        }

        match response.get("transaction") {
            Some(raw) if !raw.is_null() => Ok(Some(serde_json::from_value(raw.clone())?)),
            _ => Ok(None),
        }
    }

    async fn read(&self, path: &str, query: &[(&'static str, String)]) -> Result<Value> {
        self.ensure_ready()?;
        ensure_success(self.node.get(path, query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = ClientConfig::testnet();
        assert!(config.network.nodes[0].contains("testnet"));
        assert_eq!(config.chat_page_size, None);

        let config = ClientConfig::mainnet().with_chat_page_size(25);
        assert_eq!(config.chat_page_size, Some(25));
    }

    #[test]
    fn test_config_serde() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"network": {"nodes": ["http://127.0.0.1:36666"]}}"#).unwrap();
        assert_eq!(config.network.nodes.len(), 1);
        assert_eq!(config.chat_page_size, None);
    }
}
