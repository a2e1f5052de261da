//! In-memory ADAMANT node for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use adamant_chat::{
    address_from_public_key, decode_public_key_hex, encode_message, transaction_from_body,
    verify_transaction, AdamantClient, AdamantError, Asset, ChatAsset, ChatType, ClientConfig,
    ClockDelta, Keypair, NodeClient, Query, RequestBody, Result, Transaction, TransactionType,
};
use serde_json::{json, Value};

pub const ALICE: &str = "apple banana cherry delta echo foxtrot golf hotel india juliet kilo lima";
pub const BOB: &str = "mike november oscar papa quebec romeo sierra tango uniform victor whiskey xray";

/// A request as the node saw it.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: &'static str,
    pub path: String,
    /// Query parameters for GET, resolved body for POST.
    pub params: Value,
}

pub struct MockNode {
    delta: ClockDelta,
    lookup_delay: Duration,
    reject_with: Option<String>,
    public_keys: Mutex<HashMap<String, String>>,
    accounts: Mutex<HashMap<String, Value>>,
    states: Mutex<Vec<Transaction>>,
    chats: Mutex<Vec<Value>>,
    confirmed: Mutex<HashMap<String, Value>>,
    unconfirmed: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<Request>>,
    lookups: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    next_id: AtomicU64,
}

impl MockNode {
    pub fn new() -> Self {
        Self {
            delta: ClockDelta::default(),
            lookup_delay: Duration::ZERO,
            reject_with: None,
            public_keys: Mutex::new(HashMap::new()),
            accounts: Mutex::new(HashMap::new()),
            states: Mutex::new(Vec::new()),
            chats: Mutex::new(Vec::new()),
            confirmed: Mutex::new(HashMap::new()),
            unconfirmed: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            lookups: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            next_id: AtomicU64::new(1000),
        }
    }

    pub fn with_delta(mut self, seconds: i64) -> Self {
        self.delta = ClockDelta::from_seconds(seconds);
        self
    }

    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = delay;
        self
    }

    /// Makes every transaction submission fail with `error`.
    pub fn rejecting(mut self, error: &str) -> Self {
        self.reject_with = Some(error.to_string());
        self
    }

    /// Registers the account of `keypair` so its public key resolves.
    pub fn register(&self, keypair: &Keypair) -> String {
        let address = keypair.address();
        self.public_keys
            .lock()
            .unwrap()
            .insert(address.clone(), keypair.public_key_hex());
        self.accounts.lock().unwrap().insert(
            keypair.public_key_hex(),
            json!({
                "address": address,
                "balance": "250000000",
                "unconfirmedBalance": "200000000",
                "publicKey": keypair.public_key_hex(),
            }),
        );
        address
    }

    pub fn push_chat(&self, transaction: Value) {
        self.chats.lock().unwrap().push(transaction);
    }

    pub fn push_state(&self, transaction: Transaction) {
        self.states.lock().unwrap().push(transaction);
    }

    pub fn add_confirmed(&self, id: &str, transaction: Value) {
        self.confirmed.lock().unwrap().insert(id.to_string(), transaction);
    }

    pub fn add_unconfirmed(&self, id: &str, transaction: Value) {
        self.unconfirmed.lock().unwrap().insert(id.to_string(), transaction);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    /// Addresses looked up via getPublicKey, in the order the lookups started.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Signed transactions posted to `path`.
    pub fn submitted(&self, path: &str) -> Vec<Transaction> {
        self.requests_to(path)
            .iter()
            .map(|request| transaction_from_body(&request.params).unwrap())
            .collect()
    }

    fn log(&self, method: &'static str, path: &str, params: Value) {
        self.requests.lock().unwrap().push(Request {
            method,
            path: path.to_string(),
            params,
        });
    }

    fn next_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }

    async fn lookup_public_key(&self, address: &str) -> Value {
        self.lookups.lock().unwrap().push(address.to_string());
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        tokio::time::sleep(self.lookup_delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let key = self.public_keys.lock().unwrap().get(address).cloned();
        match key {
            Some(key) => json!({ "success": true, "publicKey": key }),
            None => json!({ "success": false, "error": "Account not found" }),
        }
    }

    fn submit(&self, body: &Value) -> Value {
        let mut transaction = match transaction_from_body(body) {
            Ok(transaction) => transaction,
            Err(e) => return json!({ "success": false, "error": e.to_string() }),
        };
        if !verify_transaction(&transaction).unwrap_or(false) {
            return json!({ "success": false, "error": "Failed to verify signature" });
        }
        if let Some(error) = &self.reject_with {
            return json!({ "success": false, "error": error });
        }

        let id = self.next_id();
        transaction.id = Some(id.clone());
        if transaction.kind == TransactionType::State {
            self.states.lock().unwrap().push(transaction);
        }
        json!({ "success": true, "transactionId": id })
    }
}

fn param<'a>(query: &'a Query, name: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.as_str())
}

#[async_trait::async_trait]
impl NodeClient for MockNode {
    async fn get(&self, path: &str, query: &Query) -> Result<Value> {
        let params: serde_json::Map<String, Value> = query
            .iter()
            .map(|(key, value)| (key.to_string(), Value::String(value.clone())))
            .collect();
        self.log("GET", path, Value::Object(params));

        if path == "/api/accounts/getPublicKey" {
            let address = param(query, "address").unwrap_or_default().to_string();
            return Ok(self.lookup_public_key(&address).await);
        }
        Ok(self.read(path, query))
    }

    async fn post(&self, path: &str, body: RequestBody) -> Result<Value> {
        let body = body.resolve(self.delta)?;
        self.log("POST", path, body.clone());
        self.write(path, &body)
    }
}

impl MockNode {
    fn read(&self, path: &str, query: &Query) -> Value {
        match path {
            "/api/accounts" => {
                let public_key = param(query, "publicKey").unwrap_or_default();
                match self.accounts.lock().unwrap().get(public_key) {
                    Some(account) => json!({ "success": true, "account": account }),
                    None => json!({ "success": false, "error": "Address not found" }),
                }
            }
            "/api/states/get" => {
                let sender = param(query, "senderId").unwrap_or_default();
                let key = param(query, "key").unwrap_or_default();
                let latest: Vec<Transaction> = self
                    .states
                    .lock()
                    .unwrap()
                    .iter()
                    .rev()
                    .filter(|tx| {
                        tx.sender_id == sender
                            && tx.asset.state.as_ref().map(|s| s.key.as_str()) == Some(key)
                    })
                    .take(1)
                    .cloned()
                    .collect();
                json!({ "success": true, "transactions": latest })
            }
            "/api/chats/get/" => {
                let chats = self.chats.lock().unwrap().clone();
                json!({ "success": true, "count": chats.len().to_string(), "transactions": chats })
            }
            "/api/transactions/get" => {
                let id = param(query, "id").unwrap_or_default();
                match self.confirmed.lock().unwrap().get(id) {
                    Some(tx) => json!({ "success": true, "transaction": tx }),
                    None => json!({ "success": false, "error": "Transaction not found" }),
                }
            }
            "/api/transactions/unconfirmed/get" => {
                let id = param(query, "id").unwrap_or_default();
                match self.unconfirmed.lock().unwrap().get(id) {
                    Some(tx) => json!({ "success": true, "transaction": tx }),
                    None => json!({ "success": false, "error": "Transaction not found" }),
                }
            }
            "/api/delegates/count" => json!({ "success": true, "count": 237 }),
            _ => json!({ "success": true }),
        }
    }

    fn write(&self, path: &str, body: &Value) -> Result<Value> {
        let response = match path {
            "/api/chats/process"
            | "/api/states/store"
            | "/api/transactions/process"
            | "/api/accounts/delegates" => self.submit(body),
            "/api/accounts/new" => {
                let public_key = body
                    .get("publicKey")
                    .and_then(Value::as_str)
                    .ok_or_else(|| AdamantError::InvalidResponse("no publicKey".to_string()))?;
                let address = address_from_public_key(&decode_public_key_hex(public_key)?);
                let account = json!({
                    "address": address,
                    "balance": "0",
                    "unconfirmedBalance": "0",
                    "publicKey": public_key,
                });
                self.accounts
                    .lock()
                    .unwrap()
                    .insert(public_key.to_string(), account.clone());
                json!({ "success": true, "account": account })
            }
            _ => json!({ "success": false, "error": format!("unknown endpoint {}", path) }),
        };
        Ok(response)
    }
}

pub fn keypair(passphrase: &str) -> Keypair {
    Keypair::from_passphrase(passphrase).unwrap()
}

pub fn unlocked(node: MockNode) -> AdamantClient<MockNode> {
    let mut client = AdamantClient::new(ClientConfig::localnet(), node);
    client.unlock(ALICE).unwrap();
    client
}

/// A confirmed chat transaction from `sender` to `recipient` as the node lists it.
pub fn chat_transaction(
    id: &str,
    sender: &Keypair,
    sender_id: &str,
    recipient: &Keypair,
    text: &str,
    kind: ChatType,
) -> Value {
    let envelope = encode_message(text, &recipient.public_key(), sender).unwrap();
    let transaction = Transaction {
        kind: TransactionType::ChatMessage,
        amount: 0,
        sender_id: sender_id.to_string(),
        sender_public_key: sender.public_key_hex(),
        recipient_id: Some(recipient.address()),
        asset: Asset {
            chat: Some(ChatAsset {
                message: envelope.message,
                own_message: envelope.nonce,
                kind,
            }),
            ..Asset::default()
        },
        timestamp: Some(1000),
        signature: None,
        id: Some(id.to_string()),
        height: Some(10),
    };
    serde_json::to_value(transaction).unwrap()
}
