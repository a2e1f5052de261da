//! Node interfaces for ADAMANT integration.
//!
//! This module provides the trait the client uses to talk to an ADAMANT
//! node. Implementations own the HTTP transport, node selection and any
//! timeout policy; they also measure the clock delta against the node they
//! picked for each request.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{AdamantError, Result};

/// Configuration for ADAMANT node connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node base URLs, in order of preference.
    pub nodes: Vec<String>,
}

impl NodeConfig {
    /// Creates a configuration for a single node.
    pub fn new(url: &str) -> Self {
        Self {
            nodes: vec![url.to_string()],
        }
    }

    /// Adds a fallback node.
    pub fn with_node(mut self, url: &str) -> Self {
        self.nodes.push(url.to_string());
        self
    }

    /// Creates configuration for a local node.
    pub fn localnet() -> Self {
        Self::new("http://localhost:36666")
    }

    /// Creates configuration for the public test network.
    pub fn testnet() -> Self {
        Self::new("https://testnet.adamant.im")
    }

    /// Creates configuration for the main network.
    pub fn mainnet() -> Self {
        Self::new("https://endless.adamant.im")
            .with_node("https://clown.adamant.im")
            .with_node("https://lake.adamant.im")
    }
}

/// Local wall-clock time minus the node's reported time, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ClockDelta(i64);

impl ClockDelta {
    pub fn from_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    pub fn seconds(self) -> i64 {
        self.0
    }
}

/// Builds a request body once the clock delta is known.
pub type BodyFactory = Box<dyn FnOnce(ClockDelta) -> Result<Value> + Send>;

/// Body of a POST request.
pub enum RequestBody {
    /// A body that does not depend on the node clock.
    Json(Value),
    /// A body that must be finalized (timestamped and signed) right before
    /// transmission.
    Deferred(BodyFactory),
}

impl RequestBody {
    /// Wraps a closure as a deferred body.
    pub fn deferred<F>(factory: F) -> Self
    where
        F: FnOnce(ClockDelta) -> Result<Value> + Send + 'static,
    {
        RequestBody::Deferred(Box::new(factory))
    }

    /// Produces the JSON to transmit.
    pub fn resolve(self, time_delta: ClockDelta) -> Result<Value> {
        match self {
            RequestBody::Json(value) => Ok(value),
            RequestBody::Deferred(factory) => factory(time_delta),
        }
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Json(value) => f.debug_tuple("Json").field(value).finish(),
            RequestBody::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Query string parameters.
pub type Query = [(&'static str, String)];

/// Trait for interacting with an ADAMANT node.
///
/// Both methods return the decoded JSON response as-is; checking the
/// `success` flag is up to the caller (see [`ensure_success`]). Transport
/// failures are reported as [`AdamantError::Transport`].
#[async_trait::async_trait]
pub trait NodeClient: Send + Sync {
    /// Issue a GET request.
    async fn get(&self, path: &str, query: &Query) -> Result<Value>;

    /// Issue a POST request, resolving `body` with this request's clock delta.
    async fn post(&self, path: &str, body: RequestBody) -> Result<Value>;
}

/// Returns the response if the node reported success.
pub fn ensure_success(response: Value) -> Result<Value> {
    if response.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(response);
    }
    Err(AdamantError::Node(error_text(&response)))
}

/// The node's `error` string, or a placeholder.
pub fn error_text(response: &Value) -> String {
    response
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("Unknown node error")
        .to_string()
}

/// Reads an integer the node may send either as a number or as a string.
pub fn u64_field(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Reads the `transactionId` of a successful submission.
pub fn transaction_id(response: &Value) -> Result<String> {
    response
        .get("transactionId")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AdamantError::InvalidResponse("missing transactionId".to_string()))
}
