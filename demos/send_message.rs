//! Prepare and sign a chat message without a network.
//!
//! Prints the request bodies the client would submit to a node.
//!
//! ```text
//! cargo run --example send_message -- "<sender passphrase>" "<recipient passphrase>" "text"
//! ```

use std::env;

use adamant_chat::{
    AdamantClient, ClientConfig, ClockDelta, Keypair, MessageParams, MessageReceipt, NodeClient,
    Query, RequestBody, Result,
};
use serde_json::{json, Value};

/// Answers key lookups for one peer and prints everything submitted.
struct OfflineNode {
    peer: Keypair,
}

#[async_trait::async_trait]
impl NodeClient for OfflineNode {
    async fn get(&self, path: &str, query: &Query) -> Result<Value> {
        match path {
            "/api/accounts/getPublicKey" => {
                let known = query
                    .iter()
                    .any(|(key, value)| *key == "address" && *value == self.peer.address());
                if known {
                    Ok(json!({ "success": true, "publicKey": self.peer.public_key_hex() }))
                } else {
                    Ok(json!({ "success": false, "error": "Account not found" }))
                }
            }
            _ => Ok(json!({ "success": false, "error": "offline" })),
        }
    }

    async fn post(&self, path: &str, body: RequestBody) -> Result<Value> {
        let body = body.resolve(ClockDelta::default())?;
        println!("POST {}", path);
        println!("{}", serde_json::to_string_pretty(&body)?);
        Ok(json!({ "success": true, "transactionId": "offline" }))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let (sender, recipient, text) = match args.as_slice() {
        [sender, recipient, text] => (sender.as_str(), recipient.as_str(), text.as_str()),
        _ => {
            eprintln!("usage: send_message <sender passphrase> <recipient passphrase> <text>");
            std::process::exit(2);
        }
    };

    let peer = Keypair::from_passphrase(recipient)?;
    let to = peer.address();

    let mut client = AdamantClient::new(ClientConfig::localnet(), OfflineNode { peer });
    let from = client.unlock(sender)?.to_string();
    println!("{} -> {}", from, to);

    match client.send_message(MessageParams::new(to, text)).await {
        MessageReceipt::Accepted { transaction_id } => println!("accepted: {}", transaction_id),
        MessageReceipt::Rejected { reason } => println!("rejected: {}", reason),
    }
    Ok(())
}
