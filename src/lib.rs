//! ADAMANT Chat - Encrypted messaging and key-value storage on the ADAMANT ledger
//!
//! Rust implementation of the ADAMANT client protocol: Ed25519 accounts derived
//! from a passphrase, NaCl box chat messages, secretbox-encrypted KVS values and
//! signed transactions submitted through a pluggable [`NodeClient`].

mod types;
mod keys;
mod crypto;
mod envelope;
mod transaction;
mod signer;
mod blockchain;
mod storage;
mod queue;
mod session;
mod models;
mod i18n;
mod markdown;
mod adamant;
mod messaging;
mod kvs;
mod history;

pub use types::*;
pub use keys::*;
pub use crypto::*;
pub use envelope::*;
pub use transaction::*;
pub use signer::*;
pub use blockchain::*;
pub use storage::*;
pub use queue::*;
pub use session::*;
pub use models::*;
pub use i18n::*;
pub use markdown::*;
pub use adamant::*;
pub use kvs::*;
