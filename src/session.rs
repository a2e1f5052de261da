//! Unlocked account state.

use std::sync::Arc;

use crate::keys::Keypair;
use crate::signer::UnsignedTransaction;
use crate::transaction::{Asset, Transaction, TransactionType};
use crate::types::{AdamantError, Result};

/// The account the client acts for.
///
/// Empty until [`Session::unlock`]; afterwards it holds the keypair and
/// address for the rest of the process. Every accessor fails with
/// [`AdamantError::NotReady`] while locked.
#[derive(Debug, Default)]
pub struct Session {
    keypair: Option<Arc<Keypair>>,
    address: Option<String>,
}

impl Session {
    /// Creates a locked session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the keypair and address from `passphrase`.
    ///
    /// The same passphrase always yields the same identity.
    pub fn unlock(&mut self, passphrase: &str) -> Result<&str> {
        let keypair = Keypair::from_passphrase(passphrase)?;
        let address = keypair.address();
        tracing::info!(%address, "session unlocked");

        self.keypair = Some(Arc::new(keypair));
        Ok(self.address.insert(address).as_str())
    }

    /// Returns true once both keypair and address are available.
    pub fn is_ready(&self) -> bool {
        self.keypair.is_some() && self.address.is_some()
    }

    /// The unlocked keypair.
    pub fn keypair(&self) -> Result<&Arc<Keypair>> {
        self.keypair.as_ref().ok_or(AdamantError::NotReady)
    }

    /// The unlocked address.
    pub fn address(&self) -> Result<&str> {
        self.address.as_deref().ok_or(AdamantError::NotReady)
    }

    /// A transaction skeleton with the common fields filled from the session.
    pub fn new_transaction(&self, kind: TransactionType) -> Result<Transaction> {
        let keypair = self.keypair()?;
        Ok(Transaction {
            kind,
            amount: 0,
            sender_id: self.address()?.to_string(),
            sender_public_key: keypair.public_key_hex(),
            recipient_id: None,
            asset: Asset::default(),
            timestamp: None,
            signature: None,
            id: None,
            height: None,
        })
    }

    /// Binds `transaction` to this session's keypair for deferred signing.
    pub fn prepare(&self, transaction: Transaction) -> Result<UnsignedTransaction> {
        Ok(UnsignedTransaction::new(transaction, self.keypair()?.clone()))
    }
}
