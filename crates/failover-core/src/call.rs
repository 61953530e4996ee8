//! The outgoing call a coordination run routes
//!
//! The call is owned by the surrounding call management layer and shared with
//! the core as `Arc<OutgoingCall>`. During a run the attempt sequencer is the
//! only writer of the active account and active provider fields.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::provider::ConnectionProvider;
use crate::types::{CallId, ProviderAccount};

pub struct OutgoingCall {
    id: CallId,
    address: String,
    phone_account: RwLock<Option<ProviderAccount>>,
    connection_provider: RwLock<Option<Arc<dyn ConnectionProvider>>>,
}

impl OutgoingCall {
    /// Create a call to `address` with no pre-assigned account
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            id: CallId::new(),
            address: address.into(),
            phone_account: RwLock::new(None),
            connection_provider: RwLock::new(None),
        }
    }

    /// Pre-assign the account chosen upstream (by the user or a policy)
    pub fn with_account(self, account: ProviderAccount) -> Self {
        *self.phone_account.write() = Some(account);
        self
    }

    pub fn id(&self) -> CallId {
        self.id
    }

    /// Destination address, e.g. `tel:+15551234567`
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn phone_account(&self) -> Option<ProviderAccount> {
        self.phone_account.read().clone()
    }

    pub fn set_phone_account(&self, account: ProviderAccount) {
        *self.phone_account.write() = Some(account);
    }

    pub fn connection_provider(&self) -> Option<Arc<dyn ConnectionProvider>> {
        self.connection_provider.read().clone()
    }

    pub fn set_connection_provider(&self, provider: Arc<dyn ConnectionProvider>) {
        *self.connection_provider.write() = Some(provider);
    }

    /// Detach the active provider, returning it if one was set
    pub fn clear_connection_provider(&self) -> Option<Arc<dyn ConnectionProvider>> {
        self.connection_provider.write().take()
    }
}

impl fmt::Debug for OutgoingCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutgoingCall")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("phone_account", &*self.phone_account.read())
            .field(
                "connection_provider",
                &self.connection_provider.read().as_ref().map(|p| p.key().clone()),
            )
            .finish()
    }
}
