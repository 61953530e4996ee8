//! Provider and account registries
//!
//! The core consumes two lookups: resolving a provider key to a live
//! [`ConnectionProvider`], and listing the enabled accounts in registry order.
//! Both are traits so the surrounding system can back them with its own
//! registries; the in-memory directories here serve simple deployments and tests.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::provider::ConnectionProvider;
use crate::types::{AccountId, ProviderAccount, ProviderKey};

/// Resolves provider keys to live provider bindings
///
/// Lookups must be side-effect free and fast. `None` means the provider is
/// currently unavailable, which is a normal outcome.
pub trait ProviderRegistry: Send + Sync {
    fn resolve(&self, key: &ProviderKey) -> Option<Arc<dyn ConnectionProvider>>;
}

/// Lists the accounts that are currently enabled, in registry order
pub trait AccountRegistry: Send + Sync {
    fn enabled_accounts(&self) -> Vec<ProviderAccount>;
}

/// In-memory provider registry
#[derive(Default)]
pub struct ProviderDirectory {
    providers: DashMap<ProviderKey, Arc<dyn ConnectionProvider>>,
}

impl ProviderDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own key, replacing any previous binding
    pub fn register(&self, provider: Arc<dyn ConnectionProvider>) {
        let key = provider.key().clone();
        debug!(provider = %key, "Registered connection provider");
        self.providers.insert(key, provider);
    }

    pub fn unregister(&self, key: &ProviderKey) -> Option<Arc<dyn ConnectionProvider>> {
        self.providers.remove(key).map(|(_, provider)| provider)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl ProviderRegistry for ProviderDirectory {
    fn resolve(&self, key: &ProviderKey) -> Option<Arc<dyn ConnectionProvider>> {
        self.providers.get(key).map(|entry| entry.value().clone())
    }
}

#[derive(Debug, Clone)]
struct AccountEntry {
    account: ProviderAccount,
    enabled: bool,
}

/// In-memory account registry that preserves insertion order
#[derive(Debug, Default)]
pub struct AccountDirectory {
    accounts: RwLock<Vec<AccountEntry>>,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an enabled account
    ///
    /// Re-adding an existing account id replaces it in place and keeps its
    /// position in the enumeration order.
    pub fn add_account(&self, account: ProviderAccount) {
        let mut accounts = self.accounts.write();
        match accounts.iter_mut().find(|e| e.account.id == account.id) {
            Some(entry) => {
                entry.account = account;
                entry.enabled = true;
            }
            None => accounts.push(AccountEntry {
                account,
                enabled: true,
            }),
        }
    }

    /// Enable or disable an account, returning false if it is unknown
    pub fn set_enabled(&self, id: &AccountId, enabled: bool) -> bool {
        let mut accounts = self.accounts.write();
        match accounts.iter_mut().find(|e| &e.account.id == id) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn remove_account(&self, id: &AccountId) -> Option<ProviderAccount> {
        let mut accounts = self.accounts.write();
        let index = accounts.iter().position(|e| &e.account.id == id)?;
        Some(accounts.remove(index).account)
    }

    /// All accounts, enabled or not, in registry order
    pub fn all_accounts(&self) -> Vec<ProviderAccount> {
        self.accounts.read().iter().map(|e| e.account.clone()).collect()
    }
}

impl AccountRegistry for AccountDirectory {
    fn enabled_accounts(&self) -> Vec<ProviderAccount> {
        self.accounts
            .read()
            .iter()
            .filter(|e| e.enabled)
            .map(|e| e.account.clone())
            .collect()
    }
}
