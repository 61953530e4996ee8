//! Shared test helpers: a scriptable connection provider and registry setup

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use rvoip_failover_core::{
    AccountDirectory, AccountId, CandidateSelector, ConnectionProvider, ConnectionRequest,
    ConnectionResponder, FailoverConfig, FailureCause, OutgoingCall, ProviderAccount,
    ProviderDirectory, ProviderKey,
};

/// How a mock provider answers `create_connection`
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Succeed from inside `create_connection`
    SucceedNow,
    /// Fail from inside `create_connection`
    FailNow(FailureCause),
    /// Cancel from inside `create_connection`
    CancelNow,
    /// Keep the responder; the test completes it through `take_held`
    Hold,
    /// Succeed from a spawned tokio task
    SucceedLater,
    /// Fail from a spawned tokio task
    FailLater(FailureCause),
    /// Drop the responder without answering
    DropResponder,
}

pub struct MockProvider {
    key: ProviderKey,
    behavior: Mutex<Behavior>,
    create_calls: AtomicUsize,
    abort_calls: AtomicUsize,
    attempted_accounts: Mutex<Vec<Option<AccountId>>>,
    held: Mutex<Vec<ConnectionResponder>>,
}

impl MockProvider {
    pub fn new(key: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            key: ProviderKey::new(key),
            behavior: Mutex::new(behavior),
            create_calls: AtomicUsize::new(0),
            abort_calls: AtomicUsize::new(0),
            attempted_accounts: Mutex::new(Vec::new()),
            held: Mutex::new(Vec::new()),
        })
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock() = behavior;
    }

    pub fn create_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn abort_count(&self) -> usize {
        self.abort_calls.load(Ordering::SeqCst)
    }

    /// Account ids the call carried each time this provider was asked to connect
    pub fn attempted_accounts(&self) -> Vec<String> {
        self.attempted_accounts
            .lock()
            .iter()
            .map(|id| id.as_ref().map(|id| id.0.clone()).unwrap_or_default())
            .collect()
    }

    pub fn take_held(&self) -> Option<ConnectionResponder> {
        self.held.lock().pop()
    }

    pub fn request_for(&self, call: &OutgoingCall) -> ConnectionRequest {
        ConnectionRequest::new(call.id(), call.phone_account().map(|a| a.id), call.address())
            .with_extra("provider", self.key.as_str())
    }
}

impl ConnectionProvider for MockProvider {
    fn key(&self) -> &ProviderKey {
        &self.key
    }

    fn create_connection(&self, call: Arc<OutgoingCall>, responder: ConnectionResponder) {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.attempted_accounts
            .lock()
            .push(call.phone_account().map(|a| a.id));

        let behavior = self.behavior.lock().clone();
        match behavior {
            Behavior::SucceedNow => responder.succeeded(self.request_for(&call)),
            Behavior::FailNow(cause) => responder.failed(cause),
            Behavior::CancelNow => responder.cancelled(),
            Behavior::Hold => self.held.lock().push(responder),
            Behavior::SucceedLater => {
                let request = self.request_for(&call);
                tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    responder.succeeded(request);
                });
            }
            Behavior::FailLater(cause) => {
                tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    responder.failed(cause);
                });
            }
            Behavior::DropResponder => drop(responder),
        }
    }

    fn abort(&self, _call: &OutgoingCall) {
        self.abort_calls.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn directory_with(providers: &[Arc<MockProvider>]) -> Arc<ProviderDirectory> {
    let directory = Arc::new(ProviderDirectory::new());
    for provider in providers {
        directory.register(provider.clone());
    }
    directory
}

pub fn accounts_with(accounts: &[ProviderAccount]) -> Arc<AccountDirectory> {
    let directory = Arc::new(AccountDirectory::new());
    for account in accounts {
        directory.add_account(account.clone());
    }
    directory
}

pub fn default_selector(accounts: Arc<AccountDirectory>) -> Arc<CandidateSelector> {
    Arc::new(FailoverConfig::default().selector(accounts))
}

pub fn busy() -> FailureCause {
    FailureCause::new(17, "busy")
}

pub fn congested() -> FailureCause {
    FailureCause::new(34, "no circuit available")
}
