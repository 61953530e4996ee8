//! Core types for the failover core
//!
//! Identifiers, provider accounts, failure causes and the terminal outcome of a
//! coordination run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Failure code used when no provider ever reported a more specific cause
pub const ERROR_UNSPECIFIED: i32 = 36;

/// Unique identifier for an outgoing call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a provider account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key selecting the connection provider that serves an account
///
/// Accounts of the same provider share a key; the registry resolves a key to a
/// live provider binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderKey(pub String);

impl ProviderKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Correlation token for a single create-connection attempt within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttemptId(pub u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An account that can place calls through a connection provider
///
/// Accounts are candidates of a coordination run; they are never mutated once
/// the candidate list is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderAccount {
    /// Account identifier
    pub id: AccountId,
    /// Provider serving this account
    pub provider: ProviderKey,
    /// Human readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ProviderAccount {
    pub fn new(id: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: AccountId::new(id),
            provider: ProviderKey::new(provider),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Display for ProviderAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.provider)
    }
}

/// Code and message describing why a connection could not be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCause {
    pub code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FailureCause {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    /// The sentinel reported when a run ends without any provider failure
    pub fn unspecified() -> Self {
        Self {
            code: ERROR_UNSPECIFIED,
            message: None,
        }
    }

    pub fn is_unspecified(&self) -> bool {
        self.code == ERROR_UNSPECIFIED && self.message.is_none()
    }
}

impl Default for FailureCause {
    fn default() -> Self {
        Self::unspecified()
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{} ({})", self.code, message),
            None => write!(f, "{}", self.code),
        }
    }
}

/// Data returned by a provider that created a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub call_id: CallId,
    pub account: Option<AccountId>,
    /// Destination address the connection was created for
    pub address: String,
    #[serde(default)]
    pub extras: HashMap<String, String>,
}

impl ConnectionRequest {
    pub fn new(call_id: CallId, account: Option<AccountId>, address: impl Into<String>) -> Self {
        Self {
            call_id,
            account,
            address: address.into(),
            extras: HashMap::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }
}

/// Terminal outcome of a coordination run, delivered exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionOutcome {
    /// A provider created the connection
    Success(ConnectionRequest),
    /// Every candidate was exhausted
    Failed(FailureCause),
    /// The run was aborted or a provider cancelled it
    Cancelled,
}

impl ConnectionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ConnectionOutcome::Success(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ConnectionOutcome::Failed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConnectionOutcome::Cancelled)
    }
}
