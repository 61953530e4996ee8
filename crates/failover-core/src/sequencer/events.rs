//! Attempt progress events
//!
//! Published on a broadcast channel for observers such as call logs or
//! diagnostics. Delivery is best effort: a run never waits for subscribers and
//! lagging subscribers miss events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::RunPhase;
use crate::types::{AccountId, AttemptId, CallId, FailureCause, ProviderKey};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AttemptEvent {
    /// No provider is registered for the candidate's key; the candidate was skipped
    ProviderUnavailable {
        call_id: CallId,
        account: AccountId,
        provider: ProviderKey,
        at: DateTime<Utc>,
    },
    /// A create-connection request was issued
    AttemptStarted {
        call_id: CallId,
        attempt: AttemptId,
        account: AccountId,
        provider: ProviderKey,
        at: DateTime<Utc>,
    },
    /// The current attempt failed; the run moves to the next candidate
    AttemptFailed {
        call_id: CallId,
        attempt: AttemptId,
        cause: FailureCause,
        at: DateTime<Utc>,
    },
    /// A response arrived for an attempt that is no longer current
    StaleResponse {
        call_id: CallId,
        attempt: AttemptId,
        provider: ProviderKey,
        at: DateTime<Utc>,
    },
    /// The run reached a terminal phase and delivered its outcome
    Finished {
        call_id: CallId,
        phase: RunPhase,
        at: DateTime<Utc>,
    },
}

impl AttemptEvent {
    pub fn call_id(&self) -> CallId {
        match self {
            AttemptEvent::ProviderUnavailable { call_id, .. }
            | AttemptEvent::AttemptStarted { call_id, .. }
            | AttemptEvent::AttemptFailed { call_id, .. }
            | AttemptEvent::StaleResponse { call_id, .. }
            | AttemptEvent::Finished { call_id, .. } => *call_id,
        }
    }
}
