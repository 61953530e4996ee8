//! # Candidate Selection
//!
//! Builds the ordered list of provider accounts a coordination run will try.
//!
//! ```text
//!            OutgoingCall
//!                 │
//!     ┌───────────▼────────────┐    yes   ┌──────────────────────────────┐
//!     │ emergency destination? ├─────────►│ enabled telephony accounts,  │
//!     └───────────┬────────────┘          │ in registry order            │
//!                 │ no                    └──────────────────────────────┘
//!     ┌───────────▼────────────┐
//!     │ pre-assigned account?  ├── yes ──► [account]
//!     └───────────┬────────────┘
//!                 │ no
//!                 ▼
//!                 []
//! ```
//!
//! An emergency call never uses the account picked upstream: it is routed only
//! through plain telephony providers. An empty list is a valid result; the
//! sequencer reports it as immediate exhaustion.

pub mod emergency;

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::call::OutgoingCall;
use crate::registry::AccountRegistry;
use crate::types::{ProviderAccount, ProviderKey};

pub use emergency::{normalize_address, EmergencyNumberPolicy, EmergencyNumbers};

/// Builds candidate lists for outgoing calls
pub struct CandidateSelector {
    accounts: Arc<dyn AccountRegistry>,
    emergency: Arc<dyn EmergencyNumberPolicy>,
    telephony_providers: BTreeSet<ProviderKey>,
}

impl CandidateSelector {
    pub fn new(
        accounts: Arc<dyn AccountRegistry>,
        emergency: Arc<dyn EmergencyNumberPolicy>,
        telephony_providers: impl IntoIterator<Item = ProviderKey>,
    ) -> Self {
        Self {
            accounts,
            emergency,
            telephony_providers: telephony_providers.into_iter().collect(),
        }
    }

    /// Whether accounts of `provider` belong to the plain telephony class
    pub fn is_telephony_provider(&self, provider: &ProviderKey) -> bool {
        self.telephony_providers.contains(provider)
    }

    /// Ordered candidates for `call`
    pub fn build_candidates(&self, call: &OutgoingCall) -> Vec<ProviderAccount> {
        if self.emergency.is_emergency_number(call.address()) {
            info!(call_id = %call.id(), "Emergency number detected");
            return self.emergency_candidates(call);
        }

        let candidates: Vec<ProviderAccount> = call.phone_account().into_iter().collect();
        debug!(call_id = %call.id(), count = candidates.len(), "Built candidate list");
        candidates
    }

    fn emergency_candidates(&self, call: &OutgoingCall) -> Vec<ProviderAccount> {
        self.accounts
            .enabled_accounts()
            .into_iter()
            .filter(|account| self.is_telephony_provider(&account.provider))
            .inspect(|account| {
                info!(call_id = %call.id(), %account, "Will try telephony account for emergency");
            })
            .collect()
    }
}
