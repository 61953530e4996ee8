//! # RVoIP Failover Core
//!
//! Failover connection establishment for outgoing calls. Given a call and an
//! ordered list of candidate provider accounts, the core tries each candidate's
//! connection provider in turn until one creates the connection, every
//! candidate is exhausted, or the attempt is aborted. The terminal outcome is
//! reported exactly once.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐   build_candidates   ┌─────────────────────┐
//! │ ConnectionCoordinator├─────────────────────►│ CandidateSelector   │
//! │  process / abort     │                      │ (emergency override)│
//! └──────────┬───────────┘                      └─────────────────────┘
//!            │ start(call, candidates, sink)
//! ┌──────────▼───────────┐  resolve(key)   ┌────────────────────┐
//! │ AttemptSequencer     ├────────────────►│ ProviderRegistry   │
//! │  one attempt at a    │                 └────────────────────┘
//! │  time, AttemptId     │ create_connection ┌───────────────────┐
//! │  correlated          ├──────────────────►│ConnectionProvider │
//! └──────────┬───────────┘◄──ConnectionResponder──────────────────┘
//!            │ exactly one ConnectionOutcome
//!            ▼
//!      oneshot sink
//! ```
//!
//! - [`selector`]: builds the candidate list; emergency destinations are routed
//!   only through enabled plain telephony accounts
//! - [`sequencer`]: the sequential attempt state machine
//! - [`coordinator`]: ties both together for one call
//! - [`provider`] / [`registry`]: collaborator traits and in-memory registries
//! - [`config`] / [`logging`]: configuration loading and subscriber setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rvoip_failover_core::{
//!     AccountDirectory, ConnectionCoordinator, FailoverConfig, OutgoingCall, ProviderAccount,
//!     ProviderDirectory,
//! };
//!
//! # async fn example() -> rvoip_failover_core::Result<()> {
//! let config = FailoverConfig::default();
//! let accounts = Arc::new(AccountDirectory::new());
//! let providers = Arc::new(ProviderDirectory::new());
//! // providers.register(Arc::new(MyProvider::new()));
//!
//! let selector = Arc::new(config.selector(accounts));
//! let call = Arc::new(
//!     OutgoingCall::new("tel:+15551234567").with_account(ProviderAccount::new("sim1", "telephony")),
//! );
//!
//! let coordinator = ConnectionCoordinator::new(call, selector, providers);
//! let outcome = coordinator.connect().await?;
//! println!("outcome: {:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod call;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod provider;
pub mod registry;
pub mod selector;
pub mod sequencer;
pub mod types;

pub use call::OutgoingCall;
pub use config::FailoverConfig;
pub use coordinator::ConnectionCoordinator;
pub use error::{FailoverError, Result};
pub use provider::{ConnectionProvider, ConnectionResponder, ProviderResponse};
pub use registry::{AccountDirectory, AccountRegistry, ProviderDirectory, ProviderRegistry};
pub use selector::{CandidateSelector, EmergencyNumberPolicy, EmergencyNumbers};
pub use sequencer::{AttemptEvent, AttemptSequencer, RunPhase, RunSnapshot};
pub use types::*;
