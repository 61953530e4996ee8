//! Coordination of one outgoing call
//!
//! [`ConnectionCoordinator`] ties the candidate selector to an attempt
//! sequencer for a single call: `process` builds the candidate list and starts
//! the run, `abort` cancels it, and `connect` does both ends for async callers.

use std::sync::Arc;

use tokio::sync::{broadcast, oneshot};
use tracing::debug;

use crate::call::OutgoingCall;
use crate::error::{FailoverError, Result};
use crate::registry::ProviderRegistry;
use crate::selector::CandidateSelector;
use crate::sequencer::{AttemptEvent, AttemptSequencer, RunPhase, RunSnapshot};
use crate::types::ConnectionOutcome;

/// Routes one outgoing call across its candidate providers
///
/// Clones share the same call and run, so one clone can `abort` while another
/// awaits `connect`.
#[derive(Clone)]
pub struct ConnectionCoordinator {
    call: Arc<OutgoingCall>,
    selector: Arc<CandidateSelector>,
    sequencer: AttemptSequencer,
}

impl ConnectionCoordinator {
    pub fn new(
        call: Arc<OutgoingCall>,
        selector: Arc<CandidateSelector>,
        registry: Arc<dyn ProviderRegistry>,
    ) -> Self {
        Self::with_sequencer(call, selector, AttemptSequencer::new(registry))
    }

    /// Use a pre-built sequencer, e.g. one sized from [`FailoverConfig`](crate::config::FailoverConfig)
    pub fn with_sequencer(
        call: Arc<OutgoingCall>,
        selector: Arc<CandidateSelector>,
        sequencer: AttemptSequencer,
    ) -> Self {
        Self {
            call,
            selector,
            sequencer,
        }
    }

    pub fn call(&self) -> &Arc<OutgoingCall> {
        &self.call
    }

    /// Build the candidate list and start trying it
    ///
    /// The outcome is delivered to `sink` exactly once. Fails only if this
    /// coordinator was already processed.
    pub fn process(&self, sink: oneshot::Sender<ConnectionOutcome>) -> Result<()> {
        debug!(call_id = %self.call.id(), address = %self.call.address(), "Processing outgoing call");
        let candidates = self.selector.build_candidates(&self.call);
        self.sequencer.start(self.call.clone(), candidates, sink)
    }

    /// Process the call and wait for its outcome
    pub async fn connect(&self) -> Result<ConnectionOutcome> {
        let (tx, rx) = oneshot::channel();
        self.process(tx)?;
        rx.await.map_err(|_| FailoverError::ResponseDropped)
    }

    pub fn abort(&self) {
        self.sequencer.abort();
    }

    pub fn phase(&self) -> RunPhase {
        self.sequencer.phase()
    }

    pub fn snapshot(&self) -> RunSnapshot {
        self.sequencer.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AttemptEvent> {
        self.sequencer.subscribe()
    }
}
