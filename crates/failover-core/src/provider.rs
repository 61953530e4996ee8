//! Connection provider binding and its per-attempt responder
//!
//! A [`ConnectionProvider`] is a live binding to the service that actually
//! creates connections for one provider key. The attempt sequencer hands each
//! provider a [`ConnectionResponder`] for exactly one create-connection attempt.
//! The responder's completion methods consume it, so a provider can report at
//! most one of success, failure or cancellation per attempt.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::call::OutgoingCall;
use crate::sequencer::RunShared;
use crate::types::{AttemptId, ConnectionRequest, FailureCause, ProviderKey, ERROR_UNSPECIFIED};

/// Binding to a service able to create connections for outgoing calls
pub trait ConnectionProvider: Send + Sync {
    /// Key this provider is registered under
    fn key(&self) -> &ProviderKey;

    /// Begin creating a connection for `call`
    ///
    /// Must not block. The provider completes the attempt later through
    /// `responder`, either from inside this call or from any other thread or task.
    fn create_connection(&self, call: Arc<OutgoingCall>, responder: ConnectionResponder);

    /// Ask the provider to abandon any connection it is creating for `call`
    ///
    /// Best effort and idempotent.
    fn abort(&self, call: &OutgoingCall);
}

/// What a provider reported for one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderResponse {
    Success(ConnectionRequest),
    Failure(FailureCause),
    Cancelled,
}

/// Response handler scoped to a single create-connection attempt
///
/// Dropping a responder without completing it counts as a provider failure.
/// The responder does not keep its run alive: a provider may hold on to it
/// after the run is gone, and completing it then does nothing.
pub struct ConnectionResponder {
    attempt: AttemptId,
    provider: Arc<dyn ConnectionProvider>,
    run: Option<Weak<RunShared>>,
}

impl ConnectionResponder {
    pub(crate) fn new(
        attempt: AttemptId,
        provider: Arc<dyn ConnectionProvider>,
        run: &Arc<RunShared>,
    ) -> Self {
        Self {
            attempt,
            provider,
            run: Some(Arc::downgrade(run)),
        }
    }

    /// Attempt this responder belongs to
    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    /// Report that the connection was created
    pub fn succeeded(mut self, request: ConnectionRequest) {
        self.complete(ProviderResponse::Success(request));
    }

    /// Report that the connection could not be created
    pub fn failed(mut self, cause: FailureCause) {
        self.complete(ProviderResponse::Failure(cause));
    }

    /// Report that the provider cancelled the call
    pub fn cancelled(mut self) {
        self.complete(ProviderResponse::Cancelled);
    }

    fn complete(&mut self, response: ProviderResponse) {
        let Some(run) = self.run.take() else {
            return;
        };
        match run.upgrade() {
            Some(run) => run.handle_response(self.attempt, self.provider.clone(), response),
            None => tracing::debug!(
                attempt = %self.attempt,
                provider = %self.provider.key(),
                "Run is gone, dropping response"
            ),
        }
    }
}

impl Drop for ConnectionResponder {
    fn drop(&mut self) {
        if self.run.is_some() {
            tracing::warn!(
                attempt = %self.attempt,
                provider = %self.provider.key(),
                "Connection responder dropped without a response"
            );
            self.complete(ProviderResponse::Failure(FailureCause::new(
                ERROR_UNSPECIFIED,
                "connection provider dropped the request",
            )));
        }
    }
}

impl fmt::Debug for ConnectionResponder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionResponder")
            .field("attempt", &self.attempt)
            .field("provider", self.provider.key())
            .field("completed", &self.run.is_none())
            .finish()
    }
}
