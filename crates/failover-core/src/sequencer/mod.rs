//! # Attempt Sequencer
//!
//! Drives one coordination run: candidates are tried one at a time until a
//! provider creates the connection, the candidates run out, or the run is
//! aborted. The caller's response sink receives exactly one
//! [`ConnectionOutcome`].
//!
//! ## Run lifecycle
//!
//! ```text
//!   start ──► advance ──► no sink / no candidate ──► Failed (if sink present)
//!               │  ▲
//!   provider    │  │ unavailable: skip
//!   resolved    ▼  │
//!           Attempting ── Failure ──► record cause, advance
//!               │
//!               ├── Success ──► Succeeded
//!               └── Cancelled ─► Cancelled
//!
//!   abort (any time before a terminal phase) ──► Cancelled
//! ```
//!
//! ## Settling
//!
//! The response sink doubles as the run's cancellation flag. Every path that
//! reports an outcome first takes the sink under the run lock and only then
//! notifies, so a response racing an abort finds the sink gone and only cleans
//! up: a late success makes the sequencer abort the provider that produced it,
//! a late failure or cancellation is dropped.
//!
//! An abort that lands while another thread is driving the loop settles the
//! run right away but leaves the provider abort to the driver. An attempt
//! cancelled before its request went out is never sent; one already sent gets
//! its abort after `create_connection` returns.
//!
//! ## Re-entrancy
//!
//! Advancing is a loop, not recursion. Only one thread drives the loop at a
//! time; a response that arrives while the loop is running (including one
//! completed synchronously inside `create_connection`) is parked and picked up
//! by the driving thread. Provider calls and sink delivery never happen while
//! the run lock is held.

pub mod events;
pub mod state;

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, trace};

use crate::call::OutgoingCall;
use crate::error::{FailoverError, Result};
use crate::provider::{ConnectionProvider, ConnectionResponder, ProviderResponse};
use crate::registry::ProviderRegistry;
use crate::types::{AttemptId, ConnectionOutcome, FailureCause, ProviderAccount};

pub use events::AttemptEvent;
pub use state::{RunPhase, RunSnapshot};

use state::{ParkedResponse, RunState};

/// Default capacity of the attempt event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Sequential failover across an ordered candidate list
///
/// A sequencer serves a single run. Clones share the same run, which lives as
/// long as some clone does; responders held by providers do not keep it alive.
/// Dropping every clone mid-run drops the response sink unanswered.
#[derive(Clone)]
pub struct AttemptSequencer {
    shared: Arc<RunShared>,
}

pub(crate) struct RunShared {
    registry: Arc<dyn ProviderRegistry>,
    state: Mutex<RunState>,
    events: broadcast::Sender<AttemptEvent>,
}

enum Work {
    Advance,
    Respond(ParkedResponse),
}

impl AttemptSequencer {
    pub fn new(registry: Arc<dyn ProviderRegistry>) -> Self {
        Self::with_event_capacity(registry, DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_event_capacity(registry: Arc<dyn ProviderRegistry>, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            shared: Arc::new(RunShared {
                registry,
                state: Mutex::new(RunState::new()),
                events,
            }),
        }
    }

    /// Start trying `candidates` in order for `call`
    ///
    /// Candidates whose provider is unavailable are skipped in the same pass,
    /// so an empty or fully unavailable list reports `Failed` before this
    /// returns. If the run was aborted before it started, `Cancelled` is
    /// delivered and no provider is contacted.
    pub fn start(
        &self,
        call: Arc<OutgoingCall>,
        candidates: Vec<ProviderAccount>,
        sink: oneshot::Sender<ConnectionOutcome>,
    ) -> Result<()> {
        let count = candidates.len();
        {
            let mut state = self.shared.state.lock();
            if state.started {
                return Err(FailoverError::invalid_state("attempt sequencer already started"));
            }
            state.started = true;
            state.call = Some(call.clone());

            if state.phase == RunPhase::Cancelled {
                drop(state);
                debug!(call_id = %call.id(), "Run aborted before start");
                self.shared.deliver(&call, sink, ConnectionOutcome::Cancelled);
                return Ok(());
            }

            state.candidates = candidates.into_iter();
            state.last_error = FailureCause::unspecified();
            state.sink = Some(sink);
            state.driving = true;
        }

        debug!(call_id = %call.id(), candidates = count, "Starting connection attempts");
        self.shared.drive(Work::Advance);
        Ok(())
    }

    /// Stop the run and report `Cancelled`
    ///
    /// Any in-flight provider is asked to abort and detached from the call.
    /// Can be called from any thread, including from inside a provider
    /// callback. Does nothing once the run has settled.
    pub fn abort(&self) {
        self.shared.abort();
    }

    pub fn phase(&self) -> RunPhase {
        self.shared.state.lock().phase
    }

    pub fn snapshot(&self) -> RunSnapshot {
        self.shared.state.lock().snapshot()
    }

    /// Subscribe to attempt progress events
    pub fn subscribe(&self) -> broadcast::Receiver<AttemptEvent> {
        self.shared.events.subscribe()
    }
}

impl RunShared {
    /// Entry point for provider responses, see [`ConnectionResponder`]
    pub(crate) fn handle_response(
        self: &Arc<Self>,
        attempt: AttemptId,
        provider: Arc<dyn ConnectionProvider>,
        response: ProviderResponse,
    ) {
        let parked = ParkedResponse {
            attempt,
            provider,
            response,
        };
        {
            let mut state = self.state.lock();
            if state.driving {
                trace!(attempt = %attempt, "Parking response for the driving loop");
                state.parked.push_back(parked);
                return;
            }
            state.driving = true;
        }
        self.drive(Work::Respond(parked));
    }

    fn drive(self: &Arc<Self>, first: Work) {
        let mut work = first;
        loop {
            let follow_up = match work {
                Work::Advance => {
                    self.advance();
                    None
                }
                Work::Respond(parked) => self.respond(parked),
            };

            work = match follow_up {
                Some(next) => next,
                None => loop {
                    let mut state = self.state.lock();
                    if state.abort_pending {
                        state.abort_pending = false;
                        let call = state.call.clone();
                        drop(state);
                        if let Some(call) = call {
                            self.abort_binding(&call);
                        }
                        continue;
                    }
                    match state.parked.pop_front() {
                        Some(parked) => break Work::Respond(parked),
                        None => {
                            state.driving = false;
                            return;
                        }
                    }
                },
            };
        }
    }

    /// Issue the next attempt, or settle the run as failed when none is left
    fn advance(self: &Arc<Self>) {
        loop {
            let mut state = self.state.lock();
            let Some(call) = state.call.clone() else {
                return;
            };

            let next = if state.sink.is_some() {
                state.candidates.next()
            } else {
                None
            };

            let Some(account) = next else {
                let sink = state.settle(RunPhase::Failed);
                let cause = state.last_error.clone();
                drop(state);

                match sink {
                    Some(sink) => {
                        info!(call_id = %call.id(), cause = %cause, "No more accounts to try, failing");
                        call.clear_connection_provider();
                        self.deliver(&call, sink, ConnectionOutcome::Failed(cause));
                    }
                    None => debug!(call_id = %call.id(), "Run already settled"),
                }
                return;
            };
            drop(state);

            info!(call_id = %call.id(), account = %account, "Trying account");
            let Some(provider) = self.registry.resolve(&account.provider) else {
                info!(call_id = %call.id(), account = %account, "Found no connection provider for account");
                self.state.lock().providers_skipped += 1;
                self.publish(AttemptEvent::ProviderUnavailable {
                    call_id: call.id(),
                    account: account.id.clone(),
                    provider: account.provider.clone(),
                    at: Utc::now(),
                });
                continue;
            };

            let attempt = {
                let mut state = self.state.lock();
                if state.sink.is_none() {
                    // aborted while the provider was being resolved
                    continue;
                }
                call.set_phone_account(account.clone());
                call.set_connection_provider(provider.clone());
                state.begin_attempt()
            };

            info!(
                call_id = %call.id(),
                attempt = %attempt,
                provider = %provider.key(),
                "Attempting to call from provider"
            );
            self.publish(AttemptEvent::AttemptStarted {
                call_id: call.id(),
                attempt,
                account: account.id.clone(),
                provider: provider.key().clone(),
                at: Utc::now(),
            });

            {
                let state = self.state.lock();
                if !state.is_current(attempt) {
                    // aborted before the request went out
                    drop(state);
                    debug!(call_id = %call.id(), attempt = %attempt, "Run aborted, request not sent");
                    call.clear_connection_provider();
                    return;
                }
            }

            let responder = ConnectionResponder::new(attempt, provider.clone(), self);
            provider.create_connection(call, responder);
            return;
        }
    }

    fn respond(self: &Arc<Self>, parked: ParkedResponse) -> Option<Work> {
        let ParkedResponse {
            attempt,
            provider,
            response,
        } = parked;

        let mut state = self.state.lock();
        let call = state.call.clone()?;
        let current = state.is_current(attempt);

        match response {
            ProviderResponse::Success(request) => {
                let sink = if current {
                    state.settle(RunPhase::Succeeded)
                } else {
                    None
                };
                drop(state);

                match sink {
                    Some(sink) => {
                        info!(call_id = %call.id(), attempt = %attempt, provider = %provider.key(), "Connection created");
                        self.deliver(&call, sink, ConnectionOutcome::Success(request));
                    }
                    None => {
                        info!(
                            call_id = %call.id(),
                            attempt = %attempt,
                            provider = %provider.key(),
                            "Connection no longer wanted, aborting provider"
                        );
                        self.publish_stale(&call, attempt, provider.as_ref());
                        provider.abort(&call);
                    }
                }
                None
            }
            ProviderResponse::Failure(cause) => {
                if !current {
                    drop(state);
                    debug!(call_id = %call.id(), attempt = %attempt, cause = %cause, "Ignoring stale failure");
                    self.publish_stale(&call, attempt, provider.as_ref());
                    return None;
                }
                state.current_attempt = None;
                state.last_error = cause.clone();
                drop(state);

                debug!(call_id = %call.id(), attempt = %attempt, cause = %cause, "Connection failed");
                self.publish(AttemptEvent::AttemptFailed {
                    call_id: call.id(),
                    attempt,
                    cause,
                    at: Utc::now(),
                });
                Some(Work::Advance)
            }
            ProviderResponse::Cancelled => {
                let sink = if current {
                    state.settle(RunPhase::Cancelled)
                } else {
                    None
                };
                drop(state);

                match sink {
                    Some(sink) => {
                        info!(call_id = %call.id(), attempt = %attempt, provider = %provider.key(), "Provider cancelled the call");
                        self.deliver(&call, sink, ConnectionOutcome::Cancelled);
                    }
                    None => {
                        debug!(call_id = %call.id(), attempt = %attempt, "Ignoring stale cancellation");
                        self.publish_stale(&call, attempt, provider.as_ref());
                    }
                }
                None
            }
        }
    }

    /// Settle the run as cancelled
    ///
    /// While another thread drives the loop the provider abort is left to the
    /// driver, so it never overtakes a request that is about to be sent.
    fn abort(&self) {
        let (sink, call, driving) = {
            let mut state = self.state.lock();
            if state.phase.is_terminal() {
                debug!("Abort ignored, run already settled");
                return;
            }
            let sink = state.settle(RunPhase::Cancelled);
            state.phase = RunPhase::Cancelled;
            if state.driving {
                state.abort_pending = true;
            }
            (sink, state.call.clone(), state.driving)
        };

        let Some(call) = call else {
            debug!("Run aborted before start");
            return;
        };

        info!(call_id = %call.id(), "Aborting connection attempts");
        if !driving {
            self.abort_binding(&call);
        }
        if let Some(sink) = sink {
            self.deliver(&call, sink, ConnectionOutcome::Cancelled);
        }
    }

    fn abort_binding(&self, call: &OutgoingCall) {
        if let Some(provider) = call.clear_connection_provider() {
            debug!(call_id = %call.id(), provider = %provider.key(), "Aborting in-flight provider");
            provider.abort(call);
        }
    }

    fn deliver(
        &self,
        call: &OutgoingCall,
        sink: oneshot::Sender<ConnectionOutcome>,
        outcome: ConnectionOutcome,
    ) {
        let phase = match &outcome {
            ConnectionOutcome::Success(_) => RunPhase::Succeeded,
            ConnectionOutcome::Failed(_) => RunPhase::Failed,
            ConnectionOutcome::Cancelled => RunPhase::Cancelled,
        };
        if sink.send(outcome).is_err() {
            debug!(call_id = %call.id(), "Response sink closed before the outcome was delivered");
        }
        self.publish(AttemptEvent::Finished {
            call_id: call.id(),
            phase,
            at: Utc::now(),
        });
    }

    fn publish_stale(&self, call: &OutgoingCall, attempt: AttemptId, provider: &dyn ConnectionProvider) {
        self.publish(AttemptEvent::StaleResponse {
            call_id: call.id(),
            attempt,
            provider: provider.key().clone(),
            at: Utc::now(),
        });
    }

    fn publish(&self, event: AttemptEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}
