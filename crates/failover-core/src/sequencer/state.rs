//! Run phases and the sequencer's mutable run state

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::call::OutgoingCall;
use crate::provider::{ConnectionProvider, ProviderResponse};
use crate::types::{AttemptId, ConnectionOutcome, FailureCause, ProviderAccount};

/// Phase of a coordination run
///
/// `Idle -> Attempting -> {Succeeded, Failed, Cancelled}`. A run can also go
/// straight from `Idle` to `Failed` (no usable candidate) or `Cancelled`
/// (aborted before any attempt). Terminal phases never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunPhase {
    Idle,
    Attempting,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Succeeded | RunPhase::Failed | RunPhase::Cancelled)
    }
}

/// Point-in-time view of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub phase: RunPhase,
    /// Attempt whose response the run is waiting for
    pub current_attempt: Option<AttemptId>,
    pub attempts_issued: u32,
    /// Candidates skipped because their provider was unavailable
    pub providers_skipped: u32,
    pub last_error: FailureCause,
}

/// A provider response waiting for the driving loop
pub(crate) struct ParkedResponse {
    pub attempt: AttemptId,
    pub provider: Arc<dyn ConnectionProvider>,
    pub response: ProviderResponse,
}

pub(crate) struct RunState {
    pub phase: RunPhase,
    pub started: bool,
    pub call: Option<Arc<OutgoingCall>>,
    pub candidates: std::vec::IntoIter<ProviderAccount>,
    /// Caller's response sink. Empty once the run is settled; taking it is the
    /// only way an outcome gets delivered.
    pub sink: Option<oneshot::Sender<ConnectionOutcome>>,
    pub last_error: FailureCause,
    pub next_attempt: u64,
    pub current_attempt: Option<AttemptId>,
    pub attempts_issued: u32,
    pub providers_skipped: u32,
    /// Set while some thread runs the advance loop
    pub driving: bool,
    pub parked: VecDeque<ParkedResponse>,
    /// Abort arrived while the loop was running; the driver aborts the bound
    /// provider once its current step is done
    pub abort_pending: bool,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Idle,
            started: false,
            call: None,
            candidates: Vec::new().into_iter(),
            sink: None,
            last_error: FailureCause::unspecified(),
            next_attempt: 1,
            current_attempt: None,
            attempts_issued: 0,
            providers_skipped: 0,
            driving: false,
            parked: VecDeque::new(),
            abort_pending: false,
        }
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            phase: self.phase,
            current_attempt: self.current_attempt,
            attempts_issued: self.attempts_issued,
            providers_skipped: self.providers_skipped,
            last_error: self.last_error.clone(),
        }
    }

    /// Allocate the correlation token for a new attempt and make it current
    pub fn begin_attempt(&mut self) -> AttemptId {
        let attempt = AttemptId(self.next_attempt);
        self.next_attempt += 1;
        self.current_attempt = Some(attempt);
        self.attempts_issued += 1;
        self.phase = RunPhase::Attempting;
        attempt
    }

    pub fn is_current(&self, attempt: AttemptId) -> bool {
        self.current_attempt == Some(attempt)
    }

    /// Take the sink and move to a terminal phase
    ///
    /// Returns `None` if the run was already settled.
    pub fn settle(&mut self, phase: RunPhase) -> Option<oneshot::Sender<ConnectionOutcome>> {
        self.current_attempt = None;
        let sink = self.sink.take()?;
        self.phase = phase;
        Some(sink)
    }
}
