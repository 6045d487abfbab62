//! Session-scoped relay state shared between the manager and its tasks.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use super::types::{RelayOutcome, RelayPhase};

/// Phase and outcome of the session's single relay slot.
///
/// Only `try_begin` leaves Idle and only `release` returns to it.
#[derive(Debug)]
pub struct SessionContext {
    session_id: String,
    phase_tx: watch::Sender<RelayPhase>,
    outcome_tx: watch::Sender<Option<RelayOutcome>>,
    terminal_narrated: AtomicBool,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        let (phase_tx, _) = watch::channel(RelayPhase::Idle);
        let (outcome_tx, _) = watch::channel(None);
        Self {
            session_id: session_id.into(),
            phase_tx,
            outcome_tx,
            terminal_narrated: AtomicBool::new(false),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn phase(&self) -> RelayPhase {
        *self.phase_tx.borrow()
    }

    pub fn last_outcome(&self) -> Option<RelayOutcome> {
        *self.outcome_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RelayPhase> {
        self.phase_tx.subscribe()
    }

    /// Atomically claim the slot: Idle to Submitted. `false` when busy.
    pub fn try_begin(&self) -> bool {
        let claimed = self.phase_tx.send_if_modified(|phase| {
            if phase.is_idle() {
                *phase = RelayPhase::Submitted;
                true
            } else {
                false
            }
        });
        if claimed {
            self.terminal_narrated.store(false, Ordering::SeqCst);
        }
        claimed
    }

    /// Submitted to Streaming, once response headers have arrived.
    pub fn enter_streaming(&self) -> bool {
        self.phase_tx.send_if_modified(|phase| {
            if *phase == RelayPhase::Submitted {
                *phase = RelayPhase::Streaming;
                true
            } else {
                false
            }
        })
    }

    /// Move to a terminal phase. Only the first call per relay succeeds.
    ///
    /// Callers hold the narration gate so that no progress narration can
    /// interleave with the transition.
    pub(crate) fn enter_terminal(&self, phase: RelayPhase) -> bool {
        debug_assert!(phase.is_terminal());
        if self.terminal_narrated.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.phase_tx.send_replace(phase);
        true
    }

    pub fn terminal_narrated(&self) -> bool {
        self.terminal_narrated.load(Ordering::SeqCst)
    }

    /// Record the outcome and return the slot to Idle.
    pub(crate) fn release(&self, outcome: RelayOutcome) {
        self.outcome_tx.send_replace(Some(outcome));
        self.phase_tx.send_replace(RelayPhase::Idle);
    }

    /// Resolve once the slot is Idle.
    pub async fn wait_idle(&self) {
        let mut rx = self.phase_tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|phase| phase.is_idle()).await;
    }
}
