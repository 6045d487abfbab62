//! Phase-gated narration.

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::session::SessionContext;
use super::types::RelayPhase;
use crate::narration::NarrationSink;

/// Serializes every narration of a session behind one gate.
///
/// Progress is spoken only while the relay streams. The terminal
/// transition and its narration happen under the same gate, so nothing
/// progress-like can follow the terminal phrase.
#[derive(Debug)]
pub struct Narrator<S> {
    sink: S,
    gate: Mutex<()>,
}

impl<S: NarrationSink> Narrator<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            gate: Mutex::new(()),
        }
    }

    /// Speak a progress line if the session is still streaming. Returns
    /// `false` when the phase check suppressed it.
    pub async fn progress(&self, ctx: &SessionContext, text: &str) -> bool {
        let _guard = self.gate.lock().await;
        if !ctx.phase().is_streaming() {
            debug!(session_id = ctx.session_id(), text, "Progress suppressed");
            return false;
        }
        self.say(ctx, text).await;
        true
    }

    /// Enter `phase` and speak `text`, unless a terminal narration already
    /// happened for this relay.
    pub async fn terminal(&self, ctx: &SessionContext, phase: RelayPhase, text: &str) -> bool {
        let _guard = self.gate.lock().await;
        if !ctx.enter_terminal(phase) {
            warn!(
                session_id = ctx.session_id(),
                phase = phase.as_str(),
                "Terminal narration already delivered"
            );
            return false;
        }
        self.say(ctx, text).await;
        true
    }

    async fn say(&self, ctx: &SessionContext, text: &str) {
        if let Err(e) = self.sink.speak(text).await {
            warn!(session_id = ctx.session_id(), error = %e, "Narration hand-off failed");
        }
    }
}
