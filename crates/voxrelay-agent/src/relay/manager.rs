//! Single-flight relay manager for one voice session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use voxrelay_core::RelayConfig;
use voxrelay_core::phrases;

use super::narrator::Narrator;
use super::session::SessionContext;
use super::task::RelayTask;
use super::types::{RelayOutcome, RelayPhase, RelayRequest, SubmitOutcome};
use crate::gateway::{GatewayClient, GatewayError};
use crate::narration::NarrationSink;
use crate::summarize::Summarizer;

/// Accepts deep-reasoning questions from the live conversation and relays
/// them upstream in the background, one at a time.
pub struct RelayManager<S> {
    ctx: Arc<SessionContext>,
    narrator: Arc<Narrator<S>>,
    client: GatewayClient,
    summarizer: Option<Summarizer>,
    timeout: Duration,
    heartbeat_interval: Option<Duration>,
}

impl<S> std::fmt::Debug for RelayManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayManager")
            .field("session_id", &self.ctx.session_id())
            .field("phase", &self.ctx.phase())
            .field("summarizer", &self.summarizer.is_some())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<S: NarrationSink> RelayManager<S> {
    /// Build a manager for `session_id` narrating through `sink`.
    pub fn new(
        session_id: impl Into<String>,
        config: &RelayConfig,
        sink: S,
    ) -> Result<Self, GatewayError> {
        let client = GatewayClient::from_gateway_config(&config.gateway)?;
        let summarizer = Summarizer::from_config(&config.summarizer)?;
        Ok(Self {
            ctx: Arc::new(SessionContext::new(session_id)),
            narrator: Arc::new(Narrator::new(sink)),
            client,
            summarizer,
            timeout: config.gateway.timeout(),
            heartbeat_interval: config.narration.heartbeat_interval(),
        })
    }

    /// Start relaying `query` unless another relay is in flight.
    ///
    /// Never waits on the upstream. Must be called from within a Tokio
    /// runtime.
    pub fn submit(&self, query: &str) -> SubmitOutcome {
        if !self.ctx.try_begin() {
            info!(
                session_id = self.ctx.session_id(),
                phase = self.ctx.phase().as_str(),
                "Relay busy, rejecting submit"
            );
            return SubmitOutcome::Busy {
                message: phrases::BUSY,
            };
        }

        let request = RelayRequest::new(query);
        let request_id = request.id;
        info!(
            %request_id,
            session_id = self.ctx.session_id(),
            query_chars = query.chars().count(),
            "Relay submitted"
        );

        let task = RelayTask {
            ctx: self.ctx.clone(),
            narrator: self.narrator.clone(),
            client: self.client.clone(),
            summarizer: self.summarizer.clone(),
            timeout: self.timeout,
            heartbeat_interval: self.heartbeat_interval,
            request,
        };
        let handle = tokio::spawn(task.run());
        tokio::spawn(supervise(
            self.ctx.clone(),
            self.narrator.clone(),
            request_id,
            handle,
        ));

        SubmitOutcome::Accepted {
            request_id,
            acknowledgement: phrases::ACKNOWLEDGEMENT,
        }
    }

    pub fn session_id(&self) -> &str {
        self.ctx.session_id()
    }

    pub fn phase(&self) -> RelayPhase {
        self.ctx.phase()
    }

    pub fn is_busy(&self) -> bool {
        self.ctx.phase().is_busy()
    }

    /// Outcome of the most recently finished relay.
    pub fn last_outcome(&self) -> Option<RelayOutcome> {
        self.ctx.last_outcome()
    }

    /// Watch phase transitions.
    pub fn subscribe_phase(&self) -> watch::Receiver<RelayPhase> {
        self.ctx.subscribe()
    }

    /// Resolve once no relay is in flight.
    pub async fn wait_idle(&self) {
        self.ctx.wait_idle().await;
    }
}

/// Await the relay task and release the slot on every exit path.
async fn supervise<S: NarrationSink>(
    ctx: Arc<SessionContext>,
    narrator: Arc<Narrator<S>>,
    request_id: Uuid,
    handle: JoinHandle<RelayOutcome>,
) {
    let outcome = match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(%request_id, error = %e, "Relay task aborted");
            let outcome = RelayOutcome::Fault;
            if let Some(announcement) = outcome.failure_announcement() {
                if !ctx.terminal_narrated() {
                    narrator
                        .terminal(&ctx, outcome.phase(), &announcement.text)
                        .await;
                }
            }
            outcome
        }
    };
    ctx.release(outcome);
    info!(%request_id, session_id = ctx.session_id(), "Relay slot released");
}
