//! One background relay: upstream request, progress narration, outcome.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use voxrelay_core::progress::{Announcement, AnnouncementSource, ProgressExtractor};

use super::heartbeat::Heartbeat;
use super::narrator::Narrator;
use super::session::SessionContext;
use super::types::{RelayOutcome, RelayPhase, RelayRequest};
use crate::gateway::{GatewayClient, GatewayError, UpstreamReply};
use crate::narration::NarrationSink;
use crate::summarize::Summarizer;

/// Everything a relay needs, moved into its spawned task.
pub struct RelayTask<S> {
    pub ctx: Arc<SessionContext>,
    pub narrator: Arc<Narrator<S>>,
    pub client: GatewayClient,
    pub summarizer: Option<Summarizer>,
    pub timeout: Duration,
    pub heartbeat_interval: Option<Duration>,
    pub request: RelayRequest,
}

impl<S: NarrationSink> RelayTask<S> {
    /// Run to completion. Always delivers exactly one terminal narration.
    pub async fn run(self) -> RelayOutcome {
        let started = Instant::now();
        // Owned here so it is cancelled before the terminal narration, or
        // when this future is dropped.
        let heartbeat = self
            .heartbeat_interval
            .map(|interval| Heartbeat::spawn(self.ctx.clone(), self.narrator.clone(), interval));
        let outcome = match tokio::time::timeout(self.timeout, self.relay()).await {
            Ok(Ok(closing)) => self.deliver(closing, heartbeat).await,
            Ok(Err(e)) => self.fail(RelayOutcome::from(&e), &e, heartbeat).await,
            Err(_) => {
                self.fail(RelayOutcome::TimedOut, &GatewayError::Timeout, heartbeat)
                    .await
            }
        };
        info!(
            request_id = %self.request.id,
            session_id = self.ctx.session_id(),
            ?outcome,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Relay finished"
        );
        outcome
    }

    /// Drive the upstream reply through the extractor and return the
    /// closing announcement.
    async fn relay(&self) -> Result<Announcement, GatewayError> {
        debug!(request_id = %self.request.id, "Opening upstream request");
        let reply = self.client.stream_chat(&self.request.query).await?;
        self.ctx.enter_streaming();

        let mut extractor = ProgressExtractor::new();
        match reply {
            UpstreamReply::Complete(text) => extractor.absorb_text(&text),
            UpstreamReply::Stream(mut events) => {
                while let Some(event) = events.next().await {
                    for announcement in extractor.observe(&event?) {
                        debug!(
                            request_id = %self.request.id,
                            source = announcement.source.as_str(),
                            text = %announcement.text,
                            "Progress"
                        );
                        self.narrator.progress(&self.ctx, &announcement.text).await;
                    }
                }
            }
        }

        debug!(
            request_id = %self.request.id,
            tools = extractor.state().spoken_tools.len(),
            chars = extractor.state().accumulated_text.chars().count(),
            "Upstream reply complete"
        );
        Ok(extractor.finish())
    }

    async fn deliver(
        &self,
        closing: Announcement,
        heartbeat: Option<Heartbeat>,
    ) -> RelayOutcome {
        let outcome = match closing.source {
            AnnouncementSource::Final => RelayOutcome::Answered,
            _ => RelayOutcome::Empty,
        };
        let text = match &self.summarizer {
            Some(summarizer)
                if outcome == RelayOutcome::Answered
                    && summarizer.needs_condensing(&closing.text) =>
            {
                summarizer.condense(&closing.text).await
            }
            _ => closing.text,
        };
        self.conclude(outcome.phase(), &text, heartbeat).await;
        outcome
    }

    async fn fail(
        &self,
        outcome: RelayOutcome,
        error: &GatewayError,
        heartbeat: Option<Heartbeat>,
    ) -> RelayOutcome {
        warn!(
            request_id = %self.request.id,
            session_id = self.ctx.session_id(),
            error = %error,
            "Relay failed"
        );
        if let Some(announcement) = outcome.failure_announcement() {
            debug!(
                request_id = %self.request.id,
                source = announcement.source.as_str(),
                "Narrating failure"
            );
            self.conclude(outcome.phase(), &announcement.text, heartbeat)
                .await;
        }
        outcome
    }

    /// Silence the heartbeat, then speak the one terminal narration.
    async fn conclude(&self, phase: RelayPhase, text: &str, heartbeat: Option<Heartbeat>) {
        if let Some(heartbeat) = heartbeat {
            heartbeat.stop().await;
        }
        self.narrator.terminal(&self.ctx, phase, text).await;
    }
}
