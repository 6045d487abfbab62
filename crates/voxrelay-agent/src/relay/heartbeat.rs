//! Filler narration while a relay streams.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use voxrelay_core::phrases::heartbeat_filler;

use super::narrator::Narrator;
use super::session::SessionContext;
use super::types::RelayPhase;
use crate::narration::NarrationSink;

/// A running heartbeat owned by one relay. Dropping it cancels the task.
#[derive(Debug)]
#[must_use = "dropping a heartbeat cancels it"]
pub struct Heartbeat {
    handle: JoinHandle<()>,
}

impl Heartbeat {
    pub fn spawn<S: NarrationSink>(
        ctx: Arc<SessionContext>,
        narrator: Arc<Narrator<S>>,
        interval: Duration,
    ) -> Self {
        Self {
            handle: spawn_heartbeat_task(ctx, narrator, interval),
        }
    }

    /// Cancel the heartbeat and wait until it can no longer speak.
    pub async fn stop(mut self) {
        self.handle.abort();
        // Cancellation is the expected result.
        let _ = (&mut self.handle).await;
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn a heartbeat for the relay that currently holds the session.
///
/// It waits for the relay to start streaming, then speaks the next filler
/// phrase every `interval` until the session leaves Streaming.
pub fn spawn_heartbeat_task<S: NarrationSink>(
    ctx: Arc<SessionContext>,
    narrator: Arc<Narrator<S>>,
    interval: Duration,
) -> JoinHandle<()> {
    let mut phase_rx = ctx.subscribe();
    tokio::spawn(async move {
        let streaming = phase_rx
            .wait_for(|phase| *phase != RelayPhase::Submitted)
            .await
            .is_ok_and(|phase| phase.is_streaming());
        if !streaming {
            debug!(session_id = ctx.session_id(), "Relay never streamed, no heartbeat");
            return;
        }

        let mut timer = tokio::time::interval(interval);
        timer.tick().await; // Skip first immediate tick
        let mut tick = 0usize;

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    if !narrator.progress(&ctx, heartbeat_filler(tick)).await {
                        break;
                    }
                    tick += 1;
                }
                changed = phase_rx.changed() => {
                    if changed.is_err() || !phase_rx.borrow_and_update().is_streaming() {
                        break;
                    }
                }
            }
        }
        debug!(session_id = ctx.session_id(), ticks = tick, "Heartbeat stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::ChannelSink;

    fn drain(rx: &mut tokio::sync::mpsc::Receiver<String>) -> Vec<String> {
        let mut spoken = Vec::new();
        while let Ok(text) = rx.try_recv() {
            spoken.push(text);
        }
        spoken
    }

    #[tokio::test(start_paused = true)]
    async fn speaks_fillers_until_terminal() {
        let (sink, mut rx) = ChannelSink::channel(16);
        let narrator = Arc::new(Narrator::new(sink));
        let ctx = Arc::new(SessionContext::new("s1"));
        assert!(ctx.try_begin());
        assert!(ctx.enter_streaming());

        let handle = spawn_heartbeat_task(ctx.clone(), narrator.clone(), Duration::from_secs(8));
        tokio::time::sleep(Duration::from_secs(17)).await;
        assert!(narrator.terminal(&ctx, RelayPhase::Success, "answer").await);
        handle.await.unwrap();

        assert_eq!(
            drain(&mut rx),
            vec![heartbeat_filler(0), heartbeat_filler(1), "answer"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_heartbeat_is_silent_while_still_streaming() {
        let (sink, mut rx) = ChannelSink::channel(16);
        let narrator = Arc::new(Narrator::new(sink));
        let ctx = Arc::new(SessionContext::new("s1"));
        assert!(ctx.try_begin());
        assert!(ctx.enter_streaming());

        let heartbeat = Heartbeat::spawn(ctx.clone(), narrator.clone(), Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        heartbeat.stop().await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(ctx.phase().is_streaming());
        assert_eq!(drain(&mut rx), vec![heartbeat_filler(0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_heartbeat_is_cancelled() {
        let (sink, mut rx) = ChannelSink::channel(16);
        let narrator = Arc::new(Narrator::new(sink));
        let ctx = Arc::new(SessionContext::new("s1"));
        assert!(ctx.try_begin());
        assert!(ctx.enter_streaming());

        drop(Heartbeat::spawn(ctx.clone(), narrator.clone(), Duration::from_secs(1)));
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(ctx.phase().is_streaming());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_streaming_before_first_filler() {
        let (sink, mut rx) = ChannelSink::channel(16);
        let narrator = Arc::new(Narrator::new(sink));
        let ctx = Arc::new(SessionContext::new("s1"));
        assert!(ctx.try_begin());

        let heartbeat = Heartbeat::spawn(ctx.clone(), narrator.clone(), Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());

        assert!(ctx.enter_streaming());
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(drain(&mut rx), vec![heartbeat_filler(0)]);
        heartbeat.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn relay_that_fails_before_streaming_gets_no_heartbeat() {
        let (sink, mut rx) = ChannelSink::channel(4);
        let narrator = Arc::new(Narrator::new(sink));
        let ctx = Arc::new(SessionContext::new("s1"));
        assert!(ctx.try_begin());

        let handle = spawn_heartbeat_task(ctx.clone(), narrator.clone(), Duration::from_secs(1));
        assert!(narrator.terminal(&ctx, RelayPhase::TransportError, "trouble").await);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(drain(&mut rx), vec!["trouble"]);
    }

    #[tokio::test(start_paused = true)]
    async fn exits_when_phase_leaves_streaming() {
        let (sink, _rx) = ChannelSink::channel(4);
        let narrator = Arc::new(Narrator::new(sink));
        let ctx = Arc::new(SessionContext::new("s1"));
        assert!(ctx.try_begin());
        assert!(ctx.enter_streaming());

        let handle = spawn_heartbeat_task(ctx.clone(), narrator.clone(), Duration::from_secs(60));
        assert!(narrator.terminal(&ctx, RelayPhase::Timeout, "late").await);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
