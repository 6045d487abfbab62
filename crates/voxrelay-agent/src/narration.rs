//! Narration sink: the voice output capability the relay speaks through.
//!
//! The voice-session runtime (TTS, room transport) is external; it is reached
//! through a single `speak` operation that completes once the text has been
//! handed off.

use std::future::Future;

use tokio::sync::mpsc;
use tracing::info;

/// Errors from handing text to the voice output.
#[derive(Debug, thiserror::Error)]
pub enum NarrationError {
    #[error("Narration channel closed")]
    Closed,

    /// The voice runtime refused or dropped the text.
    #[error("Narration failed: {0}")]
    Failed(String),
}

/// Voice output capability.
pub trait NarrationSink: Send + Sync + 'static {
    /// Hand `text` off for voice output.
    fn speak(&self, text: &str) -> impl Future<Output = Result<(), NarrationError>> + Send;
}

/// Forwards narration text over an mpsc channel to whatever drives the voice
/// runtime.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<String>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    /// Create a sink and the receiver that drains it.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl NarrationSink for ChannelSink {
    async fn speak(&self, text: &str) -> Result<(), NarrationError> {
        self.tx
            .send(text.to_string())
            .await
            .map_err(|_| NarrationError::Closed)
    }
}

/// Writes narrations to the log. Useful when no voice runtime is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NarrationSink for LogSink {
    async fn speak(&self, text: &str) -> Result<(), NarrationError> {
        info!(text, "Narration");
        Ok(())
    }
}
