//! voxrelay Agent Library
//!
//! Relays hard questions from a live voice conversation to a slow upstream
//! reasoning gateway without blocking the conversation:
//! - Gateway client for streamed chat completions
//! - Narration sink abstraction for voice output
//! - Single-flight relay manager with guaranteed terminal narration
//! - Heartbeat fillers while a relay streams
//! - Voice-length condensation of long answers

pub mod gateway;
pub mod narration;
pub mod relay;
pub mod summarize;

pub use gateway::{GatewayClient, GatewayError};
pub use narration::{ChannelSink, LogSink, NarrationError, NarrationSink};
pub use relay::{RelayManager, RelayOutcome, RelayPhase, RelayRequest, SubmitOutcome};
pub use summarize::Summarizer;
