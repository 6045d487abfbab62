//! Upstream chat-completion gateway client.

mod client;
mod types;

pub use client::{EventStream, GatewayClient, UpstreamReply, decode_events};
pub use types::{ChatMessage, ChatRequest, GatewayError};
