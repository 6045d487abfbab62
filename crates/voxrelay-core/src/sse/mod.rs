//! Server-sent event decoder for chat-completion streams.
//!
//! Splits an incremental byte stream into `data:` events and decodes each
//! payload into a canonical [`StreamEvent`], implementing a tolerant reader
//! pattern: unknown fields ignored, malformed payloads skipped.

mod decoder;
mod parser;
mod types;

pub use decoder::{DONE_SENTINEL, EventDecoder};
pub use parser::{parse_completion, parse_payload, parse_value};
pub use types::*;
