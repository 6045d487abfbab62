//! `voxrelay` Core Library
//!
//! Shared functionality for the deep-reasoning voice relay:
//! - Server-sent event decoding for chat-completion streams
//! - Progress extraction (tool activity, free-text progress cues)
//! - Fixed narration phrases
//! - Configuration resolution
//! - Common error types

pub mod config;
pub mod error;
pub mod phrases;
pub mod progress;
pub mod sse;
pub mod tracing_init;

pub use config::RelayConfig;
pub use error::{Error, Result};
pub use progress::{Announcement, AnnouncementSource, ProgressExtractor};
