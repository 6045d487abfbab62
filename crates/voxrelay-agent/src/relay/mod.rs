//! Background relay of deep-reasoning questions with progress narration.
//!
//! A session owns one [`RelayManager`]. `submit` claims the session's single
//! relay slot, spawns the relay task plus a supervisor, and returns at once.
//! The supervisor returns the slot to Idle however the task ends.

mod heartbeat;
mod manager;
mod narrator;
mod session;
mod task;
mod types;

pub use manager::RelayManager;
pub use narrator::Narrator;
pub use session::SessionContext;
pub use types::{RelayOutcome, RelayPhase, RelayRequest, SubmitOutcome};
