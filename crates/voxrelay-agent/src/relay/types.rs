//! Relay module types.

use std::time::SystemTime;

use uuid::Uuid;

use voxrelay_core::phrases;
use voxrelay_core::progress::{Announcement, AnnouncementSource};

use crate::gateway::GatewayError;

/// Lifecycle phase of the session's relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RelayPhase {
    #[default]
    Idle,
    Submitted,
    Streaming,
    Success,
    HttpError,
    Timeout,
    TransportError,
}

impl RelayPhase {
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Busy indicator: anything other than Idle.
    pub const fn is_busy(self) -> bool {
        !self.is_idle()
    }

    pub const fn is_streaming(self) -> bool {
        matches!(self, Self::Streaming)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Success | Self::HttpError | Self::Timeout | Self::TransportError
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitted => "submitted",
            Self::Streaming => "streaming",
            Self::Success => "success",
            Self::HttpError => "http_error",
            Self::Timeout => "timeout",
            Self::TransportError => "transport_error",
        }
    }
}

/// How the last relay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayOutcome {
    /// A final answer was narrated.
    Answered,
    /// The stream completed without content; the "no data" phrase was narrated.
    Empty,
    /// The upstream answered with a non-success status.
    UpstreamStatus(u16),
    TimedOut,
    /// Network, body read, or response decoding failure.
    Transport,
    /// The relay task itself failed unexpectedly.
    Fault,
}

impl RelayOutcome {
    /// Terminal phase this outcome passes through.
    pub const fn phase(self) -> RelayPhase {
        match self {
            Self::Answered | Self::Empty => RelayPhase::Success,
            Self::UpstreamStatus(_) => RelayPhase::HttpError,
            Self::TimedOut => RelayPhase::Timeout,
            Self::Transport | Self::Fault => RelayPhase::TransportError,
        }
    }

    /// Fixed phrase narrated for failure outcomes.
    pub const fn failure_phrase(self) -> Option<&'static str> {
        match self {
            Self::Answered | Self::Empty => None,
            Self::UpstreamStatus(_) => Some(phrases::HTTP_APOLOGY),
            Self::TimedOut => Some(phrases::TIMEOUT),
            Self::Transport | Self::Fault => Some(phrases::TROUBLE),
        }
    }

    /// The `error` announcement that closes a failed relay.
    pub fn failure_announcement(self) -> Option<Announcement> {
        self.failure_phrase()
            .map(|phrase| Announcement::new(phrase, AnnouncementSource::Error))
    }
}

impl From<&GatewayError> for RelayOutcome {
    fn from(e: &GatewayError) -> Self {
        match e {
            GatewayError::Status { status, .. } => Self::UpstreamStatus(*status),
            GatewayError::Timeout => Self::TimedOut,
            GatewayError::Transport(_)
            | GatewayError::InvalidResponse(_)
            | GatewayError::Config(_) => Self::Transport,
        }
    }
}

/// A question relayed upstream. Immutable for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
    pub id: Uuid,
    pub query: String,
    pub submitted_at: SystemTime,
}

impl RelayRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            submitted_at: SystemTime::now(),
        }
    }
}

/// Synchronous result of `submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The relay started in the background.
    Accepted {
        request_id: Uuid,
        acknowledgement: &'static str,
    },
    /// Another relay is in flight; nothing was started.
    Busy { message: &'static str },
}

impl SubmitOutcome {
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Text for the live conversation to say back.
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Accepted {
                acknowledgement, ..
            } => *acknowledgement,
            Self::Busy { message } => *message,
        }
    }
}
