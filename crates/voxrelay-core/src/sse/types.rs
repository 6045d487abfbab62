//! Event types for the chat-completion stream protocol.

/// One decoded unit of the upstream event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    pub payload: EventPayload,
    /// Set when the choice carries a non-null `finish_reason`.
    pub is_terminal: bool,
}

impl StreamEvent {
    /// An event with nothing to narrate (usage chunks, empty choices).
    pub const fn skip() -> Self {
        Self {
            payload: EventPayload::Skip,
            is_terminal: false,
        }
    }

    /// Event wrapping a delta fragment.
    pub fn delta(delta: DeltaFragment) -> Self {
        Self {
            payload: EventPayload::Delta(delta),
            is_terminal: false,
        }
    }

    /// Borrow the delta fragment, if this event carries one.
    pub const fn as_delta(&self) -> Option<&DeltaFragment> {
        match &self.payload {
            EventPayload::Delta(delta) => Some(delta),
            EventPayload::Skip => None,
        }
    }
}

/// Payload of a stream event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    Delta(DeltaFragment),
    Skip,
}

/// Incremental fragment of the streamed assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeltaFragment {
    pub role: Option<String>,
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallDelta>,
}

impl DeltaFragment {
    /// Text content of the delta, if present and non-empty.
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|t| !t.is_empty())
    }

    /// Names of the tools this delta starts, in arrival order.
    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.tool_calls
            .iter()
            .filter_map(|call| call.name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

/// Streamed tool call fragment.
///
/// The first fragment of a call carries the function name; continuation
/// fragments carry only argument text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolCallDelta {
    pub index: u32,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: String,
}
