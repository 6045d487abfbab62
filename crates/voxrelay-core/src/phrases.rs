//! Fixed narration phrases.
//!
//! Every spoken outcome of a relay comes from this module so that terminal
//! narrations are recognisable in logs and tests.

/// Returned to the live conversation when a relay is accepted.
pub const ACKNOWLEDGEMENT: &str =
    "I'm thinking about that now. What else can I help with while I work on it?";

/// Returned when a relay is already in flight.
pub const BUSY: &str = "I'm still working on your last question. Ask me again once I've answered it.";

/// Stream finished without any content.
pub const NO_DATA: &str = "I looked into that but didn't come back with anything.";

/// Upstream answered with a non-success status.
pub const HTTP_APOLOGY: &str = "Sorry, I couldn't get that info right now.";

/// Upstream exceeded the request timeout.
pub const TIMEOUT: &str = "That's taking too long, let's try again later.";

/// Any other transport or unexpected fault.
pub const TROUBLE: &str = "Had trouble with that deep thinking request.";

/// Filler rotation spoken by the heartbeat while a relay streams.
pub const HEARTBEAT_FILLERS: [&str; 4] = [
    "Still working on it...",
    "Still digging, hang on...",
    "Bear with me, almost there...",
    "Still on it...",
];

/// Filler phrase for the `tick`-th heartbeat (0-indexed).
pub fn heartbeat_filler(tick: usize) -> &'static str {
    HEARTBEAT_FILLERS[tick % HEARTBEAT_FILLERS.len()]
}

/// Phrase for a tool with no table entry.
pub fn tool_fallback(name: &str) -> String {
    format!("Working on {name}...")
}

/// Prompt asking the fast model to condense an answer for speech.
pub fn summary_prompt(answer: &str) -> String {
    format!(
        "Summarize this for a quick voice response (2-3 sentences max, casual and \
         conversational, no bullet points or lists):\n\n{answer}"
    )
}
