//! Progress extraction from decoded stream events.
//!
//! Detects tool invocations and free-text progress cues, deduplicates them,
//! and produces the closing answer (or fallback) when the stream ends.

mod extractor;
mod heuristic;
mod tools;

pub use extractor::{Announcement, AnnouncementSource, ProgressExtractor, ProgressState};
pub use heuristic::{
    KeywordHeuristic, MAX_PROGRESS_LINE_CHARS, PROGRESS_KEYWORDS, ProgressHeuristic,
    segment_boundaries,
};
pub use tools::{KnownTool, tool_phrase};
