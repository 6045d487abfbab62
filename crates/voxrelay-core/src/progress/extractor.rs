//! Per-request progress extraction state machine.

use std::collections::HashSet;
use std::time::SystemTime;

use tracing::debug;

use super::heuristic::{KeywordHeuristic, ProgressHeuristic};
use super::tools::tool_phrase;
use crate::phrases;
use crate::sse::StreamEvent;

/// Where an announcement came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnouncementSource {
    Tool,
    Heuristic,
    Final,
    Fallback,
    Error,
}

impl AnnouncementSource {
    /// Terminal announcements are always narrated, whatever the relay phase.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Final | Self::Fallback | Self::Error)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Heuristic => "heuristic",
            Self::Final => "final",
            Self::Fallback => "fallback",
            Self::Error => "error",
        }
    }
}

/// Something to narrate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub text: String,
    pub source: AnnouncementSource,
    pub emitted_at: SystemTime,
}

impl Announcement {
    pub fn new(text: impl Into<String>, source: AnnouncementSource) -> Self {
        Self {
            text: text.into(),
            source,
            emitted_at: SystemTime::now(),
        }
    }
}

/// Progress bookkeeping for one relay request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    /// Tool names already announced. Grows monotonically within a request.
    pub spoken_tools: HashSet<String>,
    /// Last heuristic line narrated.
    pub last_progress_line: String,
    /// Concatenated content text in arrival order.
    pub accumulated_text: String,
}

/// Turns decoded stream events into deduplicated announcements.
///
/// Build a fresh extractor for every request; that is the state reset.
#[derive(Debug)]
pub struct ProgressExtractor<H = KeywordHeuristic> {
    state: ProgressState,
    heuristic: H,
    /// Start of the segment still being accumulated.
    segment_start: usize,
}

impl Default for ProgressExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressExtractor {
    pub fn new() -> Self {
        Self::with_heuristic(KeywordHeuristic::default())
    }
}

impl<H: ProgressHeuristic> ProgressExtractor<H> {
    pub fn with_heuristic(heuristic: H) -> Self {
        Self {
            state: ProgressState::default(),
            heuristic,
            segment_start: 0,
        }
    }

    pub const fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Inspect one event; returns the tool and heuristic announcements it
    /// triggers, tools first.
    pub fn observe(&mut self, event: &StreamEvent) -> Vec<Announcement> {
        let Some(delta) = event.as_delta() else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for name in delta.tool_names() {
            if self.state.spoken_tools.insert(name.to_string()) {
                debug!(tool = name, "New tool call in stream");
                out.push(Announcement::new(tool_phrase(name), AnnouncementSource::Tool));
            }
        }

        if let Some(text) = delta.text() {
            let from = self.state.accumulated_text.len();
            self.state.accumulated_text.push_str(text);
            for end in self.heuristic.segment_ends(&self.state.accumulated_text, from) {
                if let Some(line) = self.complete_segment(end) {
                    out.push(Announcement::new(line, AnnouncementSource::Heuristic));
                }
            }
        }
        out
    }

    /// Close the segment ending at `end`; returns it when it is a new
    /// progress line.
    fn complete_segment(&mut self, end: usize) -> Option<String> {
        let segment = self
            .state
            .accumulated_text
            .get(self.segment_start..end)?
            .trim();
        self.segment_start = end;
        if segment.is_empty()
            || segment == self.state.last_progress_line
            || !self.heuristic.is_progress(segment)
        {
            return None;
        }
        let line = segment.to_string();
        self.state.last_progress_line.clone_from(&line);
        Some(line)
    }

    /// Append answer text without running progress detection, used when the
    /// upstream replies with a single non-streamed message.
    pub fn absorb_text(&mut self, text: &str) {
        self.state.accumulated_text.push_str(text);
        self.segment_start = self.state.accumulated_text.len();
    }

    /// The answer that follows the last narrated progress line, or the whole
    /// accumulation. `None` when nothing but whitespace arrived.
    pub fn final_answer(&self) -> Option<String> {
        let accumulated = &self.state.accumulated_text;
        let whole = accumulated.trim();
        if whole.is_empty() {
            return None;
        }

        let marker = self.state.last_progress_line.as_str();
        if !marker.is_empty() {
            if let Some(pos) = accumulated.rfind(marker) {
                let rest = accumulated[pos + marker.len()..].trim();
                if !rest.is_empty() {
                    return Some(rest.to_string());
                }
            }
        }
        Some(whole.to_string())
    }

    /// Closing announcement: `final` with the answer, or `fallback` when the
    /// stream carried no text.
    pub fn finish(&self) -> Announcement {
        self.final_answer().map_or_else(
            || Announcement::new(phrases::NO_DATA, AnnouncementSource::Fallback),
            |answer| Announcement::new(answer, AnnouncementSource::Final),
        )
    }
}
