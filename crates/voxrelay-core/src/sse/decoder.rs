//! Incremental event-stream decoder.
//!
//! Bytes arrive in arbitrary chunks; events are delimited by a blank line and
//! only decoded once complete, so chunk boundaries (including ones that split
//! a UTF-8 sequence) never corrupt a payload.

use tracing::{debug, warn};

use super::parser::parse_payload;
use super::types::StreamEvent;

/// Payload value that closes the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Stateful decoder turning raw stream bytes into [`StreamEvent`]s.
#[derive(Debug, Default)]
pub struct EventDecoder {
    buffer: Vec<u8>,
    /// Start of the line being scanned.
    line_start: usize,
    /// Bytes of `buffer` already searched for a boundary.
    scanned: usize,
    done: bool,
    skipped: usize,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every event it completes, in order.
    ///
    /// Once the sentinel has been seen, further input is ignored.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some((event_end, next_start)) = self.next_boundary() {
            let block = String::from_utf8_lossy(&self.buffer[..event_end]).into_owned();
            self.buffer.drain(..next_start);
            if let Some(event) = self.decode_block(&block) {
                events.push(event);
            }
            if self.done {
                self.reset_buffer();
                break;
            }
        }
        events
    }

    /// Flush a trailing event left unterminated when the source closed.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        if self.done || self.buffer.is_empty() {
            self.reset_buffer();
            return None;
        }
        let block = String::from_utf8_lossy(&self.buffer).into_owned();
        self.reset_buffer();
        self.decode_block(&block)
    }

    /// Whether the sentinel payload has been seen.
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Number of events dropped because their payload failed to decode.
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// Locate the first blank line in the buffer, resuming where the last
    /// search stopped.
    ///
    /// Returns `(event_end, next_start)`: the event occupies
    /// `buffer[..event_end]` and the next one begins at `next_start`. Accepts
    /// `\n` and `\r\n` endings. On a hit the cursors restart at zero, since
    /// the caller drains everything before `next_start`.
    fn next_boundary(&mut self) -> Option<(usize, usize)> {
        let from = self.scanned;
        for (offset, &byte) in self.buffer[from..].iter().enumerate() {
            if byte != b'\n' {
                continue;
            }
            let i = from + offset;
            let line = &self.buffer[self.line_start..i];
            if line.is_empty() || line == b"\r" {
                let bounds = (self.line_start, i + 1);
                self.line_start = 0;
                self.scanned = 0;
                return Some(bounds);
            }
            self.line_start = i + 1;
        }
        self.scanned = self.buffer.len();
        None
    }

    fn reset_buffer(&mut self) {
        self.buffer.clear();
        self.line_start = 0;
        self.scanned = 0;
    }

    fn decode_block(&mut self, block: &str) -> Option<StreamEvent> {
        let data_lines: Vec<&str> = block
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
            .collect();
        if data_lines.is_empty() {
            return None;
        }

        let data = data_lines.join("\n");
        if data.trim() == DONE_SENTINEL {
            debug!("Event stream sentinel received");
            self.done = true;
            return None;
        }

        match parse_payload(&data) {
            Ok(event) => Some(event),
            Err(e) => {
                self.skipped += 1;
                warn!(error = %e, skipped = self.skipped, "Skipping malformed stream event");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_of(event: &StreamEvent) -> &str {
        event.as_delta().and_then(|d| d.text()).unwrap_or("")
    }

    fn chunk(text: &str) -> String {
        format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":{}}}}}]}}\n\n",
            serde_json::Value::String(text.to_string())
        )
    }

    #[test]
    fn decodes_events_split_across_chunks() {
        let mut decoder = EventDecoder::new();
        let stream = format!("{}{}", chunk("Hel"), chunk("lo"));
        let (a, b) = stream.as_bytes().split_at(17);

        let mut events = decoder.feed(a);
        assert!(events.is_empty());
        events.extend(decoder.feed(b));

        let texts: Vec<_> = events.iter().map(content_of).collect();
        assert_eq!(texts, vec!["Hel", "lo"]);
    }

    #[test]
    fn byte_at_a_time_with_multibyte_text() {
        let mut decoder = EventDecoder::new();
        let stream = chunk("Caf\u{e9} \u{2026}");
        let mut events = Vec::new();
        for byte in stream.as_bytes() {
            events.extend(decoder.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(events.len(), 1);
        assert_eq!(content_of(&events[0]), "Caf\u{e9} \u{2026}");
    }

    #[test]
    fn crlf_separators_accepted() {
        let mut decoder = EventDecoder::new();
        let events = decoder.feed(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\r\n\r\ndata: [DONE]\r\n\r\n",
        );
        assert_eq!(events.len(), 1);
        assert!(decoder.is_done());
    }

    #[test]
    fn sentinel_ends_stream_and_ignores_rest() {
        let mut decoder = EventDecoder::new();
        let stream = format!("{}data: [DONE]\n\n{}", chunk("a"), chunk("late"));
        let events = decoder.feed(stream.as_bytes());
        assert_eq!(events.len(), 1);
        assert!(decoder.is_done());
        assert!(decoder.feed(chunk("later").as_bytes()).is_empty());
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn malformed_payloads_skipped_valid_kept_in_order() {
        let mut decoder = EventDecoder::new();
        let stream = format!(
            "{}data: {{broken\n\n{}data: 42\n\n{}",
            chunk("one"),
            chunk("two"),
            chunk("three")
        );
        let events = decoder.feed(stream.as_bytes());
        let texts: Vec<_> = events.iter().map(content_of).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(decoder.skipped(), 2);
    }

    #[test]
    fn comments_and_other_fields_ignored() {
        let mut decoder = EventDecoder::new();
        let stream = format!(": keep-alive\n\nevent: ping\nid: 7\n\n{}", chunk("x"));
        let events = decoder.feed(stream.as_bytes());
        assert_eq!(events.len(), 1);
        assert_eq!(content_of(&events[0]), "x");
    }

    #[test]
    fn multiple_data_lines_joined() {
        let mut decoder = EventDecoder::new();
        let events = decoder
            .feed(b"data: {\"choices\":[{\"delta\":\ndata: {\"content\":\"joined\"}}]}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(content_of(&events[0]), "joined");
    }

    #[test]
    fn large_event_in_small_chunks_is_scanned_once() {
        let mut decoder = EventDecoder::new();
        let text = "x".repeat(4096);
        let stream = chunk(&text);
        let (body, terminator) = stream.as_bytes().split_at(stream.len() - 2);

        for piece in body.chunks(7) {
            assert!(decoder.feed(piece).is_empty());
            assert_eq!(decoder.scanned, decoder.buffer.len());
            assert_eq!(decoder.line_start, 0);
        }

        // The line's own newline moves the line cursor but is no boundary.
        assert!(decoder.feed(&terminator[..1]).is_empty());
        assert_eq!(decoder.line_start, decoder.buffer.len());

        let events = decoder.feed(&terminator[1..]);
        assert_eq!(events.len(), 1);
        assert_eq!(content_of(&events[0]), text);
        assert_eq!((decoder.scanned, decoder.line_start), (0, 0));
        assert!(decoder.buffer.is_empty());
    }

    #[test]
    fn cursors_restart_for_the_event_after_a_boundary() {
        let mut decoder = EventDecoder::new();
        let first = chunk("one");
        let second = chunk("two");
        let stream = format!("{first}{second}");
        let cut = first.len() + 5;

        let events = decoder.feed(&stream.as_bytes()[..cut]);
        assert_eq!(events.len(), 1);
        assert_eq!(decoder.scanned, 5);

        let events = decoder.feed(&stream.as_bytes()[cut..]);
        assert_eq!(events.iter().map(content_of).collect::<Vec<_>>(), vec!["two"]);
    }

    #[test]
    fn finish_flushes_unterminated_event() {
        let mut decoder = EventDecoder::new();
        let stream = chunk("tail");
        let trimmed = stream.trim_end();
        assert!(decoder.feed(trimmed.as_bytes()).is_empty());
        let event = decoder.finish().unwrap();
        assert_eq!(content_of(&event), "tail");
    }
}
