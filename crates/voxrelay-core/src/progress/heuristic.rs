//! Free-text progress detection.
//!
//! The upstream has no structured progress events, so progress is inferred
//! from short phrases such as "Searching memory...". Accumulated text is cut
//! into segments and each completed segment is judged on its own. The
//! detector sits behind [`ProgressHeuristic`] so a structured protocol can
//! replace it.

/// Splits accumulated answer text into segments and judges each one.
pub trait ProgressHeuristic: Send {
    /// Byte offsets in `text` where a segment completes, strictly after
    /// `from`, in ascending order.
    fn segment_ends(&self, text: &str, from: usize) -> Vec<usize> {
        segment_boundaries(text, from)
    }

    /// Whether a completed segment (trimmed, non-blank) is a progress cue.
    fn is_progress(&self, segment: &str) -> bool;
}

/// Segments at or above this many characters are answer text, not progress.
pub const MAX_PROGRESS_LINE_CHARS: usize = 80;

/// Words that mark a short segment as progress.
pub const PROGRESS_KEYWORDS: [&str; 4] = ["found", "checking", "searching", "got"];

/// Length + ellipsis/keyword detector.
#[derive(Debug, Clone)]
pub struct KeywordHeuristic {
    max_chars: usize,
    keywords: &'static [&'static str],
}

impl Default for KeywordHeuristic {
    fn default() -> Self {
        Self {
            max_chars: MAX_PROGRESS_LINE_CHARS,
            keywords: &PROGRESS_KEYWORDS,
        }
    }
}

impl ProgressHeuristic for KeywordHeuristic {
    fn is_progress(&self, segment: &str) -> bool {
        if segment.chars().count() >= self.max_chars {
            return false;
        }
        if has_ellipsis(segment) {
            return true;
        }
        let lower = segment.to_lowercase();
        self.keywords.iter().any(|kw| lower.contains(kw))
    }
}

/// Segment ends after `from`: past every newline, past whitespace that
/// follows an ellipsis, and at the end of text that ends in an ellipsis.
///
/// Text after the last end is an unfinished segment.
pub fn segment_boundaries(text: &str, from: usize) -> Vec<usize> {
    let Some(tail) = text.get(from..) else {
        return Vec::new();
    };
    let mut ends = Vec::new();
    for (offset, ch) in tail.char_indices() {
        let at = from + offset;
        if ch == '\n' || (ch.is_whitespace() && ends_with_ellipsis(&text[..at])) {
            ends.push(at + ch.len_utf8());
        }
    }
    if !tail.is_empty() && ends_with_ellipsis(text) {
        ends.push(text.len());
    }
    ends
}

fn has_ellipsis(text: &str) -> bool {
    text.contains("...") || text.contains('\u{2026}')
}

fn ends_with_ellipsis(text: &str) -> bool {
    text.ends_with("...") || text.ends_with('\u{2026}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(text: &str) -> Vec<&str> {
        let mut start = 0;
        segment_boundaries(text, 0)
            .into_iter()
            .map(|end| {
                let seg = text[start..end].trim();
                start = end;
                seg
            })
            .collect()
    }

    #[test]
    fn ellipsis_segment_qualifies() {
        let h = KeywordHeuristic::default();
        assert!(h.is_progress("Searching memory..."));
        assert!(h.is_progress("Thinking \u{2026}"));
    }

    #[test]
    fn keyword_segment_qualifies_case_insensitively() {
        let h = KeywordHeuristic::default();
        assert!(h.is_progress("Got the logs"));
        assert!(h.is_progress("FOUND IT"));
    }

    #[test]
    fn plain_segment_does_not_qualify() {
        let h = KeywordHeuristic::default();
        assert!(!h.is_progress("Answer: it's sunny."));
    }

    #[test]
    fn long_segment_does_not_qualify() {
        let h = KeywordHeuristic::default();
        assert!(!h.is_progress(&format!("{}...", "a".repeat(80))));
        assert!(h.is_progress(&format!("{}...", "a".repeat(76))));
    }

    #[test]
    fn sentences_on_one_line_split_after_ellipses() {
        assert_eq!(
            segments("Searching memory... Found 2 results... Answer: it's sunny."),
            vec!["Searching memory...", "Found 2 results..."]
        );
    }

    #[test]
    fn newlines_end_segments() {
        assert_eq!(segments("intro\nFOUND IT\ntail"), vec!["intro", "FOUND IT"]);
        assert_eq!(segments("a\r\nb\r\n"), vec!["a", "b"]);
    }

    #[test]
    fn trailing_ellipsis_completes_a_segment() {
        assert_eq!(
            segments("It rained.\nChecking again..."),
            vec!["It rained.", "Checking again..."]
        );
        assert_eq!(segments("Thinking \u{2026}"), vec!["Thinking \u{2026}"]);
    }

    #[test]
    fn inner_ellipsis_without_whitespace_does_not_split() {
        assert!(segments("v1...v2 shipped").is_empty());
    }

    #[test]
    fn boundaries_start_after_cursor() {
        let text = "Searching... Found it\n";
        assert_eq!(segment_boundaries(text, 0), vec![13, 22]);
        assert_eq!(segment_boundaries(text, 13), vec![22]);
        assert!(segment_boundaries(text, 22).is_empty());
        assert!(segment_boundaries(text, 99).is_empty());
    }

    #[test]
    fn whitespace_after_ellipsis_at_cursor_is_a_boundary() {
        // "Searching..." ended the previous chunk; the next chunk opens with a space.
        let text = "Searching... Found";
        assert_eq!(segment_boundaries(text, 12), vec![13]);
    }
}
