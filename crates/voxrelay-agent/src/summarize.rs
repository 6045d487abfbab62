//! Voice-length condensation of long answers.
//!
//! Long upstream answers are passed through a fast completion model with a
//! summarization prompt. If that fails the answer is cut to its first two
//! sentences instead.

use tracing::{debug, warn};

use voxrelay_core::config::SummarizerConfig;
use voxrelay_core::phrases;

use crate::gateway::{GatewayClient, GatewayError};

/// Condenses answers that are too long to speak comfortably.
#[derive(Debug, Clone)]
pub struct Summarizer {
    client: GatewayClient,
    min_chars: usize,
    max_input_chars: usize,
}

impl Summarizer {
    pub fn new(client: GatewayClient, min_chars: usize, max_input_chars: usize) -> Self {
        Self {
            client,
            min_chars,
            max_input_chars,
        }
    }

    /// Build from config; `None` when condensation is disabled or has no
    /// token.
    pub fn from_config(config: &SummarizerConfig) -> Result<Option<Self>, GatewayError> {
        if !config.is_active() {
            return Ok(None);
        }
        let client = GatewayClient::from_summarizer_config(config)?;
        Ok(Some(Self::new(
            client,
            config.min_chars,
            config.max_input_chars,
        )))
    }

    /// Whether `answer` is long enough to condense.
    pub fn needs_condensing(&self, answer: &str) -> bool {
        answer.chars().count() > self.min_chars
    }

    /// Condensed form of `answer`, falling back to its first two sentences.
    pub async fn condense(&self, answer: &str) -> String {
        let excerpt: String = answer.chars().take(self.max_input_chars).collect();
        match self.client.complete(&phrases::summary_prompt(&excerpt)).await {
            Ok(summary) if !summary.trim().is_empty() => {
                debug!(
                    original_chars = answer.chars().count(),
                    summary_chars = summary.chars().count(),
                    "Answer condensed"
                );
                summary.trim().to_string()
            }
            Ok(_) => {
                warn!("Summarizer returned empty text, truncating instead");
                first_two_sentences(answer)
            }
            Err(e) => {
                warn!(error = %e, "Summarizer failed, truncating instead");
                first_two_sentences(answer)
            }
        }
    }
}

/// First two `". "`-separated sentences of `text`, closed with a period when
/// the cut removed the original one.
pub fn first_two_sentences(text: &str) -> String {
    let text = text.trim();
    let mut out = text.split(". ").take(2).collect::<Vec<_>>().join(". ");
    if out.len() < text.len() && !out.ends_with(['.', '!', '?']) {
        out.push('.');
    }
    out
}
