//! Chat-completion client for the reasoning gateway and the fast summarizer.
//!
//! Uses reqwest; streamed responses are decoded incrementally with the core
//! [`EventDecoder`].

use std::pin::Pin;
use std::time::Duration;

use async_stream::stream;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tokio_stream::Stream;
use tracing::debug;

use voxrelay_core::config::{GatewayConfig, SummarizerConfig};
use voxrelay_core::sse::{EventDecoder, StreamEvent, parse_completion};

use super::types::{ChatMessage, ChatRequest, GatewayError};

/// Longest error body excerpt kept in a status error.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Single-pass stream of decoded events from one response body.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, GatewayError>> + Send>>;

/// What the upstream sent back.
pub enum UpstreamReply {
    /// `text/event-stream` body, decoded lazily.
    Stream(EventStream),
    /// Single JSON completion object; holds the message content.
    Complete(String),
}

impl std::fmt::Debug for UpstreamReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("UpstreamReply::Stream(..)"),
            Self::Complete(text) => f.debug_tuple("UpstreamReply::Complete").field(text).finish(),
        }
    }
}

/// Client for an OpenAI-style chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    session_key: Option<String>,
}

impl GatewayClient {
    /// Create a client. An empty token sends no `Authorization` header.
    pub fn new(
        base_url: &str,
        token: &str,
        model: &str,
        session_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        if base_url.trim().is_empty() {
            return Err(GatewayError::Config("base_url is empty".into()));
        }
        if model.is_empty() {
            return Err(GatewayError::Config("model is empty".into()));
        }

        let mut headers = HeaderMap::new();
        if !token.is_empty() {
            let token_val = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| GatewayError::Config("Invalid token format".into()))?;
            headers.insert(AUTHORIZATION, token_val);
        }

        // reqwest is built with rustls-no-provider; `Err` means a provider is
        // already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(GatewayError::Transport)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            session_key,
        })
    }

    /// Client for the upstream reasoning gateway.
    pub fn from_gateway_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        Self::new(
            &config.base_url,
            &config.token,
            &config.model,
            config.session_key.clone(),
            config.timeout(),
        )
    }

    /// Client for the fast summarization model.
    pub fn from_summarizer_config(config: &SummarizerConfig) -> Result<Self, GatewayError> {
        Self::new(
            &config.base_url,
            &config.token,
            &config.model,
            None,
            config.timeout(),
        )
    }

    pub(crate) fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Ask `query` with streaming requested.
    ///
    /// Resolves once response headers arrive; the body is read through the
    /// returned reply.
    pub async fn stream_chat(&self, query: &str) -> Result<UpstreamReply, GatewayError> {
        let messages = [ChatMessage::user(query)];
        let resp = self.send(&messages, true).await?;

        if is_event_stream(resp.headers()) {
            debug!(url = %resp.url(), "Upstream replied with event stream");
            return Ok(UpstreamReply::Stream(decode_events(resp)));
        }

        debug!(url = %resp.url(), "Upstream replied with a single completion");
        let body = resp.text().await?;
        let text = parse_completion(&body)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        Ok(UpstreamReply::Complete(text))
    }

    /// Non-streaming completion of a single user prompt.
    pub async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        let messages = [ChatMessage::user(prompt)];
        let resp = self.send(&messages, false).await?;
        let body = resp.text().await?;
        parse_completion(&body).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }

    async fn send(
        &self,
        messages: &[ChatMessage],
        stream: bool,
    ) -> Result<reqwest::Response, GatewayError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            stream,
            user: self.session_key.as_deref(),
        };
        let resp = self
            .http
            .post(self.completions_url())
            .json(&body)
            .send()
            .await?;
        check_status(resp).await
    }
}

/// Turn non-success statuses into [`GatewayError::Status`], keeping a short
/// excerpt of the error body.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("Unknown").to_string()
    } else {
        body.chars().take(MAX_ERROR_BODY_CHARS).collect()
    };
    Err(GatewayError::Status {
        status: status.as_u16(),
        message,
    })
}

fn is_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/event-stream"))
}

/// Decode a streamed response body into events.
///
/// Ends after the `[DONE]` sentinel or when the body closes, whichever comes
/// first. Malformed payloads are skipped inside the decoder; body read
/// failures end the stream with an error.
pub fn decode_events(mut resp: reqwest::Response) -> EventStream {
    Box::pin(stream! {
        let mut decoder = EventDecoder::new();
        loop {
            match resp.chunk().await {
                Ok(Some(chunk)) => {
                    for event in decoder.feed(&chunk) {
                        yield Ok(event);
                    }
                    if decoder.is_done() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    yield Err(GatewayError::from(e));
                    return;
                }
            }
        }
        if let Some(event) = decoder.finish() {
            yield Ok(event);
        }
        if decoder.skipped() > 0 {
            debug!(skipped = decoder.skipped(), "Stream finished with skipped events");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> Result<GatewayClient, GatewayError> {
        GatewayClient::new(
            base_url,
            "tok",
            "clawdbot:main",
            None,
            Duration::from_secs(5),
        )
    }

    #[test]
    fn empty_base_url_returns_config_error() {
        let err = client("").unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn empty_model_returns_config_error() {
        let err = GatewayClient::new("http://gw", "", "", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn invalid_token_returns_config_error() {
        let err = GatewayClient::new("http://gw", "bad\ntoken", "m", None, Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn empty_token_is_allowed() {
        assert!(GatewayClient::new("http://gw", "", "m", None, Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn trailing_slash_stripped_from_base_url() {
        let client = client("http://127.0.0.1:18789/").unwrap();
        assert_eq!(
            client.completions_url(),
            "http://127.0.0.1:18789/v1/chat/completions"
        );
    }

    #[test]
    fn event_stream_content_type_detected() {
        let mut headers = HeaderMap::new();
        assert!(!is_event_stream(&headers));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/event-stream; charset=utf-8"),
        );
        assert!(is_event_stream(&headers));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!is_event_stream(&headers));
    }
}
