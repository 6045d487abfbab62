//! Gateway wire types and errors.

use serde::Serialize;
use thiserror::Error;

/// Gateway client errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Upstream request timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e)
        }
    }
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for `POST /v1/chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let messages = [ChatMessage::user("why is the sky blue")];
        let body = ChatRequest {
            model: "clawdbot:main",
            messages: &messages,
            stream: true,
            user: Some("agent:voice"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "clawdbot:main",
                "messages": [{"role": "user", "content": "why is the sky blue"}],
                "stream": true,
                "user": "agent:voice",
            })
        );
    }

    #[test]
    fn user_field_omitted_when_absent() {
        let body = ChatRequest {
            model: "m",
            messages: &[],
            stream: false,
            user: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("user").is_none());
    }
}
