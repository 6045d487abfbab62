//! Payload parser for chat-completion stream chunks.
//!
//! Tolerant reader: unknown fields ignored, missing optional fields defaulted.

use serde_json::Value;

use super::types::{DeltaFragment, EventPayload, StreamEvent, ToolCallDelta};
use crate::error::{Error, Result};

/// Parse a single `data:` payload into a stream event.
pub fn parse_payload(data: &str) -> Result<StreamEvent> {
    let raw: Value = serde_json::from_str(data)?;
    parse_value(&raw)
}

/// Parse a JSON value into a canonical stream event.
pub fn parse_value(raw: &Value) -> Result<StreamEvent> {
    if !raw.is_object() {
        return Err(Error::StreamDecode("Payload is not a JSON object".into()));
    }

    let Some(choice) = raw
        .get("choices")
        .and_then(|v| v.as_array())
        .and_then(|choices| choices.first())
    else {
        return Ok(StreamEvent::skip());
    };

    let is_terminal = choice.get("finish_reason").is_some_and(|v| !v.is_null());
    let payload = match choice.get("delta") {
        Some(delta) if delta.is_object() => EventPayload::Delta(parse_delta(delta)),
        _ => EventPayload::Skip,
    };

    Ok(StreamEvent {
        payload,
        is_terminal,
    })
}

fn parse_delta(delta: &Value) -> DeltaFragment {
    DeltaFragment {
        role: delta.get("role").and_then(|v| v.as_str()).map(String::from),
        content: delta
            .get("content")
            .and_then(|v| v.as_str())
            .map(String::from),
        tool_calls: parse_tool_calls(delta.get("tool_calls")),
    }
}

fn parse_tool_calls(val: Option<&Value>) -> Vec<ToolCallDelta> {
    let Some(arr) = val.and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    arr.iter()
        .enumerate()
        .filter_map(|(position, call)| {
            let function = call.get("function");
            let index = call
                .get("index")
                .and_then(|v| v.as_u64())
                .and_then(|i| u32::try_from(i).ok())
                .or_else(|| u32::try_from(position).ok())?;
            Some(ToolCallDelta {
                index,
                id: call.get("id").and_then(|v| v.as_str()).map(String::from),
                name: function
                    .and_then(|f| f.get("name"))
                    .and_then(|v| v.as_str())
                    .map(String::from),
                arguments: function
                    .and_then(|f| f.get("arguments"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
            })
        })
        .collect()
}

/// Extract the assistant text from a non-streaming completion response.
///
/// A present message with null content yields an empty string; a body with no
/// `choices[0].message` is an error.
pub fn parse_completion(body: &str) -> Result<String> {
    let raw: Value = serde_json::from_str(body)?;
    let message = raw
        .get("choices")
        .and_then(|v| v.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| Error::StreamDecode("Missing choices[0].message".into()))?;

    Ok(message
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_content_delta() {
        let json = r#"{"id":"c1","choices":[{"index":0,"delta":{"role":"assistant","content":"Hello"}}]}"#;
        let event = parse_payload(json).unwrap();
        let delta = event.as_delta().unwrap();
        assert_eq!(delta.role.as_deref(), Some("assistant"));
        assert_eq!(delta.text(), Some("Hello"));
        assert!(!event.is_terminal);
    }

    #[test]
    fn parse_tool_call_delta() {
        let json = r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","type":"function","function":{"name":"web_search","arguments":"{\"q"}}]}}]}"#;
        let event = parse_payload(json).unwrap();
        let delta = event.as_delta().unwrap();
        assert_eq!(delta.tool_calls.len(), 1);
        assert_eq!(delta.tool_calls[0].id.as_deref(), Some("call_1"));
        assert_eq!(delta.tool_calls[0].arguments, "{\"q");
        assert_eq!(delta.tool_names().collect::<Vec<_>>(), vec!["web_search"]);
    }

    #[test]
    fn tool_call_continuation_has_no_name() {
        let json = r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"uery\"}"}}]}}]}"#;
        let event = parse_payload(json).unwrap();
        let delta = event.as_delta().unwrap();
        assert_eq!(delta.tool_names().count(), 0);
        assert_eq!(delta.tool_calls[0].arguments, "uery\"}");
    }

    #[test]
    fn finish_reason_marks_terminal() {
        let json = r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        let event = parse_payload(json).unwrap();
        assert!(event.is_terminal);

        let json = r#"{"choices":[{"delta":{"content":"x"},"finish_reason":null}]}"#;
        assert!(!parse_payload(json).unwrap().is_terminal);
    }

    #[test]
    fn empty_choices_is_skip() {
        let json = r#"{"choices":[],"usage":{"prompt_tokens":3}}"#;
        assert_eq!(parse_payload(json).unwrap(), StreamEvent::skip());
    }

    #[test]
    fn tolerant_reader_ignores_unknown_fields() {
        let json = r#"{"choices":[{"delta":{"content":"a","reasoning":"zzz"},"logprobs":null}],"system_fingerprint":"fp"}"#;
        assert!(parse_payload(json).is_ok());
    }

    #[test]
    fn non_object_payload_is_error() {
        assert!(matches!(
            parse_payload("[1,2,3]"),
            Err(Error::StreamDecode(_))
        ));
        assert!(matches!(parse_payload("{not json"), Err(Error::Json(_))));
    }

    #[test]
    fn completion_content_extracted() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"It is sunny."}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "It is sunny.");
    }

    #[test]
    fn completion_null_content_is_empty() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "");
    }

    #[test]
    fn completion_without_message_is_error() {
        assert!(parse_completion(r#"{"error":{"message":"nope"}}"#).is_err());
    }
}
