use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::core::mission::{display_value, truthy_field};

/// An event delivered by the voice SDK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "kebab-case")]
pub enum InboundEvent {
    CallStart,
    CallEnd,
    Message(Value),
    Error(Value),
    SpeechStart,
    SpeechEnd,
}

impl InboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CallStart => "call-start",
            Self::CallEnd => "call-end",
            Self::Message(_) => "message",
            Self::Error(_) => "error",
            Self::SpeechStart => "speech-start",
            Self::SpeechEnd => "speech-end",
        }
    }
}

pub fn message_type(message: &Value) -> Option<&str> {
    message.get("type").and_then(Value::as_str)
}

/// Transcript messages (partial or final) never carry tool output.
pub fn is_transcript(message: &Value) -> bool {
    message_type(message).is_some_and(|t| t.contains("transcript"))
}

/// A final or partial transcript spoken by the user.
pub fn is_user_transcript(message: &Value) -> bool {
    message_type(message) == Some("transcript")
        && message.get("role").and_then(Value::as_str) == Some("user")
}

/// Whether the message looks like a tool-call result worth keeping for inspection.
pub fn is_tool_result(message: &Value) -> bool {
    matches!(
        message_type(message),
        Some("tool-calls-result") | Some("tool-call-result")
    ) || truthy_field(message, "toolCallResult").is_some()
        || message
            .get("result")
            .and_then(|r| truthy_field(r, "data"))
            .is_some()
}

/// The SDK's own identifier for a message, or a synthesized one that is unique per call.
pub fn message_id(message: &Value, now: DateTime<Utc>) -> String {
    truthy_field(message, "messageId")
        .or_else(|| truthy_field(message, "id"))
        .map(display_value)
        .unwrap_or_else(|| {
            format!(
                "{}-{}-{}",
                message_type(message).unwrap_or("message"),
                now.timestamp_millis(),
                Uuid::new_v4().simple()
            )
        })
}
