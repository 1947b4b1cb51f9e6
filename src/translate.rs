//! Mapping between Anakin replies and OpenAI Chat Completions shapes.
//!
//! All functions here are pure; the streaming lifecycle around them lives in
//! `crate::session`.

use crate::models::anakin::AnakinReply;
use crate::models::chat::{
    ChatChoice, ChatCompletionChunk, ChatCompletionResponse, ChatDelta, ChatMessage,
    ChatResponseMessage, ChatStreamChoice, ChatUsage,
};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Generate a `chatcmpl-` response/session identifier.
pub fn completion_id() -> String {
    format!("chatcmpl-{}", Uuid::new_v4())
}

/// Current unix timestamp for `created` fields.
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Flatten an ordered conversation into the single prompt string the Anakin
/// API accepts: one `{role}: {content}` line per message, trailing
/// whitespace trimmed.
pub fn flatten_messages(messages: &[ChatMessage]) -> String {
    let mut out = String::new();
    for msg in messages {
        out.push_str(msg.role.as_str());
        out.push_str(": ");
        out.push_str(&msg.content);
        out.push('\n');
    }
    out.trim_end().to_string()
}

/// Translate one upstream event payload into a serialized
/// `chat.completion.chunk`.
///
/// Malformed payloads yield `None`: they are swallowed, not errors, and
/// translation continues with the next event. The chunk carries the
/// session's stable id, so every chunk of a stream shares one identifier.
pub fn chunk_from_payload(payload: &str, id: &str, model: &str) -> Option<String> {
    let reply: AnakinReply = serde_json::from_str(payload).ok()?;
    let chunk = ChatCompletionChunk {
        id: id.to_string(),
        object: "chat.completion.chunk".to_string(),
        created: unix_now(),
        model: model.to_string(),
        choices: vec![ChatStreamChoice {
            index: 0,
            delta: ChatDelta {
                content: Some(reply.content),
            },
            finish_reason: None,
        }],
    };
    serde_json::to_string(&chunk).ok()
}

/// Wrap a non-streaming Anakin reply as a completed chat completion:
/// generated id, zeroed usage (the backend reports no token counts),
/// finish reason `"stop"`.
pub fn completion_response(content: String, model: &str) -> ChatCompletionResponse {
    ChatCompletionResponse {
        id: completion_id(),
        object: "chat.completion".to_string(),
        created: unix_now(),
        model: model.to_string(),
        usage: ChatUsage::default(),
        choices: vec![ChatChoice {
            index: 0,
            message: ChatResponseMessage {
                role: "assistant".to_string(),
                content,
            },
            finish_reason: Some("stop".to_string()),
        }],
    }
}
