use serde::{Deserialize, Serialize};

/// Request body for `POST /v1/chatbots/{app_id}/messages`.
///
/// The Anakin API takes the whole conversation as one flattened string;
/// see [`crate::translate::flatten_messages`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnakinMessageRequest {
    pub content: String,
    pub stream: bool,
}

/// Reply content schema.
///
/// Doubles as the non-streaming response body and the per-event payload of
/// the streaming reply (`data: {"content":"..."}\n\n`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnakinReply {
    pub content: String,
}
