//! WebSocket message DTOs.
//!
//! Every frame is a JSON object tagged with a kebab-case `type`.

use serde::{Deserialize, Serialize};

/// Message type identifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    CountUpdate,
    NewMessage,
}

/// client → server: a chat message to relay
///
/// `message` is accepted as an alias of `text`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub r#type: MessageType,
    #[serde(alias = "message")]
    pub text: String,
}

impl SendMessageRequest {
    /// Extract the message text from an incoming text frame.
    ///
    /// A frame that is not a `new-message` JSON object is taken as the message text itself.
    pub fn text_from_frame(frame: &str) -> String {
        match serde_json::from_str::<SendMessageRequest>(frame) {
            Ok(request) if request.r#type == MessageType::NewMessage => request.text,
            _ => frame.to_string(),
        }
    }
}

/// server → client: total connection count across all instances
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountUpdateMessage {
    pub r#type: MessageType,
    pub count: u64,
}

/// server → client: a relayed chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewMessageMessage {
    pub r#type: MessageType,
    pub id: String,
    pub text: String,
    /// RFC 3339 (UTC)
    pub created_at: String,
    pub origin_instance: String,
}
