//! Conversion logic from domain entities to DTOs.

use hiroba_shared::time::timestamp_to_rfc3339;

use crate::domain::{ChatMessage, ConnectionCount, InstanceId, Room};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<ConnectionCount> for dto::CountUpdateMessage {
    fn from(count: ConnectionCount) -> Self {
        Self {
            r#type: dto::MessageType::CountUpdate,
            count: count.value(),
        }
    }
}

impl From<ChatMessage> for dto::NewMessageMessage {
    fn from(model: ChatMessage) -> Self {
        Self {
            r#type: dto::MessageType::NewMessage,
            id: model.id.to_string(),
            text: model.text.into_string(),
            created_at: timestamp_to_rfc3339(model.created_at.value()),
            origin_instance: model.origin_instance.as_str().to_string(),
        }
    }
}

impl http::ConnectionsDto {
    pub fn from_room(room: &Room, instance: &InstanceId) -> Self {
        Self {
            room: room.id.as_str().to_string(),
            instance: instance.as_str().to_string(),
            local_connections: room.connections.len(),
            counted_connections: room.connections.iter().filter(|c| c.counted).count(),
        }
    }
}
