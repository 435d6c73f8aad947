//! HTTP API のレスポンス DTO

use serde::{Deserialize, Serialize};

use idobata_shared::time::timestamp_to_rfc3339;

use crate::domain::{PersistedMessage, Room, User};

/// メッセージの HTTP 表現
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: String,
    pub sender: String,
    pub sender_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    pub is_private: bool,
    /// RFC 3339 形式の受付時刻
    pub timestamp: String,
}

impl From<PersistedMessage> for MessageDto {
    fn from(model: PersistedMessage) -> Self {
        Self {
            id: model.id.to_string(),
            sender: model.message.sender.into_string(),
            sender_id: model.message.sender_connection.to_string(),
            message: model.message.body.into_string(),
            room: model.message.room.map(|room| room.into_string()),
            is_private: model.message.is_private,
            timestamp: timestamp_to_rfc3339(model.message.timestamp.value()),
        }
    }
}

/// 利用者の HTTP 表現
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub username: String,
    pub online: bool,
}

impl From<User> for UserDto {
    fn from(model: User) -> Self {
        Self {
            username: model.name.into_string(),
            online: model.online,
        }
    }
}

/// ルームディレクトリエントリの HTTP 表現
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDto {
    pub name: String,
    /// RFC 3339 形式の作成時刻
    pub created_at: String,
}

impl From<Room> for RoomDto {
    fn from(model: Room) -> Self {
        Self {
            name: model.name.into_string(),
            created_at: timestamp_to_rfc3339(model.created_at.value()),
        }
    }
}
