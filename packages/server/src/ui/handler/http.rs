//! HTTP API endpoint handlers.
//!
//! The query surface reads the Persistence Port directly; it never touches
//! the coordinator's in-memory tables.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::infrastructure::dto::http::{MessageDto, RoomDto, UserDto};

use super::super::state::AppState;

/// 最近のメッセージの最大件数
const RECENT_MESSAGES_LIMIT: usize = 100;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get recent non-private messages
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MessageDto>>, StatusCode> {
    match state.store.recent(RECENT_MESSAGES_LIMIT).await {
        Ok(messages) => {
            // Domain Model から DTO への変換
            Ok(Json(messages.into_iter().map(MessageDto::from).collect()))
        }
        Err(e) => {
            tracing::error!("Failed to fetch messages: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get list of online users
pub async fn get_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserDto>>, StatusCode> {
    match state.store.online_users().await {
        Ok(users) => Ok(Json(users.into_iter().map(UserDto::from).collect())),
        Err(e) => {
            tracing::error!("Failed to fetch users: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get the room directory
pub async fn get_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomDto>>, StatusCode> {
    match state.store.list_rooms().await {
        Ok(rooms) => Ok(Json(rooms.into_iter().map(RoomDto::from).collect())),
        Err(e) => {
            tracing::error!("Failed to fetch rooms: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
